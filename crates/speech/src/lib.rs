//! # Hearth Speech
//!
//! Voice playback for assistant responses: sentence splitting plus a
//! sequencer that plays units strictly in order and lets a newer request or
//! an explicit stop cancel whatever is still speaking.

pub mod sentence;
pub mod sequencer;

pub use sentence::split_sentences;
pub use sequencer::{NoopEngine, PlaybackSequencer, SpeechEngine};
