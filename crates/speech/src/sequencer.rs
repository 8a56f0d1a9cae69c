//! Strictly sequential speech playback with cancellation.
//!
//! A new playback request supersedes whatever is still speaking: the previous
//! run's cancel flag is raised and the engine halted before the new units
//! start. Units play one at a time, and the cancel flag is checked before
//! each unit so a stop lands between sentences, not mid-run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hearth_core::error::SpeechError;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::sentence::split_sentences;

/// A backend able to voice one unit of text at a time.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak one unit to completion.
    async fn play(&self, text: &str) -> Result<(), SpeechError>;

    /// Interrupt whatever is currently being voiced.
    async fn halt(&self) -> Result<(), SpeechError>;
}

/// Engine used when no audio backend is present. Playback becomes a no-op
/// rather than an error, so a headless install behaves like a muted one.
pub struct NoopEngine;

#[async_trait]
impl SpeechEngine for NoopEngine {
    async fn play(&self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }

    async fn halt(&self) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Sequences a response through the engine sentence by sentence.
pub struct PlaybackSequencer {
    engine: Arc<dyn SpeechEngine>,
    max_sentences: usize,
    current: Mutex<Arc<AtomicBool>>,
}

impl PlaybackSequencer {
    pub fn new(engine: Arc<dyn SpeechEngine>, max_sentences: usize) -> Self {
        Self {
            engine,
            max_sentences,
            current: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Cancel the in-flight run, if any, and install a fresh cancel flag for
    /// the next one.
    async fn supersede(&self) -> Arc<AtomicBool> {
        let mut current = self.current.lock().await;
        current.store(true, Ordering::SeqCst);
        if let Err(e) = self.engine.halt().await {
            warn!(error = %e, "Engine halt failed; continuing");
        }
        let fresh = Arc::new(AtomicBool::new(false));
        *current = fresh.clone();
        fresh
    }

    /// Play a response. Returns the number of units actually voiced.
    ///
    /// Engine failures are logged and end the run; they never propagate to
    /// the caller, since losing audio must not lose the chat turn.
    pub async fn speak(&self, text: &str) -> usize {
        let cancel = self.supersede().await;
        let units = split_sentences(text);
        let capped = units.len().min(self.max_sentences);

        let mut played = 0;
        for unit in &units[..capped] {
            if cancel.load(Ordering::SeqCst) {
                debug!(played, "Playback cancelled");
                break;
            }
            if let Err(e) = self.engine.play(unit).await {
                warn!(error = %e, "Speech unit failed; abandoning playback");
                break;
            }
            played += 1;
        }
        played
    }

    /// Stop the current run without starting a new one.
    pub async fn stop(&self) {
        let current = self.current.lock().await;
        current.store(true, Ordering::SeqCst);
        if let Err(e) = self.engine.halt().await {
            warn!(error = %e, "Engine halt failed");
        }
    }
}
