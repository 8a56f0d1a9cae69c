//! # Hearth Providers
//!
//! The model backend client and the streamed-response assembly pipeline:
//! [`OllamaProvider`] issues the request and republishes raw body chunks,
//! [`StreamAssembler`] turns them into one finalized assistant message.

pub mod assembler;
pub mod ollama;

pub use assembler::StreamAssembler;
pub use ollama::{ChatTurnRequest, OllamaProvider, PromptMessage};
