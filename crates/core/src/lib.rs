//! # Hearth Core
//!
//! Domain types, traits, and error definitions for the Hearth companion
//! chat server. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod store;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, SpeechError, StorageError};
pub use message::{ChatMessage, Role, Severity, StreamingMessage};
pub use store::{MemoryRecord, MemoryStore, MessageStore};
pub use turn::{TurnGuard, TurnState};
