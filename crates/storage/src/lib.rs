//! # Hearth Storage
//!
//! Store implementations behind the [`hearth_core::MessageStore`] and
//! [`hearth_core::MemoryStore`] traits. The in-memory backends here cover a
//! single local session; anything durable slots in behind the same traits.

pub mod memory_store;
pub mod message_store;

pub use memory_store::{InMemoryMemoryStore, base_memories};
pub use message_store::InMemoryMessageStore;
