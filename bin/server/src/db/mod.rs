//! Database repositories for the penwise server.
//!
//! This module provides data access for:
//! - Conversation threads, indexed by owning user
//! - Thread messages, replayed as agent history

pub mod thread;

pub use thread::PgThreadStore;
