//! Core domain types and utilities for penwise.
//!
//! This crate provides the identifier types and the error-handling alias
//! shared by the assistant libraries and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{MessageId, ParseIdError, ThreadId, UserId};
