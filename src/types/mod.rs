//! Core types for Toolchat.

pub mod message;
pub mod stream;

pub use message::*;
pub use stream::*;
