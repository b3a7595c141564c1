//! Conversation payload assembly
//!
//! Prepends the persona and acknowledgement turns to a window of recent
//! history and keeps each session's stored history bounded.

mod assembler;

pub use assembler::ConversationAssembler;
