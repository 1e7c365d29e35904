//! Prompt-detection primitives for the interactive session.
//!
//! The device speaks no structured protocol; the only framing available
//! is the command prompt at the end of the output. This module holds the
//! accumulation buffer and the fixed ZTE prompt pattern set used to
//! detect it.

mod buffer;
mod prompts;

pub use buffer::PatternBuffer;
pub use prompts::PromptSet;
