//! Structured Extractor — asks the oracle for schema-shaped output and best-effort
//! parses it out of the free-text reply.
//!
//! Every mode returns an `Extraction`: either a decoded value or an explicit
//! empty result carrying a user-facing reason. Oracle and decode failures are
//! converted here and never reach the caller as errors.

pub mod evaluation;
pub mod info;
pub mod json_scan;
pub mod prompts;
pub mod questions;
pub mod stacks;

use tracing::warn;

use crate::llm_client::{ChatMessage, LlmError, Oracle};

/// Outcome of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Ok(T),
    /// Nothing usable came back. The reason is safe to show to the user.
    Empty(String),
}

impl<T> Extraction<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Extraction::Empty(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Extraction::Ok(value) => Some(value),
            Extraction::Empty(_) => None,
        }
    }
}

/// Calls the oracle once, logging and flattening any failure into the empty-result reason.
async fn ask_oracle(
    oracle: &dyn Oracle,
    messages: &[ChatMessage],
    temperature: f32,
    mode: &str,
) -> Result<String, String> {
    oracle
        .complete(messages, temperature)
        .await
        .map_err(|e: LlmError| {
            warn!("Oracle call failed during {mode}: {e}");
            format!("The assistant is unavailable right now ({mode} failed). Please try again.")
        })
}
