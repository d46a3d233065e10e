//! Stack validation — turns free-text tech stack input into corrected, role-relevant names.

use serde::{Deserialize, Serialize};

use crate::extractor::json_scan::{decode_embedded, Shape};
use crate::extractor::prompts::{fill_template, STACK_VALIDATION_PROMPT};
use crate::extractor::{ask_oracle, Extraction};
use crate::llm_client::prompts::{JSON_REPLY_INSTRUCTION, SCREENER_PERSONA};
use crate::llm_client::{ChatMessage, Oracle};

const STACK_TEMPERATURE: f32 = 0.1;

const STACK_FALLBACK: &str =
    "Couldn't read the validated tech stacks. Please try entering your tech stacks again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackValidation {
    pub stacks: Vec<String>,
    #[serde(default)]
    pub message: String,
}

/// Validates `input_text` against the desired `position`.
///
/// Relevance filtering is left to the oracle. Locally, blank names are dropped
/// and repeats within the reply collapse case-insensitively (first spelling wins).
pub async fn validate_stacks(
    oracle: &dyn Oracle,
    position: &str,
    input_text: &str,
) -> Extraction<StackValidation> {
    let prompt = fill_template(
        STACK_VALIDATION_PROMPT,
        &[("position", position), ("input_text", input_text)],
    );
    let messages = [
        ChatMessage::system(format!("{SCREENER_PERSONA} {JSON_REPLY_INSTRUCTION}")),
        ChatMessage::user(prompt),
    ];

    let reply = match ask_oracle(oracle, &messages, STACK_TEMPERATURE, "stack validation").await
    {
        Ok(reply) => reply,
        Err(reason) => return Extraction::Empty(reason),
    };

    let parsed = match decode_embedded::<StackValidation>(&reply, Shape::Object) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stack validation reply unusable: {e}");
            return Extraction::Empty(STACK_FALLBACK.to_string());
        }
    };

    let stacks = dedup_case_insensitive(
        parsed
            .stacks
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from),
    );

    if stacks.is_empty() {
        let reason = if parsed.message.trim().is_empty() {
            "No valid tech stacks found for this role. Please try again.".to_string()
        } else {
            parsed.message
        };
        return Extraction::Empty(reason);
    }

    Extraction::Ok(StackValidation {
        stacks,
        message: parsed.message,
    })
}

/// Two stack names denote the same stack when they match ignoring case.
pub fn same_stack(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn dedup_case_insensitive(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|s| same_stack(s, &name)) {
            out.push(name);
        }
    }
    out
}
