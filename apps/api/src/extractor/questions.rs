//! Question generation — three interview questions with hints per stack.

use serde::{Deserialize, Serialize};

use crate::extractor::json_scan::{decode_embedded, Shape};
use crate::extractor::prompts::{fill_template, QUESTION_GENERATION_PROMPT};
use crate::extractor::{ask_oracle, Extraction};
use crate::llm_client::prompts::{JSON_REPLY_INSTRUCTION, SCREENER_PERSONA};
use crate::llm_client::{ChatMessage, Oracle};

/// Number of questions asked per stack.
pub const QUESTIONS_PER_STACK: usize = 3;

const QUESTION_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub hint: String,
}

/// Asks for `QUESTIONS_PER_STACK` questions about `stack_name`.
///
/// Extra questions are truncated. A short list is returned as-is; the caller
/// decides whether it is usable.
pub async fn generate_questions(oracle: &dyn Oracle, stack_name: &str) -> Extraction<Vec<Question>> {
    let prompt = fill_template(QUESTION_GENERATION_PROMPT, &[("stack_name", stack_name)]);
    let messages = [
        ChatMessage::system(format!("{SCREENER_PERSONA} {JSON_REPLY_INSTRUCTION}")),
        ChatMessage::user(prompt),
    ];

    let reply =
        match ask_oracle(oracle, &messages, QUESTION_TEMPERATURE, "question generation").await {
            Ok(reply) => reply,
            Err(reason) => return Extraction::Empty(reason),
        };

    let mut questions = match decode_embedded::<Vec<Question>>(&reply, Shape::Array) {
        Ok(questions) => questions,
        Err(e) => {
            tracing::warn!("Question generation reply for '{stack_name}' unusable: {e}");
            return Extraction::Empty(format!("Could not generate questions for '{stack_name}'."));
        }
    };

    questions.retain(|q| !q.question.trim().is_empty());
    questions.truncate(QUESTIONS_PER_STACK);

    if questions.is_empty() {
        return Extraction::Empty(format!("Could not generate questions for '{stack_name}'."));
    }
    Extraction::Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedOracle;

    #[tokio::test]
    async fn test_extra_questions_truncated_to_three() {
        let oracle = ScriptedOracle::new().reply(
            r#"Here are your questions:
            [{"question": "Q1", "hint": "H1"}, {"question": "Q2", "hint": "H2"},
             {"question": "Q3", "hint": "H3"}, {"question": "Q4", "hint": "H4"}]"#,
        );
        let questions = generate_questions(&oracle, "Python").await.ok().unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[2].question, "Q3");
        assert!(oracle.last_request().unwrap()[1].content.contains("'Python'"));
    }

    #[tokio::test]
    async fn test_short_list_is_not_padded() {
        let oracle = ScriptedOracle::new().reply(r#"[{"question": "Only one?"}]"#);
        let questions = generate_questions(&oracle, "Go").await.ok().unwrap();
        assert_eq!(
            questions,
            vec![Question {
                question: "Only one?".to_string(),
                hint: String::new()
            }]
        );
    }

    #[tokio::test]
    async fn test_reply_without_array_is_empty() {
        let oracle = ScriptedOracle::new().reply("I cannot help with that.");
        assert!(generate_questions(&oracle, "Go").await.is_empty());
    }
}
