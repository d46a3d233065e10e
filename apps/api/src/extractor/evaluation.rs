//! Answer evaluation — a 0–3 star rating and feedback per question.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extractor::json_scan::{decode_embedded, Shape};
use crate::extractor::prompts::{fill_template, EVALUATION_PROMPT};
use crate::extractor::questions::Question;
use crate::extractor::{ask_oracle, Extraction};
use crate::llm_client::prompts::{JSON_REPLY_INSTRUCTION, SCREENER_PERSONA};
use crate::llm_client::{ChatMessage, Oracle};

pub const MAX_STARS: u8 = 3;

const EVALUATION_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub question: String,
    /// Always within 0..=MAX_STARS.
    pub stars: u8,
    pub feedback: String,
}

/// Evaluates the answers for one stack. `answers[i]` answers `questions[i]`.
///
/// Entries come back in submission order, one per question. Non-object entries
/// are skipped and anything after the last question is dropped; fewer usable
/// entries than questions is an empty result.
pub async fn evaluate_answers(
    oracle: &dyn Oracle,
    stack_name: &str,
    questions: &[Question],
    answers: &[String],
) -> Extraction<Vec<Evaluation>> {
    let qa_text = format_qa_text(questions, answers);
    let prompt = fill_template(
        EVALUATION_PROMPT,
        &[("stack_name", stack_name), ("qa_text", &qa_text)],
    );
    let messages = [
        ChatMessage::system(format!("{SCREENER_PERSONA} {JSON_REPLY_INSTRUCTION}")),
        ChatMessage::user(prompt),
    ];

    let reply = match ask_oracle(oracle, &messages, EVALUATION_TEMPERATURE, "evaluation").await {
        Ok(reply) => reply,
        Err(reason) => return Extraction::Empty(reason),
    };

    let entries = match decode_embedded::<Vec<Value>>(&reply, Shape::Array) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Evaluation reply for '{stack_name}' unusable: {e}");
            return Extraction::Empty("Evaluation failed or returned empty.".to_string());
        }
    };

    let evaluations: Vec<Evaluation> = entries
        .iter()
        .filter(|entry| entry.is_object())
        .take(questions.len())
        .enumerate()
        .map(|(idx, entry)| Evaluation {
            question: entry
                .get("question")
                .and_then(Value::as_str)
                .filter(|q| !q.trim().is_empty())
                .map(String::from)
                .unwrap_or_else(|| questions[idx].question.clone()),
            stars: coerce_stars(entry.get("stars").unwrap_or(&Value::Null)),
            feedback: entry
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    if evaluations.len() != questions.len() {
        tracing::warn!(
            "Evaluation for '{stack_name}' rated {} of {} questions",
            evaluations.len(),
            questions.len()
        );
        return Extraction::Empty("Evaluation failed or returned empty.".to_string());
    }
    Extraction::Ok(evaluations)
}

/// Coerces an oracle-supplied star value into 0..=MAX_STARS.
/// Non-numeric values count as 0; fractional values round down.
pub fn coerce_stars(value: &Value) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_i64().map(|i| i as f64).or_else(|| n.as_f64()),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(f) if f.is_finite() => f.floor().clamp(0.0, MAX_STARS as f64) as u8,
        _ => 0,
    }
}

pub fn total_stars(evaluations: &[Evaluation]) -> u32 {
    evaluations.iter().map(|e| u32::from(e.stars)).sum()
}

fn format_qa_text(questions: &[Question], answers: &[String]) -> String {
    let mut text = String::new();
    for (idx, q) in questions.iter().enumerate() {
        let answer = answers.get(idx).map(String::as_str).unwrap_or("");
        text.push_str(&format!(
            "\nQuestion {}: {}\nAnswer: {}\n",
            idx + 1,
            q.question,
            answer
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedOracle;
    use serde_json::json;

    fn questions() -> Vec<Question> {
        (1..=3)
            .map(|i| Question {
                question: format!("Q{i}"),
                hint: format!("H{i}"),
            })
            .collect()
    }

    fn answers() -> Vec<String> {
        vec!["a1".into(), "a2".into(), "a3".into()]
    }

    #[test]
    fn test_stars_clamped_into_range() {
        assert_eq!(coerce_stars(&json!(7)), 3);
        assert_eq!(coerce_stars(&json!(-1)), 0);
        assert_eq!(coerce_stars(&json!(2)), 2);
    }

    #[test]
    fn test_stars_non_numeric_is_zero() {
        assert_eq!(coerce_stars(&json!("three")), 0);
        assert_eq!(coerce_stars(&Value::Null), 0);
        assert_eq!(coerce_stars(&json!([2])), 0);
    }

    #[test]
    fn test_stars_numeric_strings_and_floats() {
        assert_eq!(coerce_stars(&json!(" 2 ")), 2);
        assert_eq!(coerce_stars(&json!(2.9)), 2);
        assert_eq!(coerce_stars(&json!("10")), 3);
    }

    #[tokio::test]
    async fn test_three_entries_in_order() {
        let oracle = ScriptedOracle::new().reply(
            r#"[{"question": "Q1", "stars": 3, "feedback": "Great"},
                {"question": "Q2", "stars": "1", "feedback": "Thin"},
                {"question": "Q3", "stars": 9, "feedback": "Generous"}]"#,
        );
        let evals = evaluate_answers(&oracle, "Python", &questions(), &answers())
            .await
            .ok()
            .unwrap();
        assert_eq!(evals.len(), 3);
        assert_eq!(evals[1].stars, 1);
        assert_eq!(evals[2].stars, 3);
        assert_eq!(total_stars(&evals), 7);

        let prompt = &oracle.last_request().unwrap()[1].content;
        assert!(prompt.contains("Question 2: Q2\nAnswer: a2"));
    }

    #[tokio::test]
    async fn test_missing_question_falls_back_to_submitted_text() {
        let oracle = ScriptedOracle::new().reply(
            r#"["noise", {"question": "Q1", "stars": 1, "feedback": "thin"},
                {"stars": 2, "feedback": "ok"},
                {"question": " ", "stars": 3, "feedback": "good"}]"#,
        );
        let evals = evaluate_answers(&oracle, "Go", &questions(), &answers())
            .await
            .ok()
            .unwrap();
        assert_eq!(
            evals[1],
            Evaluation {
                question: "Q2".to_string(),
                stars: 2,
                feedback: "ok".to_string()
            }
        );
        assert_eq!(evals[2].question, "Q3");
    }

    #[tokio::test]
    async fn test_fewer_entries_than_questions_is_empty_result() {
        let oracle = ScriptedOracle::new()
            .reply(r#"[{"question": "Q1", "stars": 2, "feedback": "ok"}]"#);
        let result = evaluate_answers(&oracle, "Python", &questions(), &answers()).await;
        assert_eq!(
            result,
            Extraction::Empty("Evaluation failed or returned empty.".to_string())
        );
    }

    #[tokio::test]
    async fn test_extra_entries_are_dropped() {
        let oracle = ScriptedOracle::new().reply(
            r#"[{"question": "Q1", "stars": 1, "feedback": "a"},
                {"question": "Q2", "stars": 1, "feedback": "b"},
                {"question": "Q3", "stars": 1, "feedback": "c"},
                {"question": "Q4", "stars": 3, "feedback": "d"}]"#,
        );
        let evals = evaluate_answers(&oracle, "Python", &questions(), &answers())
            .await
            .ok()
            .unwrap();
        assert_eq!(evals.len(), 3);
        assert_eq!(total_stars(&evals), 3);
    }

    #[tokio::test]
    async fn test_stack_name_placeholder_text_is_literal() {
        let oracle = ScriptedOracle::new().reply("[]");
        evaluate_answers(&oracle, "{qa_text}", &questions(), &answers()).await;

        let prompt = &oracle.last_request().unwrap()[1].content;
        assert!(prompt.contains("for the stack '{qa_text}'"));
        assert_eq!(prompt.matches("Question 1: Q1").count(), 1);
    }

    #[tokio::test]
    async fn test_empty_array_is_empty_result() {
        let oracle = ScriptedOracle::new().reply("[]");
        assert!(evaluate_answers(&oracle, "Go", &questions(), &answers())
            .await
            .is_empty());
    }
}
