//! Info extraction — recovers the candidate record from the info-collection conversation.

use serde::Deserialize;
use serde_json::Value;

use crate::extractor::json_scan::{balanced_candidates, strip_json_fences, Shape};
use crate::extractor::prompts::INFO_COLLECTION_SYSTEM;
use crate::extractor::{ask_oracle, Extraction};
use crate::llm_client::{ChatMessage, Oracle};

const INFO_TEMPERATURE: f32 = 0.2;

/// The record as the oracle emitted it. Fields stay untyped until validation,
/// since the oracle may send numbers for phone or strings for experience.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InfoDraft {
    #[serde(default)]
    pub full_name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub experience: Option<Value>,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Sends the conversation so far and tries to recover a complete record.
///
/// A reply without an embedded record object is the oracle asking a follow-up
/// question; it comes back as `Empty` carrying the reply text verbatim.
pub async fn extract_candidate_info(
    oracle: &dyn Oracle,
    history: &[ChatMessage],
) -> Extraction<InfoDraft> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(INFO_COLLECTION_SYSTEM));
    messages.extend_from_slice(history);

    let reply = match ask_oracle(oracle, &messages, INFO_TEMPERATURE, "info extraction").await {
        Ok(reply) => reply,
        Err(reason) => return Extraction::Empty(reason),
    };

    let draft = balanced_candidates(strip_json_fences(&reply), Shape::Object)
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<InfoDraft>(candidate).ok())
        .find(InfoDraft::names_any_field);

    match draft {
        Some(draft) => Extraction::Ok(draft),
        None => Extraction::Empty(reply.trim().to_string()),
    }
}

impl InfoDraft {
    /// True when at least one record field carries a value. Objects without
    /// any of them are incidental JSON, not a record.
    pub fn names_any_field(&self) -> bool {
        [
            &self.full_name,
            &self.email,
            &self.phone,
            &self.experience,
            &self.position,
            &self.location,
        ]
        .into_iter()
        .any(|field| field.as_ref().is_some_and(|value| !value.is_null()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedOracle;
    use crate::llm_client::{LlmError, Role};

    #[tokio::test]
    async fn test_follow_up_question_is_passed_through() {
        let oracle = ScriptedOracle::new().reply("Nice to meet you, Jane! What's your email?");
        let result = extract_candidate_info(&oracle, &[ChatMessage::user("Jane Doe")]).await;
        assert_eq!(
            result,
            Extraction::Empty("Nice to meet you, Jane! What's your email?".to_string())
        );
    }

    #[tokio::test]
    async fn test_record_is_decoded_from_prose() {
        let oracle = ScriptedOracle::new().reply(
            r#"All set! {"full_name": "Jane Doe", "email": "jane@x.com", "phone": 9876543210,
                "experience": "3", "position": "Backend Engineer", "location": "Pune",
                "message": "Thanks!"}"#,
        );
        let draft = extract_candidate_info(&oracle, &[ChatMessage::user("Pune")])
            .await
            .ok()
            .unwrap();
        assert_eq!(draft.full_name, Some(Value::from("Jane Doe")));
        assert_eq!(draft.phone, Some(Value::from(9876543210u64)));
        assert_eq!(draft.message.as_deref(), Some("Thanks!"));
    }

    #[tokio::test]
    async fn test_object_without_record_fields_is_follow_up() {
        let reply = r#"Could you share your phone number? {"note": "phone still missing"}"#;
        let oracle = ScriptedOracle::new().reply(reply);
        let result = extract_candidate_info(&oracle, &[ChatMessage::user("jane@x.com")]).await;
        assert_eq!(result, Extraction::Empty(reply.to_string()));
    }

    #[tokio::test]
    async fn test_record_found_after_incidental_object() {
        let oracle = ScriptedOracle::new().reply(
            r#"{"note": "done"} {"full_name": "Jane Doe", "email": null, "location": "Pune"}"#,
        );
        let draft = extract_candidate_info(&oracle, &[ChatMessage::user("Pune")])
            .await
            .ok()
            .unwrap();
        assert_eq!(draft.location, Some(Value::from("Pune")));
        assert!(draft.email.is_none());
    }

    #[test]
    fn test_null_fields_do_not_make_a_record() {
        let draft: InfoDraft =
            serde_json::from_str(r#"{"full_name": null, "message": "hi"}"#).unwrap();
        assert!(!draft.names_any_field());
    }

    #[tokio::test]
    async fn test_system_instruction_leads_history() {
        let oracle = ScriptedOracle::new().reply("What's your name?");
        let history = vec![ChatMessage::assistant("Hi!"), ChatMessage::user("hello")];
        extract_candidate_info(&oracle, &history).await;

        let sent = oracle.last_request().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(&sent[1..], &history[..]);
    }

    #[tokio::test]
    async fn test_oracle_failure_degrades_to_empty() {
        let oracle = ScriptedOracle::new().fail(LlmError::Timeout(30));
        let result = extract_candidate_info(&oracle, &[ChatMessage::user("hi")]).await;
        assert!(result.is_empty());
    }
}
