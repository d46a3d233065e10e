use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::extractor::evaluation::{total_stars, Evaluation, MAX_STARS};
use crate::extractor::questions::Question;
use crate::llm_client::ChatMessage;
use crate::models::candidate::{CandidateInfo, NewQuestionRating};
use crate::screening::phase::Phase;

pub const GREETING: &str =
    "👋 Hi! I'm your AI hiring assistant. Let's get started. What's your full name?";

/// All state for one candidate's screening. Owned by the registry and lent
/// to the controller for the duration of one action.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub(crate) phase: Phase,
    /// Display history. During info collection this is also the oracle context.
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) candidate: Option<CandidateInfo>,
    pub(crate) tech_stacks: Vec<String>,
    pub(crate) current_stack_idx: usize,
    pub(crate) questions: Vec<Question>,
    pub(crate) answers: Vec<String>,
    /// Indexed like `tech_stacks`; a skipped stack holds an empty list.
    pub(crate) evaluations: Vec<Vec<Evaluation>>,
    pub(crate) candidate_id: Option<i64>,
    /// Set when the last bounded round of question generation failed.
    pub(crate) generation_failed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            phase: Phase::CollectingInfo,
            messages: vec![ChatMessage::assistant(GREETING)],
            candidate: None,
            tech_stacks: Vec::new(),
            current_stack_idx: 0,
            questions: Vec::new(),
            answers: Vec::new(),
            evaluations: Vec::new(),
            candidate_id: None,
            generation_failed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tech_stacks(&self) -> &[String] {
        &self.tech_stacks
    }

    pub fn current_stack(&self) -> Option<&str> {
        self.tech_stacks
            .get(self.current_stack_idx)
            .map(String::as_str)
    }

    pub fn is_last_stack(&self) -> bool {
        self.current_stack_idx + 1 >= self.tech_stacks.len()
    }

    pub(crate) fn record_evaluations(&mut self, evaluations: Vec<Evaluation>) {
        let idx = self.current_stack_idx;
        if self.evaluations.len() <= idx {
            self.evaluations.resize(idx + 1, Vec::new());
        }
        self.evaluations[idx] = evaluations;
    }

    pub(crate) fn clear_question_set(&mut self) {
        self.questions.clear();
        self.answers.clear();
        self.generation_failed = false;
    }

    /// Feedback for the active stack, once it has been evaluated or skipped.
    pub fn current_feedback(&self) -> Option<StackFeedback> {
        let stack = self.current_stack()?;
        let items = self.evaluations.get(self.current_stack_idx)?;
        Some(StackFeedback::new(stack, items))
    }

    /// One rating row per evaluated question across every stack, in stack order.
    pub(crate) fn rating_rows(&self) -> Vec<NewQuestionRating> {
        self.tech_stacks
            .iter()
            .zip(self.evaluations.iter())
            .flat_map(|(stack, evaluations)| {
                evaluations.iter().map(move |e| NewQuestionRating {
                    tech_stack: stack.clone(),
                    question: e.question.clone(),
                    stars: e.stars,
                    feedback: e.feedback.clone(),
                })
            })
            .collect()
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            started_at: self.started_at,
            phase: self.phase,
            messages: self.messages.clone(),
            candidate: self.candidate.clone(),
            tech_stacks: self.tech_stacks.clone(),
            current_stack_index: self.current_stack_idx,
            current_stack: self.current_stack().map(String::from),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            feedback: match self.phase {
                Phase::ShowingFeedback => self.current_feedback(),
                _ => None,
            },
            has_next_stack: !self.is_last_stack(),
            candidate_id: self.candidate_id,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured feedback for one stack, as handed to the display surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackFeedback {
    pub stack: String,
    pub items: Vec<Evaluation>,
    pub total_stars: u32,
    pub max_stars: u32,
}

impl StackFeedback {
    pub fn new(stack: &str, items: &[Evaluation]) -> Self {
        Self {
            stack: stack.to_string(),
            items: items.to_vec(),
            total_stars: total_stars(items),
            max_stars: u32::from(MAX_STARS) * items.len() as u32,
        }
    }
}

/// Read model of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub phase: Phase,
    pub messages: Vec<ChatMessage>,
    pub candidate: Option<CandidateInfo>,
    pub tech_stacks: Vec<String>,
    pub current_stack_index: usize,
    pub current_stack: Option<String>,
    pub questions: Vec<Question>,
    pub answers: Vec<String>,
    pub feedback: Option<StackFeedback>,
    pub has_next_stack: bool,
    pub candidate_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(stars: u8) -> Evaluation {
        Evaluation {
            question: format!("q{stars}"),
            stars,
            feedback: "fb".to_string(),
        }
    }

    #[test]
    fn test_new_session_greets_and_collects_info() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::CollectingInfo);
        assert_eq!(session.messages, vec![ChatMessage::assistant(GREETING)]);
        assert!(session.current_stack().is_none());
    }

    #[test]
    fn test_record_evaluations_overwrites_same_stack() {
        let mut session = Session::new();
        session.tech_stacks = vec!["Python".into(), "Flask".into()];
        session.current_stack_idx = 1;
        session.record_evaluations(vec![eval(1)]);
        session.record_evaluations(vec![eval(3), eval(2)]);

        assert_eq!(session.evaluations.len(), 2);
        assert!(session.evaluations[0].is_empty());
        let feedback = session.current_feedback().unwrap();
        assert_eq!(feedback.stack, "Flask");
        assert_eq!(feedback.total_stars, 5);
        assert_eq!(feedback.max_stars, 6);
    }

    #[test]
    fn test_rating_rows_follow_stack_order() {
        let mut session = Session::new();
        session.tech_stacks = vec!["Python".into(), "Flask".into()];
        session.evaluations = vec![vec![eval(1), eval(2)], vec![eval(3)]];

        let rows = session.rating_rows();
        let stacks: Vec<_> = rows.iter().map(|r| r.tech_stack.as_str()).collect();
        assert_eq!(stacks, vec!["Python", "Python", "Flask"]);
        assert_eq!(rows[2].stars, 3);
    }
}
