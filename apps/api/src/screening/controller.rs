//! Conversation Phase Controller — drives one session through the screening phases.
//!
//! Flow per stack: GeneratingQuestions → AwaitingAnswers → Evaluating → ShowingFeedback.
//! Entering GeneratingQuestions immediately runs a bounded generation round, so a
//! client never observes that phase unless the round failed.
//!
//! Oracle failures never surface as errors here: they arrive as `Extraction::Empty`
//! and become notices on the returned `Turn`. `ScreeningError` is reserved for
//! actions that are invalid for the phase or carry invalid input.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::extractor::evaluation::evaluate_answers;
use crate::extractor::info::extract_candidate_info;
use crate::extractor::questions::{generate_questions, QUESTIONS_PER_STACK};
use crate::extractor::stacks::{same_stack, validate_stacks};
use crate::extractor::Extraction;
use crate::llm_client::{ChatMessage, Oracle};
use crate::models::candidate::{CandidateInfo, NewCandidate};
use crate::screening::phase::Phase;
use crate::screening::session::{Session, StackFeedback};
use crate::screening::validation::validate_candidate_info;
use crate::store::{CandidateStore, CommitOutcome};

/// Attempts per question-generation round.
pub const MAX_GENERATION_ATTEMPTS: u32 = 3;

pub const FINAL_MESSAGE: &str = "🙏 Thank you for participating! Your responses are under review. \
    Our HR team may contact you for further steps.";

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("'{action}' is only available during {}; session is in {actual}", join_phases(.expected))]
    InvalidPhase {
        action: &'static str,
        expected: &'static [Phase],
        actual: Phase,
    },

    #[error("{0}")]
    Validation(String),
}

fn join_phases(phases: &[Phase]) -> String {
    phases
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Out-of-band message for the display surface; not part of the chat history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// What one user action produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub phase: Phase,
    /// Assistant messages appended to the history during this action.
    pub replies: Vec<String>,
    pub notices: Vec<Notice>,
    pub feedback: Option<StackFeedback>,
}

impl Turn {
    fn new() -> Self {
        Self {
            phase: Phase::CollectingInfo,
            replies: Vec::new(),
            notices: Vec::new(),
            feedback: None,
        }
    }

    fn notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice {
            level,
            text: text.into(),
        });
    }

    fn finish(mut self, session: &Session) -> Self {
        self.phase = session.phase;
        if session.phase == Phase::ShowingFeedback {
            self.feedback = session.current_feedback();
        }
        self
    }
}

fn say(session: &mut Session, turn: &mut Turn, text: impl Into<String>) {
    let text = text.into();
    session.messages.push(ChatMessage::assistant(text.clone()));
    turn.replies.push(text);
}

fn require(
    session: &Session,
    action: &'static str,
    expected: &'static [Phase],
) -> Result<(), ScreeningError> {
    if expected.contains(&session.phase) {
        Ok(())
    } else {
        Err(ScreeningError::InvalidPhase {
            action,
            expected,
            actual: session.phase,
        })
    }
}

fn non_blank(text: &str, what: &str) -> Result<String, ScreeningError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ScreeningError::Validation(format!("{what} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn transition(session: &mut Session, to: Phase) {
    if session.phase == to {
        return;
    }
    info!("Session {}: {} -> {}", session.id, session.phase, to);
    session.phase = to;
}

fn info_summary(info: &CandidateInfo) -> String {
    format!(
        "✅ Thanks, {}!\n\n📧 **Email**: {}\n\n📱 **Phone**: {}\n\n💼 **Experience**: {} years\n\n\
         🎯 **Position**: {}\n\n📍 **Location**: {}\n\n\
         All information collected. Please enter your tech stacks (comma-separated):",
        info.full_name, info.email, info.phone, info.experience, info.position, info.location
    )
}

/// Stateless driver; all state lives in the `Session` it is handed.
#[derive(Clone)]
pub struct ScreeningController {
    oracle: Arc<dyn Oracle>,
    store: Arc<dyn CandidateStore>,
}

impl ScreeningController {
    pub fn new(oracle: Arc<dyn Oracle>, store: Arc<dyn CandidateStore>) -> Self {
        Self { oracle, store }
    }

    /// Free-text chat input. Routed to info collection or stack entry by phase.
    pub async fn submit_message(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Turn, ScreeningError> {
        match session.phase {
            Phase::CollectingInfo => self.collect_info(session, text).await,
            Phase::CollectingStacks => self.submit_stacks(session, text).await,
            actual => Err(ScreeningError::InvalidPhase {
                action: "message",
                expected: &[Phase::CollectingInfo, Phase::CollectingStacks],
                actual,
            }),
        }
    }

    pub async fn collect_info(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Turn, ScreeningError> {
        require(session, "message", &[Phase::CollectingInfo])?;
        let text = non_blank(text, "Message")?;
        session.messages.push(ChatMessage::user(text));

        let mut turn = Turn::new();
        match extract_candidate_info(self.oracle.as_ref(), &session.messages).await {
            Extraction::Empty(follow_up) => say(session, &mut turn, follow_up),
            Extraction::Ok(draft) => match validate_candidate_info(&draft) {
                Ok(candidate) => {
                    info!("Session {}: candidate info collected", session.id);
                    say(session, &mut turn, info_summary(&candidate));
                    session.candidate = Some(candidate);
                    transition(session, Phase::CollectingStacks);
                }
                Err(problems) => {
                    warn!("Session {}: candidate info rejected: {problems}", session.id);
                    say(
                        session,
                        &mut turn,
                        format!("I still need a few details before we continue: {problems}."),
                    );
                }
            },
        }
        Ok(turn.finish(session))
    }

    pub async fn submit_stacks(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Turn, ScreeningError> {
        require(session, "message", &[Phase::CollectingStacks])?;
        let text = non_blank(text, "Tech stack input")?;
        session.messages.push(ChatMessage::user(text.clone()));

        let mut turn = Turn::new();
        let position = self.position(session);
        match validate_stacks(self.oracle.as_ref(), &position, &text).await {
            Extraction::Empty(reason) => say(session, &mut turn, reason),
            Extraction::Ok(validated) => {
                info!(
                    "Session {}: stacks accepted: {:?}",
                    session.id, validated.stacks
                );
                if !validated.message.trim().is_empty() {
                    say(session, &mut turn, validated.message);
                }
                session.tech_stacks = validated.stacks;
                session.current_stack_idx = 0;
                session.evaluations.clear();
                session.clear_question_set();
                transition(session, Phase::GeneratingQuestions);
                self.generate_for_current_stack(session, &mut turn).await;
            }
        }
        Ok(turn.finish(session))
    }

    /// Starts another bounded generation round after a failed one.
    pub async fn retry_questions(&self, session: &mut Session) -> Result<Turn, ScreeningError> {
        require(session, "retry questions", &[Phase::GeneratingQuestions])?;
        let mut turn = Turn::new();
        self.generate_for_current_stack(session, &mut turn).await;
        Ok(turn.finish(session))
    }

    /// Gives up on a stack whose questions could not be generated. It is kept
    /// with no ratings and the session moves on as if its feedback was shown.
    pub async fn skip_stack(&self, session: &mut Session) -> Result<Turn, ScreeningError> {
        require(session, "skip stack", &[Phase::GeneratingQuestions])?;
        let mut turn = Turn::new();
        let stack = session.current_stack().unwrap_or_default().to_string();
        warn!("Session {}: skipping stack '{stack}'", session.id);
        session.record_evaluations(Vec::new());
        session.clear_question_set();
        turn.notice(NoticeLevel::Info, format!("Skipped '{stack}'."));

        if session.is_last_stack() {
            transition(session, Phase::ShowingFeedback);
        } else {
            session.current_stack_idx += 1;
            self.generate_for_current_stack(session, &mut turn).await;
        }
        Ok(turn.finish(session))
    }

    /// Partial answer updates keyed by question index. Editing after a failed
    /// evaluation reopens the answer form.
    pub fn update_answers(
        &self,
        session: &mut Session,
        updates: &BTreeMap<usize, String>,
    ) -> Result<Turn, ScreeningError> {
        require(
            session,
            "update answers",
            &[Phase::AwaitingAnswers, Phase::Evaluating],
        )?;
        if let Some(bad) = updates.keys().find(|&&idx| idx >= session.answers.len()) {
            return Err(ScreeningError::Validation(format!(
                "There is no question {} for this stack",
                bad + 1
            )));
        }
        for (&idx, answer) in updates {
            session.answers[idx] = answer.clone();
        }
        if session.phase == Phase::Evaluating {
            transition(session, Phase::AwaitingAnswers);
        }
        Ok(Turn::new().finish(session))
    }

    /// Submits the answer set for evaluation. Resubmitting after a failed
    /// evaluation is the manual retry.
    pub async fn submit_answers(&self, session: &mut Session) -> Result<Turn, ScreeningError> {
        require(
            session,
            "submit answers",
            &[Phase::AwaitingAnswers, Phase::Evaluating],
        )?;

        let missing: Vec<String> = session
            .answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.trim().is_empty())
            .map(|(idx, _)| (idx + 1).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ScreeningError::Validation(format!(
                "Please answer all questions before submitting. Unanswered: {}",
                missing.join(", ")
            )));
        }

        if session.phase != Phase::Evaluating {
            transition(session, Phase::Evaluating);
        }

        let mut turn = Turn::new();
        let stack = session.current_stack().unwrap_or_default().to_string();
        match evaluate_answers(
            self.oracle.as_ref(),
            &stack,
            &session.questions,
            &session.answers,
        )
        .await
        {
            Extraction::Ok(evaluations) => {
                session.record_evaluations(evaluations);
                transition(session, Phase::ShowingFeedback);
            }
            Extraction::Empty(reason) => {
                warn!("Session {}: evaluation for '{stack}' failed", session.id);
                turn.notice(NoticeLevel::Error, reason);
            }
        }
        Ok(turn.finish(session))
    }

    pub async fn next_stack(&self, session: &mut Session) -> Result<Turn, ScreeningError> {
        require(session, "next stack", &[Phase::ShowingFeedback])?;
        if session.is_last_stack() {
            return Err(ScreeningError::Validation(
                "This is the last stack. Add another stack or finish.".to_string(),
            ));
        }
        session.current_stack_idx += 1;
        session.clear_question_set();
        transition(session, Phase::GeneratingQuestions);

        let mut turn = Turn::new();
        self.generate_for_current_stack(session, &mut turn).await;
        Ok(turn.finish(session))
    }

    /// Adds stacks after the last one has been evaluated. Only stacks not
    /// already listed (ignoring case) are appended; screening resumes at the
    /// first of them.
    pub async fn add_stacks(
        &self,
        session: &mut Session,
        text: &str,
    ) -> Result<Turn, ScreeningError> {
        require(session, "add stack", &[Phase::ShowingFeedback])?;
        if !session.is_last_stack() {
            return Err(ScreeningError::Validation(
                "Finish the remaining stacks before adding new ones.".to_string(),
            ));
        }
        let text = non_blank(text, "Tech stack input")?;
        session.messages.push(ChatMessage::user(text.clone()));

        let mut turn = Turn::new();
        let position = self.position(session);
        let validated = match validate_stacks(self.oracle.as_ref(), &position, &text).await {
            Extraction::Ok(validated) => validated,
            Extraction::Empty(_) => {
                turn.notice(
                    NoticeLevel::Warning,
                    "⚠️ No valid new tech stacks found. Please try again.",
                );
                return Ok(turn.finish(session));
            }
        };

        let (duplicates, fresh): (Vec<String>, Vec<String>) =
            validated.stacks.into_iter().partition(|candidate| {
                session
                    .tech_stacks
                    .iter()
                    .any(|existing| same_stack(existing, candidate))
            });

        if !duplicates.is_empty() {
            turn.notice(
                NoticeLevel::Info,
                format!("ℹ️ Stack(s) already listed: {}", duplicates.join(", ")),
            );
        }
        if fresh.is_empty() {
            return Ok(turn.finish(session));
        }

        info!("Session {}: adding stacks {:?}", session.id, fresh);
        if !validated.message.trim().is_empty() {
            say(session, &mut turn, validated.message);
        }
        session.current_stack_idx = session.tech_stacks.len();
        session.tech_stacks.extend(fresh);
        session.clear_question_set();
        transition(session, Phase::GeneratingQuestions);
        self.generate_for_current_stack(session, &mut turn).await;
        Ok(turn.finish(session))
    }

    /// Ends the screening after the last stack and commits the candidate with
    /// every rating. Runs once: `Finished` accepts no further actions.
    pub async fn finish(&self, session: &mut Session) -> Result<Turn, ScreeningError> {
        require(session, "finish", &[Phase::ShowingFeedback])?;
        if !session.is_last_stack() {
            return Err(ScreeningError::Validation(
                "Finish the remaining stacks before ending the screening.".to_string(),
            ));
        }
        let Some(info) = session.candidate.clone() else {
            return Err(ScreeningError::Validation(
                "Candidate details were never collected".to_string(),
            ));
        };

        let mut turn = Turn::new();
        if session.candidate_id.is_none() {
            let candidate = NewCandidate {
                info,
                tech_stacks: session.tech_stacks.clone(),
            };
            let ratings = session.rating_rows();
            match self.store.commit_screening(&candidate, &ratings).await {
                Ok(CommitOutcome::Committed { candidate_id, .. }) => {
                    session.candidate_id = Some(candidate_id);
                }
                Ok(CommitOutcome::DuplicateEmail) => turn.notice(
                    NoticeLevel::Warning,
                    format!(
                        "{} is already registered; your earlier application is on file.",
                        candidate.info.email
                    ),
                ),
                Err(e) => {
                    error!("Session {}: failed to persist screening: {e}", session.id);
                    turn.notice(
                        NoticeLevel::Warning,
                        "Your responses could not be saved. Please contact our HR team.",
                    );
                }
            }
        }

        transition(session, Phase::Finished);
        say(session, &mut turn, FINAL_MESSAGE);
        Ok(turn.finish(session))
    }

    fn position(&self, session: &Session) -> String {
        session
            .candidate
            .as_ref()
            .map(|c| c.position.clone())
            .unwrap_or_default()
    }

    /// One bounded round of question generation for the active stack.
    async fn generate_for_current_stack(&self, session: &mut Session, turn: &mut Turn) {
        transition(session, Phase::GeneratingQuestions);
        let stack = session.current_stack().unwrap_or_default().to_string();

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            match generate_questions(self.oracle.as_ref(), &stack).await {
                Extraction::Ok(questions) if questions.len() == QUESTIONS_PER_STACK => {
                    session.answers = vec![String::new(); questions.len()];
                    session.questions = questions;
                    session.generation_failed = false;
                    transition(session, Phase::AwaitingAnswers);
                    return;
                }
                Extraction::Ok(questions) => warn!(
                    "Attempt {attempt}: only {} questions generated for '{stack}'",
                    questions.len()
                ),
                Extraction::Empty(reason) => {
                    warn!("Attempt {attempt}: question generation for '{stack}' failed: {reason}")
                }
            }
        }

        error!(
            "Session {}: could not generate questions for '{stack}' after {MAX_GENERATION_ATTEMPTS} attempts",
            session.id
        );
        session.generation_failed = true;
        turn.notice(
            NoticeLevel::Error,
            format!(
                "❌ Could not generate questions for '{stack}' after {MAX_GENERATION_ATTEMPTS} attempts. \
                 Retry, or skip this stack."
            ),
        );
    }
}
