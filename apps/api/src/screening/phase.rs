use std::fmt;

use serde::{Deserialize, Serialize};

/// The single phase marker of a screening session.
///
/// `GeneratingQuestions` through `ShowingFeedback` repeat once per stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    CollectingInfo,
    CollectingStacks,
    GeneratingQuestions,
    AwaitingAnswers,
    Evaluating,
    ShowingFeedback,
    Finished,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::CollectingInfo => "COLLECTING_INFO",
            Phase::CollectingStacks => "COLLECTING_STACKS",
            Phase::GeneratingQuestions => "GENERATING_QUESTIONS",
            Phase::AwaitingAnswers => "AWAITING_ANSWERS",
            Phase::Evaluating => "EVALUATING",
            Phase::ShowingFeedback => "SHOWING_FEEDBACK",
            Phase::Finished => "FINISHED",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Finished
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
