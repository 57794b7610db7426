//! Answer evaluation for open-ended rounds: one model call, suggestions only.

use tracing::warn;

use crate::interview::prompts::build_evaluation_prompt;
use crate::llm_client::CompletionService;
use crate::models::question::RoundType;

pub const EMPTY_ANSWER_MESSAGE: &str = "Please enter your answer.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The answer was blank; nothing was sent to the model.
    EmptyAnswer,
    Suggestions(String),
    /// The model call failed; carries the provider's error text.
    Failed(String),
}

impl Evaluation {
    /// Text shown to the candidate.
    pub fn message(&self) -> String {
        match self {
            Evaluation::EmptyAnswer => EMPTY_ANSWER_MESSAGE.to_string(),
            Evaluation::Suggestions(text) => text.clone(),
            Evaluation::Failed(detail) => format!("Evaluation failed: {detail}"),
        }
    }

    /// Whether this result locks the question.
    pub fn is_final(&self) -> bool {
        !matches!(self, Evaluation::EmptyAnswer)
    }
}

pub async fn evaluate_answer(
    llm: &dyn CompletionService,
    question: &str,
    answer: &str,
    round: RoundType,
) -> Evaluation {
    if answer.trim().is_empty() {
        return Evaluation::EmptyAnswer;
    }

    let prompt = build_evaluation_prompt(question, answer, round);
    match llm.complete(&prompt).await {
        Ok(text) => Evaluation::Suggestions(text.trim().to_string()),
        Err(e) => {
            warn!("Answer evaluation failed: {e}");
            Evaluation::Failed(e.to_string())
        }
    }
}
