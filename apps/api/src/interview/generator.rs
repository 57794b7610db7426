//! Question generation. Tags the résumé, builds the round prompt, calls the model
//! with a bounded number of attempts and parses the reply into a batch.
//!
//! Quota: one slot is charged per call that comes back from the provider, whether or
//! not the reply parses. Calls that error out are not charged.

use serde::Serialize;
use tracing::{info, warn};

use crate::interview::parser::{parse_mcqs, parse_open_questions};
use crate::interview::prompts::build_prompt;
use crate::interview::session::DailyUsage;
use crate::interview::tagger::tag_resume;
use crate::llm_client::CompletionService;
use crate::models::question::{Question, RoundType};

/// Model calls per generation request.
pub const MAX_ATTEMPTS: u32 = 2;
/// Fewest parsed MCQs that make a usable batch.
pub const MIN_MCQ_QUESTIONS: usize = 5;
/// MCQ batches are truncated to this size.
pub const MAX_MCQ_QUESTIONS: usize = 10;

/// Result of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(Vec<Question>),
    /// Refused by the daily quota before calling the model.
    QuotaExceeded { limit: u32 },
    /// Every attempt returned text that did not yield enough questions.
    ParseFailure { attempts: u32 },
    /// The final attempt failed at the provider.
    ServiceFailure { message: String },
}

/// Wire-friendly classification of a `GenerationOutcome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Generated,
    QuotaExceeded,
    ParseFailure,
    ServiceFailure,
}

impl GenerationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Generated(_) => OutcomeKind::Generated,
            Self::QuotaExceeded { .. } => OutcomeKind::QuotaExceeded,
            Self::ParseFailure { .. } => OutcomeKind::ParseFailure,
            Self::ServiceFailure { .. } => OutcomeKind::ServiceFailure,
        }
    }

    /// Questions for the new batch; empty unless generation succeeded.
    pub fn into_questions(self) -> Vec<Question> {
        match self {
            Self::Generated(questions) => questions,
            _ => Vec::new(),
        }
    }

    /// User-facing status line.
    pub fn message(&self) -> String {
        match self {
            Self::Generated(questions) => format!("Generated {} questions.", questions.len()),
            Self::QuotaExceeded { limit } => format!(
                "Daily question generation limit of {limit} reached. Please try again tomorrow."
            ),
            Self::ParseFailure { .. } => {
                "Could not parse enough questions after retry.".to_string()
            }
            Self::ServiceFailure { message } => format!("LLM retry failed: {message}"),
        }
    }
}

enum AttemptFailure {
    Service(String),
    Unparseable,
}

/// Generates a batch of questions for `round`, charging `usage` per returned call.
pub async fn generate_questions(
    llm: &dyn CompletionService,
    usage: &mut DailyUsage,
    resume_text: &str,
    jd_text: &str,
    round: RoundType,
) -> GenerationOutcome {
    if usage.is_exhausted() {
        warn!(
            "Generation refused: daily usage {}/{} exhausted",
            usage.count(),
            usage.limit()
        );
        return GenerationOutcome::QuotaExceeded {
            limit: usage.limit(),
        };
    }

    let tags = tag_resume(resume_text);
    let prompt = build_prompt(round, resume_text, jd_text, &tags);
    info!("Generating {} questions (tags: {})", round, tags);

    let mut last_failure = AttemptFailure::Unparseable;

    for attempt in 1..=MAX_ATTEMPTS {
        if attempt > 1 && usage.is_exhausted() {
            warn!("Retry refused: daily usage exhausted after attempt {}", attempt - 1);
            return GenerationOutcome::QuotaExceeded {
                limit: usage.limit(),
            };
        }

        let raw = match llm.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Generation attempt {}/{} failed at provider: {}",
                    attempt, MAX_ATTEMPTS, e
                );
                last_failure = AttemptFailure::Service(e.to_string());
                continue;
            }
        };
        usage.record_call();

        match accept(round, &raw) {
            Some(questions) => {
                info!(
                    "Generation attempt {}/{} accepted {} questions (usage {}/{})",
                    attempt,
                    MAX_ATTEMPTS,
                    questions.len(),
                    usage.count(),
                    usage.limit()
                );
                return GenerationOutcome::Generated(questions);
            }
            None => {
                warn!(
                    "Generation attempt {}/{}: response did not yield enough {} questions",
                    attempt, MAX_ATTEMPTS, round
                );
                last_failure = AttemptFailure::Unparseable;
            }
        }
    }

    match last_failure {
        AttemptFailure::Service(message) => GenerationOutcome::ServiceFailure { message },
        AttemptFailure::Unparseable => GenerationOutcome::ParseFailure {
            attempts: MAX_ATTEMPTS,
        },
    }
}

/// Parses a raw reply with the round's grammar; `None` if it is not a usable batch.
fn accept(round: RoundType, raw: &str) -> Option<Vec<Question>> {
    if raw.trim().is_empty() {
        return None;
    }

    if round.is_mcq() {
        let mut parsed = parse_mcqs(raw);
        if parsed.len() < MIN_MCQ_QUESTIONS {
            return None;
        }
        parsed.truncate(MAX_MCQ_QUESTIONS);
        Some(parsed.into_iter().map(Question::Mcq).collect())
    } else {
        let parsed = parse_open_questions(raw);
        if parsed.is_empty() {
            return None;
        }
        Some(parsed.into_iter().map(Question::OpenEnded).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::llm_client::LlmError;

    /// Completion fake that replays scripted replies and records every prompt.
    pub(crate) struct ScriptedCompletion {
        replies: Mutex<VecDeque<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        pub(crate) fn new(replies: Vec<Result<String, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub(crate) fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(LlmError::Api {
                    status: 503,
                    message,
                }),
                None => Err(LlmError::Api {
                    status: 500,
                    message: "no scripted reply".to_string(),
                }),
            }
        }
    }

    pub(crate) fn mcq_reply(count: usize) -> String {
        (1..=count)
            .map(|i| {
                format!(
                    "Q: Question {i}?\nA. one\nB. two\nC. three\nD. four\nAnswer: C\nExplanation: Reason {i}.\n"
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_mcq_batch_accepted_on_first_attempt() {
        let llm = ScriptedCompletion::new(vec![Ok(mcq_reply(6))]);
        let mut usage = DailyUsage::new(50, today());

        let outcome =
            generate_questions(&llm, &mut usage, "React dev", "", RoundType::TechnicalMcq).await;

        assert_eq!(outcome.kind(), OutcomeKind::Generated);
        assert_eq!(outcome.into_questions().len(), 6);
        assert_eq!(llm.calls(), 1);
        assert_eq!(usage.count(), 1);
    }

    #[tokio::test]
    async fn test_mcq_batch_truncated_to_ten() {
        let llm = ScriptedCompletion::new(vec![Ok(mcq_reply(13))]);
        let mut usage = DailyUsage::new(50, today());

        let questions =
            generate_questions(&llm, &mut usage, "", "", RoundType::AptitudeVerbal)
                .await
                .into_questions();

        assert_eq!(questions.len(), MAX_MCQ_QUESTIONS);
        assert_eq!(questions[0].text(), "Question 1?");
    }

    #[tokio::test]
    async fn test_too_few_mcqs_retries_then_fails() {
        let llm = ScriptedCompletion::new(vec![Ok(mcq_reply(4)), Ok(mcq_reply(2))]);
        let mut usage = DailyUsage::new(50, today());

        let outcome =
            generate_questions(&llm, &mut usage, "", "", RoundType::LogicalReasoning).await;

        assert_eq!(outcome, GenerationOutcome::ParseFailure { attempts: 2 });
        assert_eq!(llm.calls(), 2);
        // Both calls reached the provider, so both are charged.
        assert_eq!(usage.count(), 2);
    }

    #[tokio::test]
    async fn test_second_attempt_can_recover() {
        let llm = ScriptedCompletion::new(vec![Ok("   ".to_string()), Ok(mcq_reply(5))]);
        let mut usage = DailyUsage::new(50, today());

        let outcome =
            generate_questions(&llm, &mut usage, "", "", RoundType::TechnicalMcq).await;

        assert_eq!(outcome.into_questions().len(), 5);
        assert_eq!(usage.count(), 2);
    }

    #[tokio::test]
    async fn test_service_errors_are_not_charged() {
        let llm = ScriptedCompletion::new(vec![
            Err("overloaded".to_string()),
            Err("still overloaded".to_string()),
        ]);
        let mut usage = DailyUsage::new(50, today());

        let outcome = generate_questions(&llm, &mut usage, "", "", RoundType::Hr).await;

        match outcome {
            GenerationOutcome::ServiceFailure { message } => {
                assert!(message.contains("still overloaded"))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(llm.calls(), 2);
        assert_eq!(usage.count(), 0);
    }

    #[tokio::test]
    async fn test_service_error_then_unparseable_is_parse_failure() {
        let llm = ScriptedCompletion::new(vec![
            Err("timeout".to_string()),
            Ok("Sorry, I cannot help with that.".to_string()),
        ]);
        let mut usage = DailyUsage::new(50, today());

        let outcome = generate_questions(&llm, &mut usage, "", "", RoundType::Hr).await;

        assert_eq!(outcome.kind(), OutcomeKind::ParseFailure);
        assert_eq!(usage.count(), 1);
    }

    #[tokio::test]
    async fn test_open_round_extracts_questions() {
        let llm = ScriptedCompletion::new(vec![Ok(
            "Q: Tell me about yourself?\nQ: Why this role?".to_string()
        )]);
        let mut usage = DailyUsage::new(50, today());

        let questions = generate_questions(&llm, &mut usage, "", "", RoundType::Hr)
            .await
            .into_questions();

        let texts: Vec<&str> = questions.iter().map(Question::text).collect();
        assert_eq!(texts, vec!["Tell me about yourself?", "Why this role?"]);
        assert!(questions.iter().all(|q| !q.is_mcq()));
    }

    #[tokio::test]
    async fn test_exhausted_quota_makes_no_calls() {
        let llm = ScriptedCompletion::new(vec![Ok(mcq_reply(10))]);
        let mut usage = DailyUsage::new(3, today());
        for _ in 0..3 {
            usage.record_call();
        }

        let outcome =
            generate_questions(&llm, &mut usage, "", "", RoundType::TechnicalMcq).await;

        assert_eq!(outcome, GenerationOutcome::QuotaExceeded { limit: 3 });
        assert_eq!(llm.calls(), 0);
        assert_eq!(usage.count(), 3);
    }

    #[tokio::test]
    async fn test_usage_counts_each_returned_call_up_to_limit() {
        let replies = (0..6).map(|_| Ok(mcq_reply(5))).collect();
        let llm = ScriptedCompletion::new(replies);
        let mut usage = DailyUsage::new(4, today());

        for n in 1..=4 {
            let outcome =
                generate_questions(&llm, &mut usage, "", "", RoundType::TechnicalMcq).await;
            assert_eq!(outcome.kind(), OutcomeKind::Generated);
            assert_eq!(usage.count(), n);
        }

        let outcome =
            generate_questions(&llm, &mut usage, "", "", RoundType::TechnicalMcq).await;
        assert_eq!(outcome.kind(), OutcomeKind::QuotaExceeded);
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn test_retry_stops_when_last_slot_was_used() {
        let llm = ScriptedCompletion::new(vec![Ok("no questions here".to_string()), Ok(mcq_reply(5))]);
        let mut usage = DailyUsage::new(1, today());

        let outcome =
            generate_questions(&llm, &mut usage, "", "", RoundType::TechnicalMcq).await;

        assert_eq!(outcome.kind(), OutcomeKind::QuotaExceeded);
        assert_eq!(llm.calls(), 1);
        assert_eq!(usage.count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_carries_round_and_tags() {
        let llm = ScriptedCompletion::new(vec![Ok(mcq_reply(5))]);
        let mut usage = DailyUsage::new(50, today());

        generate_questions(
            &llm,
            &mut usage,
            "Deep learning researcher",
            "ML engineer",
            RoundType::TechnicalMcq,
        )
        .await;

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Technical MCQ | Tags: Data Science"));
        assert!(prompt.contains("Deep learning researcher"));
        assert!(prompt.contains("ML engineer"));
    }
}
