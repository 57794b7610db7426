//! Per-session interview state: daily usage quota, the current question batch,
//! per-question lock state with cached answer keys or feedback, and the score.
//!
//! Every index moves unanswered → locked at most once. Starting a new batch resets
//! questions, submissions, annotations and score together.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::question::{OptionLetter, Question, RoundType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Question {index} does not exist (batch has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Question {0} has already been submitted")]
    AlreadySubmitted(usize),

    #[error("'{selected}' is not one of the options for question {index}")]
    UnknownOption { index: usize, selected: String },

    #[error("Question {index} is {expected}; submit {hint}")]
    WrongAnswerKind {
        index: usize,
        expected: &'static str,
        hint: &'static str,
    },
}

/// Daily generation allowance. Resets when the calendar date changes.
#[derive(Debug, Clone)]
pub struct DailyUsage {
    date: NaiveDate,
    count: u32,
    limit: u32,
}

impl DailyUsage {
    pub fn new(limit: u32, today: NaiveDate) -> Self {
        Self {
            date: today,
            count: 0,
            limit,
        }
    }

    /// Zeroes the counter if `today` is not the stored date.
    pub fn roll_over(&mut self, today: NaiveDate) {
        if self.date != today {
            self.date = today;
            self.count = 0;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.count >= self.limit
    }

    /// Charges one slot for a completion call that reached the provider.
    pub fn record_call(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

/// Cached result of a submission, shown once the question is locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    AnswerKey {
        selected: String,
        correct: bool,
        correct_option: OptionLetter,
        correct_text: String,
        explanation: String,
    },
    Feedback {
        answer: String,
        feedback: String,
    },
}

/// Lock state of one question index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Unanswered,
    Locked,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    usage: DailyUsage,
    resume_text: Option<String>,
    round: Option<RoundType>,
    questions: Vec<Question>,
    submitted: BTreeSet<usize>,
    annotations: BTreeMap<usize, Annotation>,
    score: u32,
}

impl SessionState {
    pub fn new(daily_limit: u32, today: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            usage: DailyUsage::new(daily_limit, today),
            resume_text: None,
            round: None,
            questions: Vec::new(),
            submitted: BTreeSet::new(),
            annotations: BTreeMap::new(),
            score: 0,
        }
    }

    /// Usage counter after rolling it over to `today`. The generator is the only writer.
    pub fn usage_for(&mut self, today: NaiveDate) -> &mut DailyUsage {
        self.usage.roll_over(today);
        &mut self.usage
    }

    pub fn usage(&self) -> &DailyUsage {
        &self.usage
    }

    pub fn set_resume_text(&mut self, text: String) {
        self.resume_text = Some(text);
    }

    pub fn resume_text(&self) -> Option<&str> {
        self.resume_text.as_deref()
    }

    /// Replaces the batch and clears every per-question annotation and the score.
    pub fn start_batch(&mut self, round: RoundType, questions: Vec<Question>) {
        self.round = Some(round);
        self.questions = questions;
        self.submitted.clear();
        self.annotations.clear();
        self.score = 0;
    }

    pub fn round(&self) -> Option<RoundType> {
        self.round
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn mcq_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_mcq()).count()
    }

    pub fn status(&self, index: usize) -> QuestionStatus {
        if self.submitted.contains(&index) {
            QuestionStatus::Locked
        } else {
            QuestionStatus::Unanswered
        }
    }

    pub fn annotation(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(&index)
    }

    /// Returns the question at `index`, with the round its batch was generated for,
    /// if it is still open for submission. Only `start_batch` fills the batch, so a
    /// session without a round has no questions.
    pub fn open_question(&self, index: usize) -> Result<(RoundType, &Question), SessionError> {
        let out_of_range = || SessionError::IndexOutOfRange {
            index,
            len: self.questions.len(),
        };
        let round = self.round.ok_or_else(out_of_range)?;
        let question = self.questions.get(index).ok_or_else(out_of_range)?;
        if self.submitted.contains(&index) {
            return Err(SessionError::AlreadySubmitted(index));
        }
        Ok((round, question))
    }

    /// Locks an MCQ, scoring it by exact match of `selected` against the correct option text.
    pub fn submit_choice(&mut self, index: usize, selected: &str) -> Result<&Annotation, SessionError> {
        let (_, Question::Mcq(mcq)) = self.open_question(index)? else {
            return Err(SessionError::WrongAnswerKind {
                index,
                expected: "open-ended",
                hint: "a free-text answer",
            });
        };

        if !mcq.options.values().any(|text| text == selected) {
            return Err(SessionError::UnknownOption {
                index,
                selected: selected.to_string(),
            });
        }

        let correct_text = mcq.correct_text().to_string();
        let correct = selected == correct_text;
        let annotation = Annotation::AnswerKey {
            selected: selected.to_string(),
            correct,
            correct_option: mcq.answer,
            correct_text,
            explanation: mcq.explanation.clone(),
        };

        if correct {
            self.score += 1;
        }
        Ok(self.lock(index, annotation))
    }

    /// Locks an open-ended question with the evaluator's feedback.
    pub fn submit_feedback(
        &mut self,
        index: usize,
        answer: &str,
        feedback: String,
    ) -> Result<&Annotation, SessionError> {
        if self.open_question(index)?.1.is_mcq() {
            return Err(SessionError::WrongAnswerKind {
                index,
                expected: "multiple-choice",
                hint: "a selected option",
            });
        }
        let annotation = Annotation::Feedback {
            answer: answer.to_string(),
            feedback,
        };
        Ok(self.lock(index, annotation))
    }

    fn lock(&mut self, index: usize, annotation: Annotation) -> &Annotation {
        self.submitted.insert(index);
        self.annotations.entry(index).or_insert(annotation)
    }
}
