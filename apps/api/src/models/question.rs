use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The five interview rounds a batch of questions can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    AptitudeVerbal,
    LogicalReasoning,
    TechnicalMcq,
    TechnicalTheory,
    Hr,
}

impl RoundType {
    pub const ALL: [RoundType; 5] = [
        RoundType::Hr,
        RoundType::TechnicalTheory,
        RoundType::TechnicalMcq,
        RoundType::AptitudeVerbal,
        RoundType::LogicalReasoning,
    ];

    /// Human-readable label, also fed into the prompt templates.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AptitudeVerbal => "Aptitude + Verbal",
            Self::LogicalReasoning => "Logical Reasoning",
            Self::TechnicalMcq => "Technical MCQ",
            Self::TechnicalTheory => "Technical Theory",
            Self::Hr => "HR",
        }
    }

    /// MCQ-family rounds always go through the strict multiple-choice grammar.
    pub fn is_mcq(&self) -> bool {
        matches!(
            self,
            Self::AptitudeVerbal | Self::LogicalReasoning | Self::TechnicalMcq
        )
    }
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Option letter of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A multiple-choice question as accepted by the strict parser.
///
/// Invariants (upheld by `interview::parser::parse_mcqs`): `options` holds exactly the
/// four letters A–D, `answer` is one of them, `explanation` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question: String,
    pub options: BTreeMap<OptionLetter, String>,
    pub answer: OptionLetter,
    pub explanation: String,
}

impl McqQuestion {
    /// Text of the correct option.
    pub fn correct_text(&self) -> &str {
        self.options
            .get(&self.answer)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// A free-text question for theory and HR rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub question: String,
}

/// One generated question; the variant follows the round family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Question {
    Mcq(McqQuestion),
    OpenEnded(OpenQuestion),
}

impl Question {
    pub fn text(&self) -> &str {
        match self {
            Question::Mcq(q) => &q.question,
            Question::OpenEnded(q) => &q.question,
        }
    }

    pub fn is_mcq(&self) -> bool {
        matches!(self, Question::Mcq(_))
    }
}
