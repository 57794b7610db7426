// Prompt templates for question generation and answer evaluation, plus the
// renderer that fills them. Placeholders: {round_type}, {resume}, {jd},
// {question}, {answer}.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::question::RoundType;

/// Shared by the three MCQ-family rounds. The round label inside `{round_type}`
/// selects which guidance bullet the model follows.
pub const STRICT_MCQ_TEMPLATE: &str = r#"You are an expert interview question generator.

Your task is to generate exactly 10 multiple-choice questions for a {round_type} interview based on the candidate's resume and job description.

### Format:
Q: [The question]
A. [Option A]
B. [Option B]
C. [Option C]
D. [Option D]
Answer: [Correct option letter only, like A]
Explanation: [Brief explanation in 1-2 lines]

Ensure that:
- Questions cover real-world concepts from {round_type}
- For Technical MCQ: Focus on programming concepts (Python, SQL, ML, etc.)
- For Aptitude + Verbal: Mix of quant, time-speed, age problems, synonyms, antonyms, grammar
- For Logical Reasoning: Include patterns, next number/letter, seating arrangements
- Answer and Explanation must always be included

Resume:
{resume}

JD:
{jd}"#;

pub const TECH_THEORY_TEMPLATE: &str = r#"You are a technical HR interviewer.
Generate 15 open-ended theory-based questions for a {round_type} interview on languages and domains mentioned in the resume (like Python, SQL, ML, etc.).
Write one question per line.

Resume:
{resume}

JD:
{jd}"#;

pub const HR_TEMPLATE: &str = r#"You are an HR expert. Generate 15 HR questions for a {round_type} interview focused on communication, attitude, motivation, goals, and leadership.
Format:
Q: Question?

Resume:
{resume}

JD:
{jd}"#;

/// Evaluation template. Replace: {round_type}, {question}, {answer}
pub const EVALUATION_TEMPLATE: &str = r#"You are an expert interviewer.
Evaluate the candidate's answer to the following {round_type} interview question.
Give suggestions for improvement but do not include any numeric rating.

Question: {question}
Answer: {answer}

Suggestions:"#;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid")
});

/// Picks the template family for a round.
pub fn template_for(round: RoundType) -> &'static str {
    match round {
        RoundType::AptitudeVerbal | RoundType::LogicalReasoning | RoundType::TechnicalMcq => {
            STRICT_MCQ_TEMPLATE
        }
        RoundType::TechnicalTheory => TECH_THEORY_TEMPLATE,
        RoundType::Hr => HR_TEMPLATE,
    }
}

/// Value for the `{round_type}` placeholder: the round label plus the résumé tags.
pub fn round_descriptor(round: RoundType, tags: &str) -> String {
    format!("{} | Tags: {}", round.label(), tags)
}

/// Renders the generation prompt for a round.
pub fn build_prompt(round: RoundType, resume_text: &str, jd_text: &str, tags: &str) -> String {
    let descriptor = round_descriptor(round, tags);
    render(
        template_for(round),
        &[
            ("round_type", descriptor.as_str()),
            ("resume", resume_text),
            ("jd", jd_text),
        ],
    )
}

/// Renders the answer-evaluation prompt.
pub fn build_evaluation_prompt(question: &str, answer: &str, round: RoundType) -> String {
    render(
        EVALUATION_TEMPLATE,
        &[
            ("round_type", round.label()),
            ("question", question),
            ("answer", answer),
        ],
    )
}

/// Single-pass substitution, so braces inside the substituted values are never
/// re-expanded. A placeholder without a value is a template bug: it trips a debug
/// assertion and is left in place in release builds.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            let value = values.iter().find(|(key, _)| *key == name);
            debug_assert!(value.is_some(), "no value for placeholder {{{name}}}");
            value
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
