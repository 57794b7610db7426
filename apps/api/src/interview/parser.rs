//! Output parser: turns raw model text into typed questions.
//!
//! Two grammars:
//! - strict MCQ: blocks delimited by numbered (`1.`, `2:`, `3)`) or `Q`-prefixed
//!   (`Q:`, `Q.`, `Q4.`) lines, each holding a question line, four `A.`–`D.` option
//!   lines, an `Answer:` line and an `Explanation:` line;
//! - open-ended: one question per line.
//!
//! Both are pure functions. Malformed MCQ blocks are dropped without a report; callers
//! judge the batch by how many records survive.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::question::{McqQuestion, OpenQuestion, OptionLetter};

/// Minimum non-empty lines in an MCQ block: question, four options, answer/explanation.
const MIN_BLOCK_LINES: usize = 6;

/// A `Q`/`Q4`/`12` marker followed by `.`, `:` or `)` at the start of a line.
/// Whether it really opens a question is decided by `is_question_marker`.
static BLOCK_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:Q\d*|\d+)[ \t]*[.:)]").expect("block marker pattern is valid")
});

static LINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Q\d*|\d+)\s*[.:)]").expect("line marker pattern is valid"));

static ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Answer:\s*([A-D])").expect("answer pattern is valid"));

/// A numeric marker directly followed by a digit is a decimal or a time (`3.5`, `2:30`).
fn is_question_marker(marker: &str, rest: &str) -> bool {
    let numeric = marker.trim_start().starts_with(|c: char| c.is_ascii_digit());
    !(numeric && rest.starts_with(|c: char| c.is_ascii_digit()))
}

fn split_blocks(raw: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    for m in BLOCK_MARKER.find_iter(raw) {
        if !is_question_marker(m.as_str(), &raw[m.end()..]) {
            continue;
        }
        blocks.push(&raw[start..m.start()]);
        start = m.end();
    }
    blocks.push(&raw[start..]);
    blocks
}

/// Byte length of the question marker opening `line`, if any.
fn leading_marker_len(line: &str) -> Option<usize> {
    let m = LINE_MARKER.find(line)?;
    is_question_marker(m.as_str(), &line[m.end()..]).then_some(m.end())
}

/// Parses every well-formed MCQ block in `raw`, in order of appearance.
pub fn parse_mcqs(raw: &str) -> Vec<McqQuestion> {
    split_blocks(raw)
        .into_iter()
        .filter_map(parse_mcq_block)
        .collect()
}

fn parse_mcq_block(block: &str) -> Option<McqQuestion> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < MIN_BLOCK_LINES {
        return None;
    }

    let question = strip_leading_markers(lines[0]);
    if question.is_empty() {
        return None;
    }

    let options: BTreeMap<OptionLetter, String> =
        lines[1..5].iter().filter_map(|l| parse_option(l)).collect();
    if options.len() < OptionLetter::ALL.len() {
        return None;
    }

    let answer_line = lines.iter().find(|l| l.contains("Answer:"))?;
    let explanation_line = lines.iter().find(|l| l.contains("Explanation:"))?;

    let answer = ANSWER
        .captures(answer_line)
        .and_then(|c| c[1].chars().next())
        .and_then(OptionLetter::from_char)?;

    let explanation = explanation_line
        .split_once(':')
        .map(|(_, rest)| rest.trim())
        .unwrap_or_default();
    if explanation.is_empty() {
        return None;
    }

    Some(McqQuestion {
        question: question.to_string(),
        options,
        answer,
        explanation: explanation.to_string(),
    })
}

/// `"B. 4"` → `(B, "4")`.
fn parse_option(line: &str) -> Option<(OptionLetter, String)> {
    let mut chars = line.chars();
    let letter = chars.next().and_then(OptionLetter::from_char)?;
    let text = chars.as_str().strip_prefix('.')?;
    Some((letter, text.trim().to_string()))
}

/// Extracts free-text questions: lines ending in `?` or opening with a question or
/// list marker, markers stripped, order preserved.
pub fn parse_open_questions(raw: &str) -> Vec<OpenQuestion> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| l.ends_with('?') || leading_marker_len(l).is_some())
        .map(strip_leading_markers)
        .filter(|q| !q.is_empty())
        .map(|q| OpenQuestion {
            question: q.to_string(),
        })
        .collect()
}

/// Drops an optional bullet and any stacked markers (`1. Q: ...`).
fn strip_leading_markers(line: &str) -> &str {
    let mut rest = line.trim_start();
    if let Some(unbulleted) = rest.strip_prefix(['-', '*', '•']) {
        rest = unbulleted.trim_start();
    }
    while let Some(len) = leading_marker_len(rest) {
        rest = rest[len..].trim_start();
    }
    rest.trim()
}
