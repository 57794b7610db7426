//! Résumé tagger: coarse topical labels from keyword matching.

/// Topical tag attached to a résumé. Declaration order is the output priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    FullStack,
    DataScience,
    Cybersecurity,
    GeneralTech,
}

impl Tag {
    pub fn label(&self) -> &'static str {
        match self {
            Tag::FullStack => "Full Stack",
            Tag::DataScience => "Data Science",
            Tag::Cybersecurity => "Cybersecurity",
            Tag::GeneralTech => "General Tech",
        }
    }
}

const KEYWORD_SETS: &[(Tag, &[&str])] = &[
    (
        Tag::FullStack,
        &["full stack", "html", "css", "javascript", "react"],
    ),
    (
        Tag::DataScience,
        &["data science", "machine learning", "deep learning"],
    ),
    (Tag::Cybersecurity, &["cybersecurity", "network security"]),
];

/// Every tag whose keyword set matches, in priority order. `[GeneralTech]` when none do.
pub fn detect_tags(resume_text: &str) -> Vec<Tag> {
    let lowered = resume_text.to_lowercase();
    let tags: Vec<Tag> = KEYWORD_SETS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(tag, _)| *tag)
        .collect();

    if tags.is_empty() {
        vec![Tag::GeneralTech]
    } else {
        tags
    }
}

/// Comma-joined tag labels, e.g. `"Full Stack, Data Science"`. Never empty.
pub fn tag_resume(resume_text: &str) -> String {
    detect_tags(resume_text)
        .iter()
        .map(Tag::label)
        .collect::<Vec<_>>()
        .join(", ")
}
