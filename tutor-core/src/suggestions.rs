//! Follow-up prompts offered after an answered question.

pub const PREVIOUS_CONTEXT_MARKER: &str = "Previous context:";
/// Longest slice of the last reply quoted into a follow-up
pub const QUOTED_REPLY_CHARS: usize = 200;

const DEFAULT_SUGGESTIONS: [&str; 3] = [
    "Tell me more about this",
    "Can you explain it simpler?",
    "Give me a similar problem to practice",
];

const PRACTICE_SUGGESTIONS: [&str; 3] = [
    "Show me how to solve this",
    "Make it a bit harder",
    "Make it a bit easier",
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SuggestionSet {
    #[default]
    Default,
    Practice,
}

impl SuggestionSet {
    /// Practice prompts follow a question that asked for practice.
    pub fn for_question(text: &str) -> Self {
        if text.to_lowercase().contains("practice") {
            SuggestionSet::Practice
        } else {
            SuggestionSet::Default
        }
    }

    pub fn items(&self) -> &'static [&'static str] {
        match self {
            SuggestionSet::Default => &DEFAULT_SUGGESTIONS,
            SuggestionSet::Practice => &PRACTICE_SUGGESTIONS,
        }
    }
}

/// Text submitted for a clicked suggestion: the quoted last reply, then the suggestion.
pub fn compose_follow_up(suggestion: &str, last_reply: Option<&str>) -> String {
    let quoted: String = last_reply
        .unwrap_or_default()
        .chars()
        .take(QUOTED_REPLY_CHARS)
        .collect();
    format!("{PREVIOUS_CONTEXT_MARKER} \"{quoted}\"\n\n{suggestion}")
}
