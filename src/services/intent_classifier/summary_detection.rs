//! Deterministic detection of summary requests.
//!
//! Runs before any reasoning call. Explicit phrases always match; the
//! "what did I do" style heuristics only match when the text names no
//! specific kind of data, since those questions belong to retrieval.

const EXPLICIT_PHRASES: &[&str] = &[
    "give me a summary",
    "daily summary",
    "day summary",
    "summary for",
    "summary of",
    "show summary",
    "get summary",
    "summarize",
    "summary",
    "overview",
];

const HEURISTIC_PHRASES: &[&str] = &[
    "what did i do",
    "what have i done",
    "how was my day",
    "how did my day go",
];

/// Words that turn a "what did I do" question into a data question.
const DATA_WORDS: &[&str] = &[
    "eat", "ate", "eaten", "food", "meal", "meals", "drink", "drank", "workout", "workouts",
    "exercise", "exercised", "run", "ran", "sleep", "slept", "weight", "weigh", "calories",
    "protein", "water",
];

/// Returns the phrase that marked `text` as a summary request.
pub fn detect(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();

    if let Some(phrase) = EXPLICIT_PHRASES.iter().find(|p| lower.contains(**p)) {
        return Some(phrase);
    }

    let heuristic = HEURISTIC_PHRASES.iter().find(|p| lower.contains(**p))?;
    let names_data = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| DATA_WORDS.contains(&word));
    if names_data {
        None
    } else {
        Some(heuristic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_phrases() {
        assert_eq!(detect("Give me a summary for yesterday"), Some("give me a summary"));
        assert_eq!(detect("quick OVERVIEW please"), Some("overview"));
        assert_eq!(detect("summarize last week"), Some("summarize"));
    }

    #[test]
    fn test_heuristic_without_data_words() {
        assert_eq!(detect("what did I do yesterday?"), Some("what did i do"));
        assert_eq!(detect("How was my day"), Some("how was my day"));
    }

    #[test]
    fn test_heuristic_excluded_by_data_words() {
        assert_eq!(detect("what did I do for my workout yesterday"), None);
        assert_eq!(detect("what did i do, did i eat enough protein"), None);
    }

    #[test]
    fn test_data_words_match_whole_words() {
        // "late" contains "ate" but is not a data word.
        assert_eq!(detect("what did I do late yesterday"), Some("what did i do"));
    }

    #[test]
    fn test_plain_text_is_not_summary() {
        assert_eq!(detect("I had a smoothie. log that."), None);
        assert_eq!(detect(""), None);
    }
}
