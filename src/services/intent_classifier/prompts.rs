//! System instructions for the reasoning service.

use crate::domain::models::Source;
use crate::services::tool_projection::{RETRIEVAL_TOOL, SUMMARY_TOOL};

/// Classification instruction for the given source.
///
/// The ambient feed assumes the speaker asked for something to be logged;
/// the interactive surface also covers plain questions and refusals.
pub fn classification_instruction(
    source: Source,
    threshold: f64,
    retrieval_enabled: bool,
) -> String {
    let mut prompt = String::from(
        "You are the intent classifier of a personal automation platform. ",
    );

    match source {
        Source::Ambient => {
            prompt.push_str(
                "The text comes from an always-on transcript in which the user asked for \
                 something to be logged. Decide which handler(s) should act on it. ",
            );
        }
        Source::Interactive => {
            prompt.push_str(
                "The text is a chat message. It may be a question, a command to log data, \
                 a request for a summary, or a general query. Decide which handler(s) should \
                 handle it. Use action 'log' for recording data and 'query' for questions. ",
            );
        }
    }

    prompt.push_str(&format!(
        "If the user asks for a summary or overview of a day, call '{SUMMARY_TOOL}'. "
    ));
    if retrieval_enabled {
        prompt.push_str(&format!(
            "If the user asks about specific past records, call '{RETRIEVAL_TOOL}'. "
        ));
    }
    prompt.push_str(&format!(
        "You may select several handlers when the text spans several domains. \
         Only select a handler when your confidence is at least {threshold:.2}. "
    ));

    match source {
        Source::Ambient => prompt.push_str("If nothing applies, call no function."),
        Source::Interactive => prompt.push_str(
            "If the request is out of scope (weather, news and the like), call no function \
             and say that it is out of scope.",
        ),
    }

    prompt
}

pub fn classification_user_message(text: &str) -> String {
    format!("User message/transcript:\n\n{text}")
}

/// Direct-answer instruction, enriched with the registered handler names.
pub fn direct_answer_instruction(base: &str, handler_names: &[&str]) -> String {
    format!(
        "{base}\n\n\
         Available handlers: {}\n\
         If the question needs specific tracked data, suggest the handler or command that has it.",
        handler_names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_differ_by_source() {
        let ambient = classification_instruction(Source::Ambient, 0.7, false);
        let interactive = classification_instruction(Source::Interactive, 0.7, false);
        assert_ne!(ambient, interactive);
        assert!(ambient.contains("transcript"));
        assert!(interactive.contains("out of scope"));
        assert!(ambient.contains("0.70"));
    }

    #[test]
    fn test_retrieval_mentioned_only_when_enabled() {
        let without = classification_instruction(Source::Interactive, 0.7, false);
        let with = classification_instruction(Source::Interactive, 0.7, true);
        assert!(!without.contains(RETRIEVAL_TOOL));
        assert!(with.contains(RETRIEVAL_TOOL));
    }

    #[test]
    fn test_direct_answer_lists_handlers() {
        let prompt = direct_answer_instruction("Be brief.", &["nutrition", "sleep"]);
        assert!(prompt.starts_with("Be brief."));
        assert!(prompt.contains("Available handlers: nutrition, sleep"));
    }
}
