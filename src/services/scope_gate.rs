//! Scope gate for text the reasoning service declined to route.
//!
//! Deny-list topics win, then allow-list topics, then a permissive
//! personal-vocabulary heuristic. Anything left over defaults to in scope.

use crate::domain::models::ScopeConfig;

/// First-person and tracking vocabulary, matched as whole words.
const PERSONAL_VOCABULARY: &[&str] = &[
    "my", "i", "me", "personal", "health", "fitness", "nutrition", "workout", "exercise",
    "food", "meal", "sleep", "track", "log", "progress", "summary", "stats", "data", "goal",
    "target",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeVerdict {
    pub in_scope: bool,
    pub reasoning: String,
}

impl ScopeVerdict {
    fn in_scope(reasoning: impl Into<String>) -> Self {
        Self {
            in_scope: true,
            reasoning: reasoning.into(),
        }
    }

    fn out_of_scope(reasoning: impl Into<String>) -> Self {
        Self {
            in_scope: false,
            reasoning: reasoning.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScopeGate {
    enabled: bool,
    allow: Vec<String>,
    deny: Vec<String>,
}

impl ScopeGate {
    pub fn new(config: &ScopeConfig) -> Self {
        let normalize = |topics: &[String]| {
            topics
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            enabled: config.enable_scope_check,
            allow: normalize(&config.in_scope_topics),
            deny: normalize(&config.out_of_scope_topics),
        }
    }

    pub fn check(&self, text: &str) -> ScopeVerdict {
        if !self.enabled {
            return ScopeVerdict::in_scope("Scope check disabled");
        }

        let lower = text.to_lowercase();

        if let Some(topic) = self.deny.iter().find(|t| lower.contains(t.as_str())) {
            return ScopeVerdict::out_of_scope(format!("Matches out-of-scope topic '{topic}'"));
        }
        if let Some(topic) = self.allow.iter().find(|t| lower.contains(t.as_str())) {
            return ScopeVerdict::in_scope(format!("Matches in-scope topic '{topic}'"));
        }

        let personal = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .find(|word| PERSONAL_VOCABULARY.contains(word));
        if let Some(word) = personal {
            return ScopeVerdict::in_scope(format!("Personal context ('{word}')"));
        }

        ScopeVerdict::in_scope("No out-of-scope signal")
    }
}
