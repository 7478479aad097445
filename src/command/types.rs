//! Command types produced by the text command matcher.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Command Kind
// ─────────────────────────────────────────────────────────────────

/// What a detected command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Switch to one named target.
    SwitchTarget,
    /// Switch to the representative target of a category.
    SwitchCategory,
    /// Ask which target is currently active.
    QueryCurrent,
    /// Ask for a recommendation.
    Suggest,
    /// List the members of a category.
    ShowCategory,
    /// List every target.
    ShowAll,
    /// Recommend targets for a mood or activity.
    MoodSuggestion,
}

impl CommandKind {
    /// Slug used in serialized output and CLI args.
    pub fn slug(&self) -> &'static str {
        match self {
            CommandKind::SwitchTarget => "switch-target",
            CommandKind::SwitchCategory => "switch-category",
            CommandKind::QueryCurrent => "query-current",
            CommandKind::Suggest => "suggest",
            CommandKind::ShowCategory => "show-category",
            CommandKind::ShowAll => "show-all",
            CommandKind::MoodSuggestion => "mood-suggestion",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "switch-target" => Ok(CommandKind::SwitchTarget),
            "switch-category" => Ok(CommandKind::SwitchCategory),
            "query-current" => Ok(CommandKind::QueryCurrent),
            "suggest" => Ok(CommandKind::Suggest),
            "show-category" => Ok(CommandKind::ShowCategory),
            "show-all" => Ok(CommandKind::ShowAll),
            "mood-suggestion" => Ok(CommandKind::MoodSuggestion),
            _ => Err(format!("Unknown command kind '{}'", s)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Command
// ─────────────────────────────────────────────────────────────────

/// A typed command extracted from free text. Transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,

    /// Canonical target value, when the command names one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Human-readable explanation of why the command fired.
    pub reason: String,

    /// Ordered list of target names (category members, suggestions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<String>>,
}

impl Command {
    pub fn new(kind: CommandKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            target: None,
            reason: reason.into(),
            payload: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_payload(mut self, payload: Vec<String>) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_slug_matches_serde() {
        for kind in [
            CommandKind::SwitchTarget,
            CommandKind::SwitchCategory,
            CommandKind::QueryCurrent,
            CommandKind::Suggest,
            CommandKind::ShowCategory,
            CommandKind::ShowAll,
            CommandKind::MoodSuggestion,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.slug()));
            assert_eq!(kind.slug().parse::<CommandKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_from_str_accepts_underscores() {
        assert_eq!(
            "show_category".parse::<CommandKind>().unwrap(),
            CommandKind::ShowCategory
        );
        assert!("teleport".parse::<CommandKind>().is_err());
    }

    #[test]
    fn test_command_json_omits_empty_fields() {
        let cmd = Command::new(CommandKind::QueryCurrent, "User asked about current theme");
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(!json.contains("target"));
        assert!(!json.contains("payload"));
    }
}
