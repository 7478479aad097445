//! Rule tables for the text command matcher.
//!
//! A table is pure data. The theme table ships as TOML next to the persona
//! catalog; the intent table is derived from the persona catalog at startup.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::persona::PersonaCatalog;

use super::types::CommandKind;

/// Bundled theme table.
const BUNDLED_THEMES: &str = include_str!("../../config/themes.toml");

/// Companion phrases that turn a department name into a switch request.
/// Matched as substrings, so none may sit inside an ordinary word ("task").
const INTENT_MODIFIERS: &[&str] = &[
    "talk to",
    "speak to",
    "switch to",
    "connect me",
    "ask the",
    "ask our",
    "ask my",
    "can i ask",
    "want to ask",
    "need to ask",
];

/// Keyword vocabulary that hints at a persona without naming it.
const TECHNICAL_WORDS: &[&str] = &["code", "debug", "error", "api", "function", "algorithm", "database"];
const BUSINESS_WORDS: &[&str] = &["revenue", "sales", "market", "strategy", "customer", "profit"];

// ─────────────────────────────────────────────────────────────────
// Table Entries
// ─────────────────────────────────────────────────────────────────

/// A trigger word paired with a companion modifier word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundRule {
    /// Category words; the first one present (in list order) is the match.
    pub triggers: Vec<String>,

    /// At least one of these must also be present.
    pub modifiers: Vec<String>,

    /// Fixed target emitted for switch rules. Without one the matched trigger is used.
    #[serde(default)]
    pub target: Option<String>,

    /// Kind of command emitted.
    #[serde(default = "default_compound_kind")]
    pub kind: CommandKind,

    /// Per-trigger member lists carried as payload.
    #[serde(default)]
    pub groups: Vec<Group>,
}

fn default_compound_kind() -> CommandKind {
    CommandKind::SwitchCategory
}

impl CompoundRule {
    /// Members listed for `trigger`, if any.
    pub fn group(&self, trigger: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(trigger))
            .map(|g| g.members.as_slice())
    }
}

/// Named, ordered list of target names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub members: Vec<String>,
}

/// A cataloged target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Name as written by users (e.g. "Cyber Dark", "Dr. Sarah Johnson").
    pub name: String,

    /// Value emitted in commands. Defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Target {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// The emitted value.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.name)
    }
}

/// Fixed informational phrases for one command kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRule {
    pub kind: CommandKind,
    pub phrases: Vec<String>,
}

/// Shorthand word for a target value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub alias: String,
    pub target: String,
}

// ─────────────────────────────────────────────────────────────────
// Rule Table
// ─────────────────────────────────────────────────────────────────

/// Ordered rule data for one matcher instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// What the targets are called in reasons ("theme", "executive").
    pub noun: String,

    #[serde(default)]
    pub compound: Vec<CompoundRule>,

    #[serde(default)]
    pub targets: Vec<Target>,

    #[serde(default)]
    pub phrases: Vec<PhraseRule>,

    #[serde(default)]
    pub aliases: Vec<Alias>,
}

impl RuleTable {
    /// Parse a table from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config_parse(format!("rule table: {}", e.message())))
    }

    /// The bundled theme switching table.
    pub fn themes() -> Result<Self> {
        Self::from_toml_str(BUNDLED_THEMES)
    }

    /// Persona hinting table derived from the catalog.
    ///
    /// Persona names and titles are targets emitting persona ids; department
    /// labels with "talk to"-style modifiers are compound triggers; persona ids
    /// and technical/business vocabulary are aliases.
    pub fn intents(catalog: &PersonaCatalog) -> Self {
        let personas = catalog.personas();

        let compound = personas
            .iter()
            .map(|p| CompoundRule {
                triggers: vec![p.department.to_lowercase()],
                modifiers: INTENT_MODIFIERS.iter().map(|m| m.to_string()).collect(),
                target: Some(p.id.clone()),
                kind: CommandKind::SwitchCategory,
                groups: vec![],
            })
            .collect();

        let targets = personas
            .iter()
            .flat_map(|p| {
                [
                    Target::with_value(p.name.clone(), p.id.clone()),
                    Target::with_value(p.title.clone(), p.id.clone()),
                ]
            })
            .collect();

        let phrases = vec![
            PhraseRule {
                kind: CommandKind::ShowAll,
                phrases: strings(&["all executives", "list executives", "show executives"]),
            },
            PhraseRule {
                kind: CommandKind::Suggest,
                phrases: strings(&["who should i ask", "suggest an executive", "recommend an executive"]),
            },
            PhraseRule {
                kind: CommandKind::QueryCurrent,
                phrases: strings(&["who am i talking to", "which executive", "who is this"]),
            },
        ];

        let mut aliases: Vec<Alias> = personas
            .iter()
            .map(|p| Alias {
                alias: p.id.to_lowercase(),
                target: p.id.clone(),
            })
            .collect();

        // Vocabulary hints only apply when the catalog has the persona they point at
        for (words, id) in [(TECHNICAL_WORDS, "cto"), (BUSINESS_WORDS, "ceo")] {
            if let Some(persona) = catalog.get(id) {
                aliases.extend(words.iter().map(|w| Alias {
                    alias: w.to_string(),
                    target: persona.id.clone(),
                }));
            }
        }

        Self {
            noun: "executive".to_string(),
            compound,
            targets,
            phrases,
            aliases,
        }
    }

    /// Distinct target values in catalog order.
    pub fn target_values(&self) -> Vec<String> {
        let mut values: Vec<String> = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            if !values.iter().any(|v| v == target.value()) {
                values.push(target.value().to_string());
            }
        }
        values
    }

    /// Display name for a target value (first target emitting it).
    pub fn display_name<'a>(&'a self, value: &'a str) -> &'a str {
        self.targets
            .iter()
            .find(|t| t.value() == value)
            .map(|t| t.name.as_str())
            .unwrap_or(value)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
