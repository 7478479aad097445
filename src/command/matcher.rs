//! First-match-wins command detection over a rule table.
//!
//! Evaluation order:
//! 1. Compound rules (trigger word + modifier word)
//! 2. Cataloged targets (full name, or every word of the name as a token)
//! 3. Fixed informational phrases
//! 4. Aliases (whole words only)
//!
//! The matcher is immutable after construction and can be shared freely.

use tracing::{debug, trace};

use super::table::RuleTable;
use super::types::{Command, CommandKind};

/// Lowercased view of a target used for matching.
#[derive(Debug, Clone)]
struct PreparedTarget {
    index: usize,
    name: String,
    words: Vec<String>,
}

/// Lowercased alias split into tokens.
#[derive(Debug, Clone)]
struct PreparedAlias {
    tokens: Vec<String>,
    target: String,
}

/// Detects typed commands in free text.
#[derive(Debug, Clone)]
pub struct TextCommandMatcher {
    table: RuleTable,
    targets: Vec<PreparedTarget>,
    aliases: Vec<PreparedAlias>,
}

impl TextCommandMatcher {
    pub fn new(table: RuleTable) -> Self {
        let targets = table
            .targets
            .iter()
            .enumerate()
            .map(|(index, t)| PreparedTarget {
                index,
                name: t.name.to_lowercase(),
                words: tokenize(&t.name),
            })
            .filter(|t| !t.words.is_empty())
            .collect();

        let aliases = table
            .aliases
            .iter()
            .map(|a| PreparedAlias {
                tokens: tokenize(&a.alias),
                target: a.target.clone(),
            })
            .filter(|a| !a.tokens.is_empty())
            .collect();

        Self {
            table,
            targets,
            aliases,
        }
    }

    /// Detect at most one command in `message`.
    pub fn detect(&self, message: &str) -> Option<Command> {
        let lowered = message.to_lowercase();
        let tokens = tokenize(&lowered);

        let command = self
            .match_compound(&lowered)
            .or_else(|| self.match_target(&lowered, &tokens))
            .or_else(|| self.match_phrase(&lowered))
            .or_else(|| self.match_alias(&tokens));

        match command {
            Some(ref cmd) => debug!(
                table = %self.table.noun,
                kind = %cmd.kind,
                target = ?cmd.target,
                "Command detected"
            ),
            None => trace!(table = %self.table.noun, "No command detected"),
        }

        command
    }

    fn match_compound(&self, message: &str) -> Option<Command> {
        let noun = &self.table.noun;

        for rule in &self.table.compound {
            if !rule.modifiers.iter().any(|m| contains(message, m)) {
                continue;
            }
            let Some(trigger) = rule.triggers.iter().find(|t| contains(message, t)) else {
                continue;
            };

            let command = match rule.kind {
                CommandKind::ShowCategory => Command::new(
                    CommandKind::ShowCategory,
                    format!("Showing {} {}s", trigger, noun),
                )
                .with_target(trigger.clone()),
                CommandKind::MoodSuggestion => Command::new(
                    CommandKind::MoodSuggestion,
                    format!("Suggested {}s for {}", noun, trigger),
                )
                .with_target(trigger.clone()),
                kind => {
                    let target = rule.target.clone().unwrap_or_else(|| trigger.clone());
                    Command::new(kind, format!("User requested {} {}", trigger, noun))
                        .with_target(target)
                }
            };

            return Some(match rule.group(trigger) {
                Some(members) => command.with_payload(members.to_vec()),
                None => command,
            });
        }

        None
    }

    fn match_target(&self, message: &str, tokens: &[String]) -> Option<Command> {
        let hit = self.targets.iter().find(|t| message.contains(&t.name)).or_else(|| {
            self.targets
                .iter()
                .find(|t| t.words.iter().all(|w| tokens.contains(w)))
        })?;

        let target = &self.table.targets[hit.index];
        Some(
            Command::new(CommandKind::SwitchTarget, format!("User requested {}", target.name))
                .with_target(target.value()),
        )
    }

    fn match_phrase(&self, message: &str) -> Option<Command> {
        let noun = &self.table.noun;
        let rule = self
            .table
            .phrases
            .iter()
            .find(|r| r.phrases.iter().any(|p| contains(message, p)))?;

        let command = match rule.kind {
            CommandKind::QueryCurrent => {
                Command::new(rule.kind, format!("User asked about current {}", noun))
            }
            CommandKind::Suggest => {
                Command::new(rule.kind, format!("User wants {} suggestions", noun))
            }
            CommandKind::ShowAll => Command::new(rule.kind, format!("Showing all {}s", noun))
                .with_payload(self.table.target_values()),
            kind => Command::new(kind, format!("User mentioned a {} phrase", noun)),
        };

        Some(command)
    }

    fn match_alias(&self, tokens: &[String]) -> Option<Command> {
        let alias = self
            .aliases
            .iter()
            .find(|a| tokens.windows(a.tokens.len()).any(|w| w == a.tokens.as_slice()))?;

        let name = self.table.display_name(&alias.target);
        Some(
            Command::new(
                CommandKind::SwitchTarget,
                format!("User requested {} via alias", name),
            )
            .with_target(alias.target.clone()),
        )
    }
}

/// Case-insensitive substring test against an already-lowercased message.
fn contains(message: &str, needle: &str) -> bool {
    !needle.is_empty() && message.contains(needle.to_lowercase().as_str())
}

/// Lowercase alphanumeric runs. Apostrophes are dropped so "what's" stays one token.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\'', '\u{2019}'], "")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
