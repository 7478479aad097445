//! Command/intent detection with a generic first-match-wins rule matcher.
//!
//! The same matcher runs over two tables: theme switching (bundled TOML)
//! and persona hinting (derived from the persona catalog).

pub mod matcher;
pub mod table;
pub mod types;

pub use matcher::TextCommandMatcher;
pub use table::{Alias, CompoundRule, Group, PhraseRule, RuleTable, Target};
pub use types::{Command, CommandKind};
