//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for Switchboard.

use clap::{Parser, Subcommand, ValueEnum};

/// Switchboard - persona routing and relationship scoring for chat assistants
///
/// Routes messages to domain-bounded personas, keeps a per-user relationship
/// score for each persona, and detects theme and intent commands in free text.
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "SWITCHBOARD_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which rule table `detect` runs
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectTable {
    /// Theme and mode switching
    Theme,
    /// Persona hinting
    Intent,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the personas in the catalog
    Personas {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which persona a message would be routed to
    Route {
        /// Message text
        message: String,

        /// Requested persona id
        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Detect a command in a message
    Detect {
        /// Message text
        message: String,

        /// Rule table to use
        #[arg(short, long, value_enum, default_value_t = DetectTable::Theme)]
        table: DetectTable,
    },

    /// Process a chat message and print the resulting turn as JSON
    Chat {
        /// User id
        #[arg(short, long, env = "SWITCHBOARD_USER")]
        user: String,

        /// Requested persona id
        #[arg(short, long)]
        persona: Option<String>,

        /// Message text
        message: String,
    },

    /// Show a user's relationships, highest score first
    Status {
        /// User id
        #[arg(short, long, env = "SWITCHBOARD_USER")]
        user: String,

        /// Also print the audit trail
        #[arg(long)]
        history: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Verifies that the CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_route_command() {
        let cli = Cli::parse_from(["switchboard", "route", "our cloud costs", "--persona", "cto"]);
        match cli.command {
            Commands::Route { message, persona } => {
                assert_eq!(message, "our cloud costs");
                assert_eq!(persona.as_deref(), Some("cto"));
            }
            _ => panic!("Expected Route command"),
        }
    }

    #[test]
    fn test_detect_default_table() {
        let cli = Cli::parse_from(["switchboard", "detect", "dark mode please"]);
        match cli.command {
            Commands::Detect { table, .. } => assert_eq!(table, DetectTable::Theme),
            _ => panic!("Expected Detect command"),
        }
    }

    #[test]
    fn test_detect_intent_table() {
        let cli = Cli::parse_from(["switchboard", "detect", "--table", "intent", "debug this"]);
        match cli.command {
            Commands::Detect { table, message } => {
                assert_eq!(table, DetectTable::Intent);
                assert_eq!(message, "debug this");
            }
            _ => panic!("Expected Detect command"),
        }
    }

    #[test]
    fn test_chat_command() {
        let cli = Cli::parse_from(["switchboard", "chat", "--user", "alice", "hello"]);
        match cli.command {
            Commands::Chat { user, persona, message } => {
                assert_eq!(user, "alice");
                assert!(persona.is_none());
                assert_eq!(message, "hello");
            }
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["switchboard", "-vv", "--config", "/tmp/sb.toml", "personas"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("/tmp/sb.toml"));
        assert!(!cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["switchboard", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
