//! Switchboard - persona routing and relationship scoring
//!
//! This is the main entry point for the switchboard binary.

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

use switchboard::cli::{Cli, Commands, ConfigSubcommand, DetectTable};
use switchboard::config::{self, LoggingSettings, SwitchboardConfig};
use switchboard::control::{ControlPlane, InboundMessage};
use switchboard::error::{Error, Result};
use switchboard::logging::{self, LogGuards};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Config commands must work even when the configuration is broken
    if let Commands::Config { ref subcommand } = cli.command {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            ..Default::default()
        };
        let _log_guards = logging::init_logging(&settings, cli.verbose, cli.quiet)?;
        return handle_config_command(subcommand.clone(), cli.config.as_deref());
    }

    let config = SwitchboardConfig::load(cli.config.as_deref())?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = init_logging_from_config(&config, cli.verbose, cli.quiet)?;

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %config.storage.backend,
        "Starting switchboard"
    );

    let plane = ControlPlane::from_config(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create runtime: {}", e)))?;

    match cli.command {
        Commands::Personas { json } => list_personas(&plane, json),
        Commands::Route { message, persona } => route_message(&plane, &message, persona.as_deref()),
        Commands::Detect { message, table } => detect_command(&plane, &message, table),
        Commands::Chat {
            user,
            persona,
            message,
        } => runtime.block_on(chat(&plane, user, persona, message)),
        Commands::Status { user, history } => runtime.block_on(show_status(&plane, &user, history)),
        Commands::Config { .. } => {
            // Already handled above
            unreachable!();
        }
    }
}

/// Initialize logging from configuration
fn init_logging_from_config(config: &SwitchboardConfig, verbose: u8, quiet: bool) -> Result<LogGuards> {
    logging::init_logging(&config.logging, verbose, quiet)
}

/// Print the persona catalog
fn list_personas(plane: &ControlPlane, json: bool) -> Result<()> {
    let personas = plane.catalog().personas();

    if json {
        println!("{}", serde_json::to_string_pretty(personas)?);
        return Ok(());
    }

    println!("{:<6} {:<20} {:<26} {:<12} REDIRECT", "ID", "NAME", "TITLE", "DEPARTMENT");
    for persona in personas {
        println!(
            "{:<6} {:<20} {:<26} {:<12} {}",
            persona.id, persona.name, persona.title, persona.department, persona.redirect_target
        );
    }
    Ok(())
}

/// Print the routing decision for a message
fn route_message(plane: &ControlPlane, message: &str, persona: Option<&str>) -> Result<()> {
    let decision = plane.router().route(message, persona);
    let chosen = plane.catalog().require(&decision.persona_id)?;

    println!("Persona:  {} ({}, {})", chosen.id, chosen.name, chosen.title);
    println!("Reason:   {}", decision.reason);
    if let Some(ref hint) = decision.redirect_hint {
        println!("Referral: {}", hint);
    }
    Ok(())
}

/// Print the command detected in a message
fn detect_command(plane: &ControlPlane, message: &str, table: DetectTable) -> Result<()> {
    let matcher = match table {
        DetectTable::Theme => plane.themes(),
        DetectTable::Intent => plane.intents(),
    };

    match matcher.detect(message) {
        Some(command) => println!("{}", serde_json::to_string_pretty(&command)?),
        None => println!("No command detected"),
    }
    Ok(())
}

/// Process one chat message and print the turn
async fn chat(plane: &ControlPlane, user: String, persona: Option<String>, text: String) -> Result<()> {
    let message = InboundMessage {
        user_id: user,
        text,
        persona,
    };
    let turn = plane.handle(&message, Utc::now()).await;
    println!("{}", serde_json::to_string_pretty(&turn)?);
    Ok(())
}

/// Print a user's relationships
async fn show_status(plane: &ControlPlane, user: &str, history: bool) -> Result<()> {
    let engine = plane.relationships();
    let status = engine.status(user, Utc::now()).await?;

    if status.is_empty() {
        println!("No relationships recorded for {}", user);
    } else {
        println!("{:<6} {:>5}  {:<18} {:>8} {:>9}", "PERSONA", "SCORE", "STAGE", "MESSAGES", "IDLE DAYS");
        for line in &status {
            println!(
                "{:<6} {:>5}  {:<18} {:>8} {:>9}",
                line.persona_id,
                line.score,
                line.stage.display_name(),
                line.interaction_count,
                line.days_inactive
            );
        }
    }

    if history {
        let events = engine.history(user).await?;
        info!(user = %user, events = events.len(), "Audit trail loaded");
        println!();
        for event in events {
            println!(
                "{}  {:<4} {}",
                event.recorded_at.format("%Y-%m-%d %H:%M"),
                event.persona_id,
                event.description
            );
        }
    }
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = SwitchboardConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate => {
            SwitchboardConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
