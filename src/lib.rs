//! Switchboard library
//!
//! Persona routing, per-user relationship scoring and free-text command
//! detection for multi-persona chat assistants.

pub mod cli;
pub mod command;
pub mod config;
pub mod control;
pub mod error;
pub mod logging;
pub mod persona;
pub mod relationship;

pub use config::SwitchboardConfig;
pub use control::{ControlPlane, InboundMessage, Turn};
pub use error::{Error, ErrorCode, Result};
