//! Core types for the persona system.
//!
//! A persona is plain tagged data: an identity, a department label and the
//! keyword sets that bound its domain. Classification and routing are free
//! functions over this data (see `classifier` and `router`).

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// One domain-bounded conversational persona, deserialized from the catalog TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier (e.g. "cto").
    pub id: String,

    /// Display name.
    pub name: String,

    /// Role title (e.g. "Chief Technology Officer").
    pub title: String,

    /// Department or domain label, used by department lookup.
    pub department: String,

    /// Short human-readable description.
    #[serde(default)]
    pub description: String,

    /// Specialty labels shown in listings.
    #[serde(default)]
    pub specialties: Vec<String>,

    /// Ordered domain keywords. Any one occurring in a message puts it in-domain.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Ordered forbidden-domain keywords. Diagnostic only.
    #[serde(default)]
    pub forbidden: Vec<String>,

    /// Persona to refer the user to when this one rejects a request.
    pub redirect_target: String,
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.title)
    }
}

// ─────────────────────────────────────────────────────────────────
// Route Reason
// ─────────────────────────────────────────────────────────────────

/// Why the router picked the persona it picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RouteReason {
    /// The requested persona accepted the message.
    Requested,
    /// The requested persona rejected the message and another one matched.
    Redirected {
        /// Id of the rejected persona.
        from: String,
    },
    /// No persona was requested and one matched by domain.
    AutoDetected,
    /// Nothing matched; the catalog's first persona was used.
    Default,
}

impl fmt::Display for RouteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteReason::Requested => write!(f, "requested"),
            RouteReason::Redirected { from } => write!(f, "redirected from {}", from),
            RouteReason::AutoDetected => write!(f, "auto-detected"),
            RouteReason::Default => write!(f, "default"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
