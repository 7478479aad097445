//! Domain router: picks the persona that answers a message.
//!
//! Resolution order:
//! 1. The requested persona, if it accepts the message.
//! 2. The first persona in registration order that accepts the message.
//! 3. The catalog's first persona.
//!
//! There is no scoring. Ties go to registration order.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::catalog::PersonaCatalog;
use super::classifier::is_in_domain;
use super::types::{Persona, RouteReason};

/// Outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    /// Id of the persona that will answer.
    pub persona_id: String,

    /// Why it was chosen.
    pub reason: RouteReason,

    /// Id of the requested persona when it rejected the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,

    /// The rejected persona's configured referral target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_hint: Option<String>,
}

/// Routes messages over a shared catalog.
#[derive(Debug, Clone)]
pub struct DomainRouter {
    catalog: Arc<PersonaCatalog>,
}

impl DomainRouter {
    pub fn new(catalog: Arc<PersonaCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    /// Choose a persona for `message`, honoring `requested` when it is in-domain.
    ///
    /// An unknown requested id is treated the same as a rejected request.
    pub fn route(&self, message: &str, requested: Option<&str>) -> RouteDecision {
        let mut rejected: Option<&str> = None;
        let mut redirect_hint = None;

        if let Some(requested_id) = requested {
            match self.catalog.get(requested_id) {
                Some(persona) if is_in_domain(persona, message) => {
                    info!(persona = %persona.id, "Routing to requested persona");
                    return RouteDecision {
                        persona_id: persona.id.clone(),
                        reason: RouteReason::Requested,
                        rejected: None,
                        redirect_hint: None,
                    };
                }
                Some(persona) => {
                    rejected = Some(persona.id.as_str());
                    redirect_hint = Some(persona.redirect_target.clone());
                }
                None => {
                    debug!(requested = %requested_id, "Requested persona not in catalog");
                    rejected = Some(requested_id);
                }
            }
        }

        if let Some(persona) = self.first_in_domain(message) {
            let reason = match rejected {
                Some(from) => {
                    info!(from = %from, to = %persona.id, "Redirecting to in-domain persona");
                    RouteReason::Redirected {
                        from: from.to_string(),
                    }
                }
                None => {
                    info!(persona = %persona.id, "Auto-routing based on domain match");
                    RouteReason::AutoDetected
                }
            };
            return RouteDecision {
                persona_id: persona.id.clone(),
                reason,
                rejected: rejected.map(str::to_string),
                redirect_hint,
            };
        }

        let fallback = self.catalog.default_persona();
        info!(persona = %fallback.id, "No domain match, using default persona");
        RouteDecision {
            persona_id: fallback.id.clone(),
            reason: RouteReason::Default,
            rejected: rejected.map(str::to_string),
            redirect_hint,
        }
    }

    /// First persona in registration order whose domain covers the message.
    fn first_in_domain(&self, message: &str) -> Option<&Persona> {
        self.catalog
            .personas()
            .iter()
            .find(|p| is_in_domain(p, message))
    }
}
