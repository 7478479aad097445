//! Persona system: the catalog of domain-bounded personas and the router
//! that assigns each message to one of them.
//!
//! Personas are immutable data built once at startup. The classifier and
//! router are pure functions over the catalog.

pub mod catalog;
pub mod classifier;
pub mod router;
pub mod types;

pub use catalog::PersonaCatalog;
pub use classifier::is_in_domain;
pub use router::{DomainRouter, RouteDecision};
pub use types::{Persona, RouteReason};
