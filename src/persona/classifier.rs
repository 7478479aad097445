//! Domain classifier: does a message fall inside a persona's domain?

use tracing::warn;

use super::types::Persona;

/// True iff any of the persona's domain keywords occurs in the message
/// (case-insensitive substring).
///
/// Forbidden keywords never flip the result. When no domain keyword matched
/// and a forbidden one did, a rejection notice is logged.
pub fn is_in_domain(persona: &Persona, message: &str) -> bool {
    let message = message.to_lowercase();

    if matched_keyword(&persona.keywords, &message).is_some() {
        return true;
    }

    if let Some(forbidden) = matched_keyword(&persona.forbidden, &message) {
        warn!(
            persona = %persona.id,
            topic = %forbidden,
            "Out-of-domain query rejected"
        );
    }

    false
}

/// First keyword (in list order) contained in an already-lowercased message.
fn matched_keyword<'a>(keywords: &'a [String], message: &str) -> Option<&'a str> {
    keywords
        .iter()
        .map(String::as_str)
        .find(|k| !k.is_empty() && message.contains(k.to_lowercase().as_str()))
}
