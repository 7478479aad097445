//! Message sentiment classification.
//!
//! Word lists are matched as case-insensitive substrings. Precedence:
//!
//! 1. insults and rude words: -8
//! 2. aggressive words: -12, checked even when an insult already matched
//!    and overriding it
//! 3. dismissive words: -4, only if nothing above matched
//! 4. compliments +3, emotional +4, flirty +3, first group that hits
//! 5. otherwise +2

use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Sentiment Result
// ─────────────────────────────────────────────────────────────────

/// Why a message moved the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentReason {
    InsultingLanguage,
    AggressiveBehavior,
    DismissiveAttitude,
    Compliment,
    EmotionalConnection,
    Flirting,
    NormalInteraction,
}

impl SentimentReason {
    /// Label used in audit descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            SentimentReason::InsultingLanguage => "insulting language",
            SentimentReason::AggressiveBehavior => "aggressive behavior",
            SentimentReason::DismissiveAttitude => "dismissive attitude",
            SentimentReason::Compliment => "compliment",
            SentimentReason::EmotionalConnection => "emotional connection",
            SentimentReason::Flirting => "flirting",
            SentimentReason::NormalInteraction => "normal interaction",
        }
    }

    /// Fixed score delta for this reason.
    pub fn delta(&self) -> i32 {
        match self {
            SentimentReason::InsultingLanguage => -8,
            SentimentReason::AggressiveBehavior => -12,
            SentimentReason::DismissiveAttitude => -4,
            SentimentReason::Compliment => 3,
            SentimentReason::EmotionalConnection => 4,
            SentimentReason::Flirting => 3,
            SentimentReason::NormalInteraction => 2,
        }
    }
}

impl fmt::Display for SentimentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Exactly one delta and one reason per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub delta: i32,
    pub reason: SentimentReason,
}

impl From<SentimentReason> for Sentiment {
    fn from(reason: SentimentReason) -> Self {
        Self {
            delta: reason.delta(),
            reason,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Lexicon
// ─────────────────────────────────────────────────────────────────

/// Word lists used by [`SentimentLexicon::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentLexicon {
    pub insults: Vec<String>,
    pub rude: Vec<String>,
    pub dismissive: Vec<String>,
    pub aggressive: Vec<String>,
    pub compliments: Vec<String>,
    pub emotional: Vec<String>,
    pub flirty: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            insults: words(&[
                "stupid", "idiot", "dumb", "hate you", "ugly", "worthless", "pathetic", "loser",
                "shut up", "go away",
            ]),
            rude: words(&[
                "fuck you", "fuck off", "bitch", "asshole", "dick", "shit", "damn you",
            ]),
            dismissive: words(&[
                "whatever", "dont care", "don't care", "boring", "leave me alone", "stop talking",
            ]),
            aggressive: words(&["kill", "die", "hurt you", "punch", "slap", "beat"]),
            compliments: words(&[
                "beautiful", "amazing", "wonderful", "love you", "miss you", "care about you",
                "special", "perfect",
            ]),
            emotional: words(&[
                "lonely", "need you", "thinking about you", "dream about", "mean everything",
                "make me happy",
            ]),
            flirty: words(&[
                "attractive", "cute", "handsome", "gorgeous", "sexy", "hot", "kiss", "hold you",
            ]),
        }
    }
}

impl SentimentLexicon {
    /// Classify a message. Pure and deterministic.
    pub fn classify(&self, message: &str) -> Sentiment {
        let message = message.to_lowercase();
        let hit = |list: &[String]| list.iter().any(|w| !w.is_empty() && message.contains(w.as_str()));

        let mut reason = None;

        if hit(&self.insults) || hit(&self.rude) {
            reason = Some(SentimentReason::InsultingLanguage);
        }

        // Not guarded by the insult check: aggression replaces an insult
        if hit(&self.aggressive) {
            reason = Some(SentimentReason::AggressiveBehavior);
        }

        if reason.is_none() && hit(&self.dismissive) {
            reason = Some(SentimentReason::DismissiveAttitude);
        }

        if reason.is_none() {
            reason = [
                (&self.compliments, SentimentReason::Compliment),
                (&self.emotional, SentimentReason::EmotionalConnection),
                (&self.flirty, SentimentReason::Flirting),
            ]
            .into_iter()
            .find(|(list, _)| hit(list.as_slice()))
            .map(|(_, r)| r);
        }

        reason.unwrap_or(SentimentReason::NormalInteraction).into()
    }
}

/// Lowercased owned copies.
fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_lowercase()).collect()
}
