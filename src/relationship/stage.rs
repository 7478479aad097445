//! Relationship stages, a pure function of the score.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Highest possible relationship score.
pub const MAX_SCORE: u8 = 100;

/// Relationship stage derived from a score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// 0–10
    Stranger,
    /// 11–25
    Acquaintance,
    /// 26–45
    Friend,
    /// 46–65
    CloseFriend,
    /// 66–85
    RomanticInterest,
    /// 86–100
    Partner,
}

impl Stage {
    /// Stage for a score. Scores above 100 are treated as 100.
    pub fn for_score(score: u8) -> Stage {
        match score {
            0..=10 => Stage::Stranger,
            11..=25 => Stage::Acquaintance,
            26..=45 => Stage::Friend,
            46..=65 => Stage::CloseFriend,
            66..=85 => Stage::RomanticInterest,
            _ => Stage::Partner,
        }
    }

    /// Inclusive score range covered by this stage.
    pub fn range(&self) -> RangeInclusive<u8> {
        match self {
            Stage::Stranger => 0..=10,
            Stage::Acquaintance => 11..=25,
            Stage::Friend => 26..=45,
            Stage::CloseFriend => 46..=65,
            Stage::RomanticInterest => 66..=85,
            Stage::Partner => 86..=MAX_SCORE,
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::Stranger => "Stranger",
            Stage::Acquaintance => "Acquaintance",
            Stage::Friend => "Friend",
            Stage::CloseFriend => "Close Friend",
            Stage::RomanticInterest => "Romantic Interest",
            Stage::Partner => "Partner",
        }
    }

    /// All stages in ascending order.
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Stranger,
            Stage::Acquaintance,
            Stage::Friend,
            Stage::CloseFriend,
            Stage::RomanticInterest,
            Stage::Partner,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_table_has_no_gaps_or_overlaps() {
        for score in 0..=MAX_SCORE {
            let covering: Vec<&Stage> = Stage::all()
                .iter()
                .filter(|s| s.range().contains(&score))
                .collect();
            assert_eq!(covering.len(), 1, "score {} covered {} times", score, covering.len());
            assert_eq!(*covering[0], Stage::for_score(score));
        }
    }

    #[test]
    fn test_stage_boundaries() {
        assert_eq!(Stage::for_score(0), Stage::Stranger);
        assert_eq!(Stage::for_score(10), Stage::Stranger);
        assert_eq!(Stage::for_score(11), Stage::Acquaintance);
        assert_eq!(Stage::for_score(25), Stage::Acquaintance);
        assert_eq!(Stage::for_score(26), Stage::Friend);
        assert_eq!(Stage::for_score(45), Stage::Friend);
        assert_eq!(Stage::for_score(46), Stage::CloseFriend);
        assert_eq!(Stage::for_score(65), Stage::CloseFriend);
        assert_eq!(Stage::for_score(66), Stage::RomanticInterest);
        assert_eq!(Stage::for_score(85), Stage::RomanticInterest);
        assert_eq!(Stage::for_score(86), Stage::Partner);
        assert_eq!(Stage::for_score(100), Stage::Partner);
    }

    #[test]
    fn test_stages_are_ordered() {
        let all = Stage::all();
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Stage::CloseFriend).unwrap(),
            "\"close_friend\""
        );
        assert_eq!(Stage::RomanticInterest.to_string(), "Romantic Interest");
    }
}
