//! Listed items and their condition grades.
use chrono::{DateTime, Local};
use std::fmt;

/// Condition grade of a second-hand item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Brand new.
    New,
    /// Opened but unused.
    LikeNew,
    /// Light signs of use.
    VeryGood,
    /// Normal signs of use.
    Good,
    /// Heavy signs of use, fully functional.
    Acceptable,
    /// Defective, sold for parts.
    ForParts,
}

impl Condition {
    /// All condition grades, best first.
    pub const ALL: [Condition; 6] = [
        Condition::New,
        Condition::LikeNew,
        Condition::VeryGood,
        Condition::Good,
        Condition::Acceptable,
        Condition::ForParts,
    ];

    /// Numeric condition score in `[0, 1]`.
    pub fn score(&self) -> f64 {
        match self {
            Condition::New => 1.0,
            Condition::LikeNew => 0.9,
            Condition::VeryGood => 0.8,
            Condition::Good => 0.6,
            Condition::Acceptable => 0.4,
            Condition::ForParts => 0.1,
        }
    }

    /// Parses a free-form listing condition string.
    ///
    /// Matching is ordered from the most specific phrase to the least, so
    /// that e.g. "like new" is not swallowed by "new".
    pub fn parse(s: &str) -> Option<Condition> {
        let s = s.to_lowercase();
        if s.contains("like new") {
            Some(Condition::LikeNew)
        } else if s.contains("very good") {
            Some(Condition::VeryGood)
        } else if s.contains("for parts") || s.contains("not working") {
            Some(Condition::ForParts)
        } else if s.contains("good") {
            Some(Condition::Good)
        } else if s.contains("acceptable") {
            Some(Condition::Acceptable)
        } else if s.contains("new") {
            Some(Condition::New)
        } else {
            None
        }
    }

    /// Condition score of a free-form listing string; unrecognized text
    /// scores a neutral 0.5.
    pub fn score_from_listing(s: &str) -> f64 {
        Self::parse(s).map(|c| c.score()).unwrap_or(0.5)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Condition::New => "New",
            Condition::LikeNew => "Like New",
            Condition::VeryGood => "Very Good",
            Condition::Good => "Good",
            Condition::Acceptable => "Acceptable",
            Condition::ForParts => "For parts or not working",
        };
        write!(f, "{}", s)
    }
}

/// A single listed item.
///
/// The item is owned exclusively by the active episode: it is replaced on
/// every reset, and only the price is mutated while the episode runs.
#[derive(Debug, Clone)]
pub struct Item {
    /// Listing identifier.
    pub id: String,

    /// Listing title. Synthesized titles are non-semantic.
    pub title: String,

    /// Condition grade.
    pub condition: Condition,

    /// Current listing price. Always positive.
    pub price: f64,

    /// Marketplace category id.
    pub category_id: String,

    /// When the item was listed.
    pub listed_at: DateTime<Local>,

    /// When the listing data was collected.
    pub collected_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::Condition;

    #[test]
    fn scores_match_grading() {
        let scores: Vec<f64> = Condition::ALL.iter().map(|c| c.score()).collect();
        assert_eq!(scores, vec![1.0, 0.9, 0.8, 0.6, 0.4, 0.1]);
    }

    #[test]
    fn parses_listing_strings() {
        assert_eq!(Condition::parse("New"), Some(Condition::New));
        assert_eq!(Condition::parse("Like New"), Some(Condition::LikeNew));
        assert_eq!(Condition::parse("very good condition"), Some(Condition::VeryGood));
        assert_eq!(
            Condition::parse("For parts or not working"),
            Some(Condition::ForParts)
        );
        assert_eq!(Condition::parse("unknown grade"), None);
        assert_eq!(Condition::score_from_listing("unknown grade"), 0.5);
    }

    #[test]
    fn round_trips_display() {
        for c in Condition::ALL.iter() {
            assert_eq!(Condition::parse(&c.to_string()), Some(*c));
        }
    }
}
