//! Core data model types for pairdrill.
//!
//! A deck is an ordered list of A-B pairs plus where it was loaded from.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Deck id used for the built-in sample deck.
pub const BUILTIN_DECK_ID: &str = "builtin";

/// One side of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    A,
    B,
}

impl Field {
    /// The opposite side.
    pub fn other(self) -> Field {
        match self {
            Field::A => Field::B,
            Field::B => Field::A,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::A => write!(f, "A"),
            Field::B => write!(f, "B"),
        }
    }
}

/// Which side is asked and which side is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "a2b")]
    AToB,
    #[serde(rename = "b2a")]
    BToA,
    /// Pick a side per question.
    #[default]
    #[serde(rename = "random")]
    Random,
}

impl Direction {
    /// Resolve to a concrete `(question_field, answer_field)`.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> (Field, Field) {
        let question = match self {
            Direction::AToB => Field::A,
            Direction::BToA => Field::B,
            Direction::Random => {
                if rng.random_bool(0.5) {
                    Field::A
                } else {
                    Field::B
                }
            }
        };
        (question, question.other())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::AToB => write!(f, "a2b"),
            Direction::BToA => write!(f, "b2a"),
            Direction::Random => write!(f, "random"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a2b" | "a->b" | "ab" => Ok(Direction::AToB),
            "b2a" | "b->a" | "ba" => Ok(Direction::BToA),
            "random" | "mixed" => Ok(Direction::Random),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Which quiz mode produced a mistake.
///
/// The aliases accept mistake books written by the older script trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizMode {
    #[default]
    #[serde(alias = "mcq")]
    Choice,
    Fill,
    #[serde(alias = "tf-new")]
    TrueFalse,
    #[serde(alias = "tf-wb")]
    Review,
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Choice => write!(f, "choice"),
            QuizMode::Fill => write!(f, "fill"),
            QuizMode::TrueFalse => write!(f, "true-false"),
            QuizMode::Review => write!(f, "review"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "choice" | "mcq" => Ok(QuizMode::Choice),
            "fill" => Ok(QuizMode::Fill),
            "true-false" | "tf" => Ok(QuizMode::TrueFalse),
            "review" => Ok(QuizMode::Review),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// One row's two corresponding values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub a: String,
    pub b: String,
}

impl Pair {
    /// Build a pair from raw cells; `None` when either side is blank.
    pub fn new(a: &str, b: &str) -> Option<Self> {
        let a = a.trim();
        let b = b.trim();
        if a.is_empty() || b.is_empty() {
            return None;
        }
        Some(Self {
            a: a.to_string(),
            b: b.to_string(),
        })
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::A => &self.a,
            Field::B => &self.b,
        }
    }
}

/// Where a deck came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckSource {
    /// Source file; `None` for the built-in deck.
    pub path: Option<PathBuf>,
    /// Zero-based index of the A column.
    pub column_a: usize,
    /// Zero-based index of the B column.
    pub column_b: usize,
    /// Whether the first row was treated as a header.
    pub has_header: bool,
    /// Worksheet name for workbooks.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// An ordered, deduplicated collection of pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub pairs: Vec<Pair>,
    pub source: DeckSource,
}

impl Deck {
    /// Build a deck from raw rows.
    ///
    /// Rows with a blank side are skipped and exact duplicates (after
    /// trimming) keep only their first occurrence.
    pub fn from_rows<I, S>(rows: I, source: DeckSource) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for (a, b) in rows {
            let Some(pair) = Pair::new(a.as_ref(), b.as_ref()) else {
                tracing::debug!("skipping row with blank side");
                continue;
            };
            if seen.insert(pair.clone()) {
                pairs.push(pair);
            }
        }
        Self { pairs, source }
    }

    /// The two-pair sample deck used when nothing else is available.
    pub fn builtin() -> Self {
        Self::from_rows(
            [("bonjour", "你好"), ("merci", "谢谢")],
            DeckSource {
                column_b: 1,
                ..Default::default()
            },
        )
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Pair> {
        self.pairs.get(index)
    }

    /// All values of one side, in deck order.
    pub fn answers(&self, field: Field) -> Vec<&str> {
        self.pairs.iter().map(|p| p.get(field)).collect()
    }

    /// Stable identifier naming this deck's mistake book.
    pub fn id(&self) -> String {
        match &self.source.path {
            Some(path) => deck_id(path),
            None => BUILTIN_DECK_ID.to_string(),
        }
    }

    /// Human-readable source label.
    pub fn label(&self) -> String {
        match &self.source.path {
            Some(path) => path.display().to_string(),
            None => "<built-in sample>".to_string(),
        }
    }
}

/// Stable id for a deck file: md5 of its absolute path, first 16 hex digits.
pub fn deck_id(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let digest = md5::compute(absolute.to_string_lossy().as_bytes());
    format!("{digest:x}")[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rows(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn from_rows_trims_skips_blank_and_dedups() {
        let deck = Deck::from_rows(
            rows(&[
                (" cat ", "猫"),
                ("cat", "猫 "),
                ("", "orphan"),
                ("dog", "   "),
                ("dog", "狗"),
                ("Cat", "猫"),
            ]),
            DeckSource::default(),
        );
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.pairs[0], Pair::new("cat", "猫").unwrap());
        assert_eq!(deck.pairs[1].a, "dog");
        // Case differs, so this is a distinct pair.
        assert_eq!(deck.pairs[2].a, "Cat");
    }

    #[test]
    fn dedup_is_idempotent() {
        let once = Deck::from_rows(
            rows(&[("a", "1"), ("b", "2"), ("a", "1"), ("c", "3"), ("b", "2")]),
            DeckSource::default(),
        );
        let twice = Deck::from_rows(
            once.pairs.iter().map(|p| (p.a.clone(), p.b.clone())),
            DeckSource::default(),
        );
        assert_eq!(once.pairs, twice.pairs);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn direction_resolves_to_opposite_fields() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Direction::AToB.resolve(&mut rng), (Field::A, Field::B));
        assert_eq!(Direction::BToA.resolve(&mut rng), (Field::B, Field::A));
        for _ in 0..20 {
            let (q, a) = Direction::Random.resolve(&mut rng);
            assert_eq!(q.other(), a);
        }
    }

    #[test]
    fn direction_parse() {
        assert_eq!("A2B".parse::<Direction>().unwrap(), Direction::AToB);
        assert_eq!("b->a".parse::<Direction>().unwrap(), Direction::BToA);
        assert_eq!("random".parse::<Direction>().unwrap(), Direction::Random);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_serde_names_match_display() {
        for direction in [Direction::AToB, Direction::BToA, Direction::Random] {
            let json = serde_json::to_string(&direction).unwrap();
            assert_eq!(json, format!("\"{direction}\""));
            assert_eq!(serde_json::from_str::<Direction>(&json).unwrap(), direction);
        }
    }

    #[test]
    fn quiz_mode_accepts_legacy_names() {
        assert_eq!("tf".parse::<QuizMode>().unwrap(), QuizMode::TrueFalse);
        assert_eq!("MCQ".parse::<QuizMode>().unwrap(), QuizMode::Choice);
        let mode: QuizMode = serde_json::from_str("\"tf-wb\"").unwrap();
        assert_eq!(mode, QuizMode::Review);
        assert_eq!(serde_json::to_string(&QuizMode::TrueFalse).unwrap(), "\"true-false\"");
    }

    #[test]
    fn deck_id_is_stable_and_path_sensitive() {
        let first = deck_id(Path::new("/tmp/words.csv"));
        assert_eq!(first, deck_id(Path::new("/tmp/words.csv")));
        assert_eq!(first.len(), 16);
        assert_ne!(first, deck_id(Path::new("/tmp/other.csv")));
    }

    #[test]
    fn builtin_deck_has_builtin_id() {
        let deck = Deck::builtin();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.id(), BUILTIN_DECK_ID);
        assert_eq!(deck.answers(Field::A), vec!["bonjour", "merci"]);
    }
}
