//! Deck and quiz error types.
//!
//! Loaders return `anyhow::Result` with file context attached; these enums are
//! the root causes the CLI downcasts to decide between "show and retry" and
//! "show and bail".

use thiserror::Error;

/// Errors raised while turning a file into a deck.
#[derive(Debug, Error)]
pub enum DeckError {
    /// The file extension is not one we can read.
    #[error("unsupported file type: {0} (expected .csv/.tsv/.txt/.json/.xlsx/.xlsm/.docx)")]
    UnsupportedFormat(String),

    /// Delimited text that is neither UTF-8 nor GB18030.
    #[error("cannot decode {0}: expected UTF-8 or GB18030/GBK text")]
    UnknownEncoding(String),

    /// The file parsed but produced no row with both A and B filled.
    #[error("no valid A-B rows found (both columns must be non-empty)")]
    EmptyDeck,

    /// The requested column does not exist in any row.
    #[error("column {column} not found (table has at most {width} columns)")]
    MissingColumn { column: usize, width: usize },

    /// The requested worksheet does not exist.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// A worksheet cell reference that is malformed or past the last column.
    #[error("invalid cell reference: {0}")]
    BadCellReference(String),

    /// A word-processor document without any table.
    #[error("no table found in document")]
    NoTable,
}

/// Errors raised while building questions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// The mode needs more items than the deck holds.
    #[error("deck too small: this mode needs at least {needed} items, found {found}")]
    NotEnoughItems { needed: usize, found: usize },

    /// The candidate pool is empty (e.g. wrong-only practice with no mistakes).
    #[error("no questions available")]
    NoCandidates,
}

impl QuizError {
    /// Returns `true` if retrying with the same deck cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, QuizError::NotEnoughItems { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = DeckError::UnsupportedFormat(".pdf".into());
        assert!(e.to_string().contains(".pdf"));

        let e = QuizError::NotEnoughItems {
            needed: 2,
            found: 1,
        };
        assert!(e.to_string().contains("at least 2"));
        assert!(e.is_permanent());
        assert!(!QuizError::NoCandidates.is_permanent());
    }
}
