//! Per-run score tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::QuizMode;

/// Running tally of answered questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub total: u32,
    pub correct: u32,
}

impl Scoreboard {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    pub fn wrong(&self) -> u32 {
        self.total - self.correct
    }

    /// Fraction correct, or `None` before the first answer.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accuracy() {
            Some(acc) => write!(f, "{}/{} ({:.1}%)", self.correct, self.total, acc * 100.0),
            None => write!(f, "-"),
        }
    }
}

/// What one quiz or review run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: QuizMode,
    pub deck: String,
    pub score: Scoreboard,
    /// Mistakes recorded during the run (including merged ones).
    pub new_mistakes: u32,
}

impl SessionSummary {
    pub fn new(mode: QuizMode, deck: impl Into<String>) -> Self {
        Self {
            mode,
            deck: deck.into(),
            score: Scoreboard::default(),
            new_mistakes: 0,
        }
    }

    pub fn answered(&self) -> u32 {
        self.score.total
    }

    pub fn correct(&self) -> u32 {
        self.score.correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scoreboard_displays_dash() {
        let board = Scoreboard::default();
        assert_eq!(board.accuracy(), None);
        assert_eq!(board.to_string(), "-");
    }

    #[test]
    fn scoreboard_display() {
        let mut board = Scoreboard::default();
        for correct in [true, true, false, true] {
            board.record(correct);
        }
        assert_eq!(board.wrong(), 1);
        assert_eq!(board.to_string(), "3/4 (75.0%)");
    }

    #[test]
    fn summary_tracks_score() {
        let mut summary = SessionSummary::new(QuizMode::Fill, "dict.csv");
        summary.score.record(false);
        summary.new_mistakes += 1;
        assert_eq!(summary.answered(), 1);
        assert_eq!(summary.correct(), 0);
    }
}
