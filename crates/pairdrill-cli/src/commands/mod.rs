pub mod flash;
pub mod info;
pub mod init;
pub mod menu;
pub mod mistakes;
pub mod preview;
pub mod quiz;
pub mod review;

use std::io::{BufRead, Write};

use anyhow::Result;

use pairdrill_core::error::QuizError;
use pairdrill_core::session::SessionSummary;

use crate::console::Console;

/// What an interactive question loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Quit,
}

/// End-of-run score table.
pub fn print_summary<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    summary: &SessionSummary,
) -> Result<()> {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Mode", "Deck", "Answered", "Score", "New mistakes"]);
    table.add_row(vec![
        Cell::new(summary.mode),
        Cell::new(&summary.deck),
        Cell::new(summary.answered()),
        Cell::new(summary.score),
        Cell::new(summary.new_mistakes),
    ]);

    console.blank()?;
    console.say(table)
}

/// Quiz errors that mean "this mode can't run on this deck" are shown and
/// swallowed; anything else propagates.
pub fn show_quiz_error<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    err: anyhow::Error,
) -> Result<()> {
    match err.downcast_ref::<QuizError>() {
        Some(quiz_err) => console.say(format!("{quiz_err}.")),
        None => Err(err),
    }
}
