//! The `pairdrill mistakes` command.

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Cell, Table};

use crate::console::{self, Console};
use crate::context::{DeckArgs, Trainer};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum MistakesAction {
    /// List every entry with its weight
    List,
    /// Merge duplicate entries
    Dedup,
    /// Delete entries whose weight reached 0
    Purge,
    /// Delete every entry (cannot be undone)
    Clear,
}

pub fn execute(deck: DeckArgs, action: MistakesAction) -> Result<()> {
    let mut trainer = Trainer::open(&deck)?;
    let console = &mut console::stdio();
    match action {
        MistakesAction::List => list(&trainer, console),
        MistakesAction::Dedup => dedup(&mut trainer, console),
        MistakesAction::Purge => {
            let purged = trainer.book.purge_exhausted()?;
            console.say(format!("Removed {purged} mastered entries."))
        }
        MistakesAction::Clear => clear(&mut trainer, console),
    }
}

pub fn list<R: BufRead, W: Write>(trainer: &Trainer, console: &mut Console<R, W>) -> Result<()> {
    if trainer.book.is_empty() {
        return console.say("The mistake book is empty.");
    }

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Weight", "Question", "Correct", "Answered", "Mode", "Last seen",
    ]);
    for (n, e) in trainer.book.entries().iter().enumerate() {
        table.add_row(vec![
            Cell::new(n + 1),
            Cell::new(e.weight),
            Cell::new(format!("{}: {}", e.question_field, e.question_value)),
            Cell::new(format!("{}: {}", e.answer_field, e.correct_value)),
            Cell::new(&e.user_wrong),
            Cell::new(e.mode),
            Cell::new(e.last_seen.format("%Y-%m-%d %H:%M")),
        ]);
    }

    console.say(table)?;
    console.say(format!(
        "{} entries, {} active ({})",
        trainer.book.len(),
        trainer.book.active_count(),
        trainer.book.path().display()
    ))
}

pub fn dedup<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
) -> Result<()> {
    let before = trainer.book.len();
    trainer.book.dedup();
    trainer.book.save()?;
    console.say(format!(
        "Deduplicated: {before} -> {} entries",
        trainer.book.len()
    ))
}

pub fn clear<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
) -> Result<()> {
    trainer.book.clear()?;
    console.say("Mistake book cleared.")
}
