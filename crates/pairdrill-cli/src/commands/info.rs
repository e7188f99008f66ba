//! The `pairdrill info` command.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::console::{self, Console};
use crate::context::{DeckArgs, Trainer};

pub fn execute(deck: DeckArgs) -> Result<()> {
    let trainer = Trainer::open(&deck)?;
    run(&trainer, &mut console::stdio())
}

pub fn run<R: BufRead, W: Write>(trainer: &Trainer, console: &mut Console<R, W>) -> Result<()> {
    console.say(format!("Deck: {}", trainer.deck.label()))?;
    console.say(format!("Items: {}", trainer.deck.len()))?;
    console.say(format!("Mistake book: {}", trainer.book.path().display()))?;
    console.say(format!(
        "Active mistakes: {} ({} entries)",
        trainer.book.active_count(),
        trainer.book.len()
    ))?;
    console.blank()?;
    console.say("Tips:")?;
    console.say("  - Choice and true/false questions need at least 2 items.")?;
    console.say("  - Separate alternative answers with | in one cell, e.g. bonjour|salut")
}
