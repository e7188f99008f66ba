//! The `pairdrill flash` command.

use std::io::{BufRead, Write};

use anyhow::Result;

use pairdrill_core::quiz::Flashcards;

use crate::console::{self, is_exit, Console};
use crate::context::{DeckArgs, Trainer};

const KEYS: &str = "[d/Enter] next  [a] previous  [s] shuffle on/off  [x] back > ";

pub fn execute(deck: DeckArgs) -> Result<()> {
    let mut trainer = Trainer::open(&deck)?;
    run(&mut trainer, &mut console::stdio())
}

pub fn run<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
) -> Result<()> {
    let mut cards = Flashcards::new(&trainer.deck);

    loop {
        let Some((index, position, total)) = cards.current() else {
            return console.say("The deck is empty.");
        };
        let pair = &trainer.deck.pairs[index];
        let order = if cards.is_shuffled() {
            "shuffled"
        } else {
            "in order"
        };

        console.blank()?;
        console.say(format!("Card {position}/{total} ({order}), item #{}", index + 1))?;
        console.say(format!("  A: {}", pair.a))?;
        console.say(format!("  B: {}", pair.b))?;

        let Some(key) = console.read_line(KEYS)? else {
            return Ok(());
        };
        match key.trim().to_lowercase().as_str() {
            "" | "d" => cards.next(),
            "a" => cards.prev(),
            "s" => cards.toggle_shuffle(&mut trainer.rng),
            k if is_exit(k) => return Ok(()),
            other => console.say(format!("Unknown key: {other}"))?,
        }
    }
}
