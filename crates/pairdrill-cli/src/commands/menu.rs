//! The numbered main menu, the default when no subcommand is given.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use pairdrill_core::loader::{load_deck, LoadOptions};
use pairdrill_core::mistakes::book_file_name;
use pairdrill_core::model::QuizMode;

use super::quiz::QuizOptions;
use super::{flash, info, mistakes, quiz, review, show_quiz_error};
use crate::console::{self, is_exit, Console};
use crate::context::{parse_separator, DeckArgs, Trainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Load,
    Info,
    Flash,
    Choice,
    Fill,
    TrueFalse,
    Review,
    Dedup,
    Clear,
    Exit,
}

const MENU: &[(&str, Action)] = &[
    ("Load a deck", Action::Load),
    ("Deck info", Action::Info),
    ("Flashcards", Action::Flash),
    ("Multiple choice", Action::Choice),
    ("Fill in", Action::Fill),
    ("True / false", Action::TrueFalse),
    ("Review mistakes (weighted true/false)", Action::Review),
    ("Deduplicate mistake book", Action::Dedup),
    ("Clear mistake book (cannot be undone)", Action::Clear),
    ("Exit", Action::Exit),
];

pub fn execute(deck: DeckArgs) -> Result<()> {
    let mut trainer = Trainer::open(&deck)?;
    run(&mut trainer, &mut console::stdio())
}

pub fn run<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
) -> Result<()> {
    loop {
        console.blank()?;
        console.say("== pairdrill ==")?;
        for (i, (label, _)) in MENU.iter().enumerate() {
            console.say(format!("  {:>2}. {label}", i + 1))?;
        }
        console.say(format!(
            "Items: {}    Active mistakes: {}",
            trainer.deck.len(),
            trainer.book.active_count()
        ))?;

        let Some(line) = console.read_line(&format!("Choose 1-{} > ", MENU.len()))? else {
            return Ok(());
        };
        if is_exit(&line) {
            return Ok(());
        }
        let action = match line.trim().parse::<usize>() {
            Ok(n) if (1..=MENU.len()).contains(&n) => MENU[n - 1].1,
            _ => {
                console.say(format!("Enter a number from 1 to {}.", MENU.len()))?;
                continue;
            }
        };

        let result = match action {
            Action::Exit => return Ok(()),
            Action::Load => load(trainer, console),
            Action::Info => info::run(trainer, console),
            Action::Flash => flash::run(trainer, console),
            Action::Choice => quiz::run(trainer, console, &QuizOptions::new(QuizMode::Choice)),
            Action::Fill => quiz::run(trainer, console, &QuizOptions::new(QuizMode::Fill)),
            Action::TrueFalse => {
                quiz::run(trainer, console, &QuizOptions::new(QuizMode::TrueFalse))
            }
            Action::Review => review::run(trainer, console),
            Action::Dedup => mistakes::dedup(trainer, console),
            Action::Clear => mistakes::clear(trainer, console),
        };

        // Show and return to the menu.
        if let Err(e) = result.or_else(|e| show_quiz_error(console, e)) {
            console.say(format!("Error: {e:#}"))?;
        }
    }
}

/// Prompt for a deck path, start column and separator; keep the current
/// deck when loading fails.
fn load<R: BufRead, W: Write>(trainer: &mut Trainer, console: &mut Console<R, W>) -> Result<()> {
    let Some(path) = console.read_line("Deck file (.csv/.tsv/.json/.xlsx/.docx, x cancels) > ")?
    else {
        return Ok(());
    };
    let path = path.trim();
    if path.is_empty() || is_exit(path) {
        return Ok(());
    }

    let column = console
        .read_line("Start column (1 = first; B is the next one) [1] > ")?
        .unwrap_or_default();
    let column_a = column.trim().parse::<usize>().unwrap_or(1).max(1) - 1;

    let sep = console
        .read_line("Separator (blank = auto, \\t = tab) > ")?
        .unwrap_or_default();
    let delimiter = match sep.trim() {
        "" => None,
        s => match parse_separator(s) {
            Ok(d) => Some(d),
            Err(e) => return console.say(format!("Load failed: {e:#}")),
        },
    };

    let opts = LoadOptions {
        column_a,
        delimiter,
        ..Default::default()
    };
    let path = PathBuf::from(path);
    match load_deck(&path, &opts) {
        Ok(deck) => {
            let id = deck.id();
            let items = deck.len();
            trainer.switch_deck(deck);
            console.say(format!("Loaded {}", path.display()))?;
            console.say(format!("Items: {items}"))?;
            console.say(format!("Mistake book: {}", book_file_name(&id)))
        }
        Err(e) => {
            console.say(format!("Load failed: {e:#}"))?;
            console.say("Check the path, file type and column number.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairdrill_core::config::TrainerConfig;
    use pairdrill_core::model::Deck;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn play(trainer: &mut Trainer, input: &str) -> String {
        let mut console = Console::new(input.as_bytes(), Vec::new());
        run(trainer, &mut console).unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    fn trainer(dir: &tempfile::TempDir) -> Trainer {
        let config = TrainerConfig {
            data_dir: dir.path().join("state"),
            ..Default::default()
        };
        Trainer::with_deck(config, Deck::builtin(), StdRng::seed_from_u64(9))
    }

    #[test]
    fn numbers_dispatch_and_exit() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(&dir);
        let out = play(&mut t, "2\n42\nhello\n10\n2\n");
        assert!(out.contains("Deck: <built-in sample>"));
        assert!(out.contains("Enter a number from 1 to 10."));
        // Exit stops before the second info.
        assert_eq!(out.matches("Deck: <built-in sample>").count(), 1);
    }

    #[test]
    fn failed_load_keeps_current_deck() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(&dir);
        let missing = dir.path().join("missing.csv");
        let out = play(&mut t, &format!("1\n{}\n\n\nx\n", missing.display()));
        assert!(out.contains("Load failed"));
        assert_eq!(t.deck.len(), 2);
    }

    #[test]
    fn load_switches_deck_and_book() {
        let dir = tempfile::tempdir().unwrap();
        let deck_path = dir.path().join("words.tsv");
        std::fs::write(&deck_path, "id\tword\tmeaning\n1\tcat\t猫\n2\tdog\t狗\n3\tbird\t鸟\n")
            .unwrap();
        let mut t = trainer(&dir);
        let out = play(&mut t, &format!("1\n{}\n2\n\\t\n", deck_path.display()));

        assert!(out.contains("Items: 4"));
        assert_eq!(t.deck.len(), 4);
        assert_eq!(t.deck.pairs[1].a, "cat");
        assert!(t.book.path().ends_with(book_file_name(&t.deck.id())));
    }

    #[test]
    fn small_deck_notice_returns_to_menu() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainerConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let deck = Deck::from_rows([("solo", "one")], Default::default());
        let mut t = Trainer::with_deck(config, deck, StdRng::seed_from_u64(1));
        let out = play(&mut t, "4\n6\nx\n");
        assert_eq!(out.matches("needs at least 2 items").count(), 2);
    }
}
