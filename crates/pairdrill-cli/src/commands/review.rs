//! The `pairdrill review` command: weighted true/false drill over the
//! mistake book.

use std::io::{BufRead, Write};

use anyhow::Result;

use pairdrill_core::model::QuizMode;
use pairdrill_core::quiz::build_review;
use pairdrill_core::session::SessionSummary;

use super::print_summary;
use super::quiz::read_judgement;
use crate::console::{self, is_exit, Console};
use crate::context::{DeckArgs, Trainer};

pub fn execute(deck: DeckArgs) -> Result<()> {
    let mut trainer = Trainer::open(&deck)?;
    run(&mut trainer, &mut console::stdio())
}

pub fn run<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
) -> Result<()> {
    if trainer.book.active_count() == 0 {
        return console.say("The mistake book has no active entries; nothing to review.");
    }

    let matcher = trainer.matcher();
    let mut summary = SessionSummary::new(QuizMode::Review, trainer.deck.label());
    let mut last = None;

    loop {
        let Some(entry) = trainer.book.weighted_pick(last, &mut trainer.rng) else {
            console.say("No active entries left.")?;
            break;
        };
        last = Some(entry.id);
        let q = build_review(&trainer.deck, &entry, &matcher, &mut trainer.rng);

        console.blank()?;
        console.say(format!(
            "[weight {}] {} = {}",
            entry.weight, q.question_field, q.question_value
        ))?;
        console.say(format!("  Claim: {} = {}", q.answer_field, q.shown_value))?;

        let Some(said_true) = read_judgement(console)? else {
            break;
        };

        let correct = q.check(said_true);
        summary.score.record(correct);
        if correct {
            let weight = trainer.book.reward(entry.id)?.unwrap_or(0);
            console.say(format!("Correct. Weight -1, now {weight}."))?;
            if weight == 0 && !offer_delete(trainer, console, entry.id)? {
                break;
            }
        } else {
            let weight = trainer.book.penalize(entry.id, said_true)?.unwrap_or(0);
            summary.new_mistakes += 1;
            console.say(format!(
                "Wrong. It should be: {} = {}. Weight +2, now {weight}.",
                q.answer_field, q.correct_value
            ))?;
        }
    }

    if summary.answered() > 0 {
        print_summary(console, &summary)?;
    }
    Ok(())
}

/// Ask whether to drop a mastered entry. Returns `false` when the user
/// wants to leave the review.
fn offer_delete<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    id: uuid::Uuid,
) -> Result<bool> {
    let Some(line) = console.read_line("Weight is 0: [p] delete it, Enter keeps it > ")? else {
        return Ok(false);
    };
    let key = line.trim().to_lowercase();
    if key == "p" {
        trainer.book.remove(id)?;
        console.say("Deleted.")?;
    } else if is_exit(&key) {
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairdrill_core::config::TrainerConfig;
    use pairdrill_core::mistakes::MistakeEntry;
    use pairdrill_core::model::{Deck, DeckSource, Field};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trainer(dir: &tempfile::TempDir) -> Trainer {
        let config = TrainerConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let deck = Deck::from_rows(
            [("cat", "猫"), ("dog", "狗"), ("bird", "鸟")],
            DeckSource::default(),
        );
        Trainer::with_deck(config, deck, StdRng::seed_from_u64(3))
    }

    #[test]
    fn empty_book_has_nothing_to_review() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(&dir);
        let mut console = Console::new("q\n".as_bytes(), Vec::new());
        run(&mut t, &mut console).unwrap();
        let out = String::from_utf8(console.into_output()).unwrap();
        assert!(out.contains("nothing to review"));
    }

    #[test]
    fn judgements_move_weights() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(&dir);
        let deck = t.deck.clone();
        t.book
            .record_wrong(&deck, 0, Field::A, Field::B, "狗", QuizMode::Choice)
            .unwrap();

        // One entry: each answer either rewards (down to 0, then delete
        // offered) or penalizes and adds a review entry.
        let mut console = Console::new("q\np\ne\np\nq\np\n".as_bytes(), Vec::new());
        run(&mut t, &mut console).unwrap();
        let out = String::from_utf8(console.into_output()).unwrap();

        assert!(out.contains("Claim: B = "));
        assert!(out.contains("Answered"));
        for entry in t.book.entries() {
            assert_eq!(entry.item_index, 0);
        }
    }

    #[test]
    fn mastered_entry_can_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = trainer(&dir);
        // The recorded answer equals the correct one, so every claim is true.
        t.book
            .record(MistakeEntry::new(
                &t.deck.id(),
                1,
                Field::A,
                "dog",
                Field::B,
                "狗",
                "狗",
                QuizMode::Fill,
            ))
            .unwrap();

        let mut console = Console::new("q\np\n".as_bytes(), Vec::new());
        run(&mut t, &mut console).unwrap();
        let out = String::from_utf8(console.into_output()).unwrap();

        assert!(out.contains("Correct. Weight -1, now 0."));
        assert!(out.contains("Deleted."));
        assert!(out.contains("No active entries left."));
        assert!(out.contains("1/1 (100.0%)"));
        assert!(t.book.is_empty());
    }
}
