//! The `pairdrill quiz` command.

use std::io::{BufRead, Write};

use anyhow::Result;

use pairdrill_core::error::QuizError;
use pairdrill_core::model::{Direction, Field, QuizMode};
use pairdrill_core::quiz::{
    build_choice, build_fill, build_true_false, FillOutcome, Order, QuestionPicker, SAID_FALSE,
    SAID_TRUE,
};
use pairdrill_core::session::SessionSummary;

use super::{print_summary, review, show_quiz_error, Step};
use crate::console::{self, is_exit, quiz_key, Console, QuizKey};
use crate::context::{DeckArgs, Trainer};

/// Quiz settings; `None` falls back to the config file.
#[derive(Debug, Clone)]
pub struct QuizOptions {
    pub mode: QuizMode,
    pub direction: Option<Direction>,
    pub choices: Option<usize>,
    pub order: Option<Order>,
    pub count: Option<usize>,
    pub wrong_only: bool,
}

impl QuizOptions {
    pub fn new(mode: QuizMode) -> Self {
        Self {
            mode,
            direction: None,
            choices: None,
            order: None,
            count: None,
            wrong_only: false,
        }
    }
}

pub fn execute(deck: DeckArgs, opts: QuizOptions) -> Result<()> {
    if let Some(n) = opts.count {
        anyhow::ensure!(n >= 1, "--count must be at least 1");
    }
    let mut trainer = Trainer::open(&deck)?;
    let mut console = console::stdio();
    if let Err(e) = run(&mut trainer, &mut console, &opts) {
        show_quiz_error(&mut console, e)?;
    }
    Ok(())
}

/// The question loop. Ends on `x`, end of input, `--count`, or when a
/// finite order runs out. `?` and `m` at a question prompt reveal the
/// answer or mark the item without scoring.
pub fn run<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    opts: &QuizOptions,
) -> Result<()> {
    if opts.mode == QuizMode::Review {
        return review::run(trainer, console);
    }

    let needed = if opts.mode == QuizMode::Fill { 1 } else { 2 };
    if trainer.deck.len() < needed {
        return Err(QuizError::NotEnoughItems {
            needed,
            found: trainer.deck.len(),
        }
        .into());
    }

    let direction = opts.direction.unwrap_or(trainer.config.direction);
    let choices = opts.choices.unwrap_or(trainer.config.choices);
    let order = opts.order.unwrap_or(trainer.config.order);

    let candidates: Vec<usize> = if opts.wrong_only {
        let active = trainer.book.active_items(&trainer.deck.id());
        let mut items: Vec<usize> = active
            .into_iter()
            .filter(|&i| i < trainer.deck.len())
            .collect();
        items.sort_unstable();
        items
    } else {
        (0..trainer.deck.len()).collect()
    };
    if candidates.is_empty() {
        return console.say("No active mistakes for this deck; nothing to practice.");
    }

    let mut picker = QuestionPicker::new(order, candidates, &mut trainer.rng);
    let mut summary = SessionSummary::new(opts.mode, trainer.deck.label());
    tracing::debug!(mode = %opts.mode, %direction, %order, "quiz started");

    loop {
        if opts.count.is_some_and(|n| summary.answered() as usize >= n) {
            break;
        }
        let Some(item) = picker.next_item(&mut trainer.rng) else {
            console.say("All questions done.")?;
            break;
        };
        let header = match picker.progress() {
            (n, Some(total)) => format!("[{n}/{total}]"),
            (n, None) => format!("[{n}]"),
        };

        console.blank()?;
        let step = match opts.mode {
            QuizMode::Choice => {
                ask_choice(trainer, console, &mut summary, &header, item, direction, choices)?
            }
            QuizMode::Fill => ask_fill(trainer, console, &mut summary, &header, item, direction)?,
            QuizMode::TrueFalse => {
                ask_true_false(trainer, console, &mut summary, &header, item, direction)?
            }
            QuizMode::Review => Step::Quit,
        };
        if step == Step::Quit {
            break;
        }
    }

    if summary.answered() > 0 {
        print_summary(console, &summary)?;
    }
    Ok(())
}

/// Save a wrong answer. A write failure is reported and the quiz goes on.
fn remember<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    summary: &mut SessionSummary,
    item: usize,
    fields: (Field, Field),
    user_wrong: &str,
) -> Result<()> {
    let (question_field, answer_field) = fields;
    match trainer.book.record_wrong(
        &trainer.deck,
        item,
        question_field,
        answer_field,
        user_wrong,
        summary.mode,
    ) {
        Ok(()) => summary.new_mistakes += 1,
        Err(e) => {
            tracing::warn!("failed to record mistake: {e:#}");
            console.say(format!("(could not save this mistake: {e:#})"))?;
        }
    }
    Ok(())
}

/// Act on `?` or `m`. `Some(step)` ends the question; `None` asks again.
fn handle_key<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    summary: &mut SessionSummary,
    key: QuizKey,
    item: usize,
    fields: (Field, Field),
    answer: &str,
) -> Result<Option<Step>> {
    match key {
        QuizKey::Stop => Ok(Some(Step::Quit)),
        QuizKey::Reveal => {
            console.say(format!("Answer: {answer}"))?;
            Ok(Some(Step::Next))
        }
        QuizKey::Mark => {
            remember(trainer, console, summary, item, fields, "")?;
            console.say("Marked as a mistake.")?;
            Ok(None)
        }
    }
}

fn ask_choice<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    summary: &mut SessionSummary,
    header: &str,
    item: usize,
    direction: Direction,
    choices: usize,
) -> Result<Step> {
    let matcher = trainer.matcher();
    let q = build_choice(
        &trainer.deck,
        item,
        direction,
        choices,
        &matcher,
        &mut trainer.rng,
    )?;
    let fields = (q.question_field, q.answer_field);

    console.say(format!(
        "{header} {} = {}    which {} matches?",
        q.question_field, q.question_value, q.answer_field
    ))?;
    for (i, option) in q.options.iter().enumerate() {
        console.say(format!("  {}. {option}", i + 1))?;
    }

    let prompt = format!("Answer 1-{} (? show, m mark, x stop) > ", q.options.len());
    let pick = loop {
        let Some(line) = console.read_line(&prompt)? else {
            return Ok(Step::Quit);
        };
        if is_exit(&line) {
            return Ok(Step::Quit);
        }
        if let Some(key) = quiz_key(&line) {
            let answer = q.correct().to_string();
            match handle_key(trainer, console, summary, key, item, fields, &answer)? {
                Some(step) => return Ok(step),
                None => continue,
            }
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=q.options.len()).contains(&n) => break n - 1,
            _ => console.say(format!("Enter a number from 1 to {}.", q.options.len()))?,
        }
    };

    let correct = q.check(pick);
    summary.score.record(correct);
    if correct {
        console.say("Correct!")?;
    } else {
        console.say(format!("Wrong. Correct answer: {}", q.correct()))?;
        remember(trainer, console, summary, item, fields, &q.options[pick])?;
    }
    Ok(Step::Next)
}

fn ask_fill<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    summary: &mut SessionSummary,
    header: &str,
    item: usize,
    direction: Direction,
) -> Result<Step> {
    let q = build_fill(&trainer.deck, item, direction, &mut trainer.rng)?;
    let matcher = trainer.matcher();

    console.say(format!(
        "{header} {} = {}    type the {} side",
        q.question_field, q.question_value, q.answer_field
    ))?;

    let fields = (q.question_field, q.answer_field);
    let shown = q.accepted.join(" / ");

    let answer = loop {
        let Some(line) = console.read_line("Your answer (? show, m mark, x stop) > ")? else {
            return Ok(Step::Quit);
        };
        // A key that is also an accepted answer is scored as that answer.
        let key = quiz_key(&line).filter(|_| !matcher.matches_any(&line, &q.accepted));
        if let Some(key) = key {
            match handle_key(trainer, console, summary, key, item, fields, &shown)? {
                Some(step) => return Ok(step),
                None => continue,
            }
        }
        match q.check(&line, &matcher) {
            FillOutcome::Empty => console.say("The answer cannot be empty.")?,
            outcome => break (line, outcome),
        }
    };

    let (typed, outcome) = answer;
    let correct = outcome == FillOutcome::Correct;
    summary.score.record(correct);
    if correct {
        console.say("Correct!")?;
    } else {
        console.say(format!("Wrong. Accepted: {shown}"))?;
        remember(trainer, console, summary, item, fields, typed.trim())?;
    }
    Ok(Step::Next)
}

fn ask_true_false<R: BufRead, W: Write>(
    trainer: &mut Trainer,
    console: &mut Console<R, W>,
    summary: &mut SessionSummary,
    header: &str,
    item: usize,
    direction: Direction,
) -> Result<Step> {
    let matcher = trainer.matcher();
    let q = build_true_false(&trainer.deck, item, direction, &matcher, &mut trainer.rng)?;

    console.say(format!("{header} {} = {}", q.question_field, q.question_value))?;
    console.say(format!("  Claim: {} = {}", q.answer_field, q.shown_value))?;

    let Some(said_true) = read_judgement(console)? else {
        return Ok(Step::Quit);
    };

    let correct = q.check(said_true);
    summary.score.record(correct);
    if correct {
        console.say("Correct!")?;
    } else {
        console.say(format!(
            "Wrong. It should be: {} = {}",
            q.answer_field, q.correct_value
        ))?;
        let judgement = if said_true { SAID_TRUE } else { SAID_FALSE };
        let fields = (q.question_field, q.answer_field);
        remember(trainer, console, summary, item, fields, judgement)?;
    }
    Ok(Step::Next)
}

/// `q` = true, `e` = false; `None` on `x` or end of input.
pub(super) fn read_judgement<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> Result<Option<bool>> {
    loop {
        let Some(line) = console.read_line("[q] true  [e] false  [x] stop > ")? else {
            return Ok(None);
        };
        let key = line.trim().to_lowercase();
        if key == SAID_TRUE {
            return Ok(Some(true));
        }
        if key == SAID_FALSE {
            return Ok(Some(false));
        }
        if is_exit(&key) {
            return Ok(None);
        }
        console.say("Press q for true or e for false.")?;
    }
}
