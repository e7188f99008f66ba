//! Question generation.
//!
//! Builders are pure over a deck and an RNG; the CLI owns prompting and
//! scoring. Seeded RNGs make every builder deterministic in tests.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::mistakes::MistakeEntry;
use crate::model::{Deck, Direction, Field};
use crate::normalize::{split_alternatives, Matcher};

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 8;

/// True/false answers are stored in the mistake book as these keys.
pub const SAID_TRUE: &str = "q";
pub const SAID_FALSE: &str = "e";

fn require_items(deck: &Deck, needed: usize) -> Result<(), QuizError> {
    if deck.len() < needed {
        return Err(QuizError::NotEnoughItems {
            needed,
            found: deck.len(),
        });
    }
    Ok(())
}

fn require_item(deck: &Deck, item: usize) -> Result<(), QuizError> {
    if item >= deck.len() {
        return Err(QuizError::NoCandidates);
    }
    Ok(())
}

/// Answer-side values of every other item that differ from `correct`,
/// unique under `matcher`'s normalization, in deck order.
fn distractors<'a>(
    deck: &'a Deck,
    item: usize,
    field: Field,
    correct: &str,
    matcher: &Matcher,
) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    seen.insert(matcher.normalize(correct));
    deck.pairs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != item)
        .map(|(_, p)| p.get(field))
        .filter(|v| seen.insert(matcher.normalize(v)))
        .collect()
}

// ---------------------------------------------------------------------------
// Multiple choice
// ---------------------------------------------------------------------------

/// "Given x, choose y."
#[derive(Debug, Clone)]
pub struct ChoiceQuestion {
    pub item_index: usize,
    pub question_field: Field,
    pub answer_field: Field,
    pub question_value: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl ChoiceQuestion {
    pub fn correct(&self) -> &str {
        &self.options[self.correct_index]
    }

    /// Out-of-range picks count as wrong.
    pub fn check(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

pub fn build_choice<R: Rng + ?Sized>(
    deck: &Deck,
    item: usize,
    direction: Direction,
    n_options: usize,
    matcher: &Matcher,
    rng: &mut R,
) -> Result<ChoiceQuestion, QuizError> {
    require_items(deck, 2)?;
    require_item(deck, item)?;
    let n_options = n_options.clamp(MIN_CHOICES, MAX_CHOICES);

    let (question_field, answer_field) = direction.resolve(rng);
    let pair = &deck.pairs[item];
    let correct = pair.get(answer_field).to_string();

    let mut pool = distractors(deck, item, answer_field, &correct, matcher);
    pool.shuffle(rng);

    let mut options = vec![correct];
    options.extend(pool.into_iter().take(n_options - 1).map(str::to_string));
    options.shuffle(rng);

    // The correct answer is unique under normalization, so this finds it.
    let correct_index = options
        .iter()
        .position(|o| o == pair.get(answer_field))
        .unwrap_or(0);

    Ok(ChoiceQuestion {
        item_index: item,
        question_field,
        answer_field,
        question_value: pair.get(question_field).to_string(),
        options,
        correct_index,
    })
}

// ---------------------------------------------------------------------------
// Fill in
// ---------------------------------------------------------------------------

/// "Given x, type y."
#[derive(Debug, Clone)]
pub struct FillQuestion {
    pub item_index: usize,
    pub question_field: Field,
    pub answer_field: Field,
    pub question_value: String,
    /// The raw answer cell.
    pub answer: String,
    /// Acceptable answers split out of the cell.
    pub accepted: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Correct,
    Wrong,
    /// Blank input; not scored.
    Empty,
}

impl FillQuestion {
    pub fn check(&self, user: &str, matcher: &Matcher) -> FillOutcome {
        if user.trim().is_empty() {
            FillOutcome::Empty
        } else if matcher.matches_any(user, &self.accepted) {
            FillOutcome::Correct
        } else {
            FillOutcome::Wrong
        }
    }
}

pub fn build_fill<R: Rng + ?Sized>(
    deck: &Deck,
    item: usize,
    direction: Direction,
    rng: &mut R,
) -> Result<FillQuestion, QuizError> {
    require_items(deck, 1)?;
    require_item(deck, item)?;

    let (question_field, answer_field) = direction.resolve(rng);
    let pair = &deck.pairs[item];
    let answer = pair.get(answer_field).to_string();

    Ok(FillQuestion {
        item_index: item,
        question_field,
        answer_field,
        question_value: pair.get(question_field).to_string(),
        accepted: split_alternatives(&answer),
        answer,
    })
}

// ---------------------------------------------------------------------------
// True / false
// ---------------------------------------------------------------------------

/// "x's y is z: true or false?"
#[derive(Debug, Clone)]
pub struct TrueFalseQuestion {
    pub item_index: usize,
    pub question_field: Field,
    pub answer_field: Field,
    pub question_value: String,
    pub shown_value: String,
    pub correct_value: String,
    pub is_true: bool,
}

impl TrueFalseQuestion {
    pub fn check(&self, said_true: bool) -> bool {
        said_true == self.is_true
    }
}

pub fn build_true_false<R: Rng + ?Sized>(
    deck: &Deck,
    item: usize,
    direction: Direction,
    matcher: &Matcher,
    rng: &mut R,
) -> Result<TrueFalseQuestion, QuizError> {
    require_items(deck, 2)?;
    require_item(deck, item)?;

    let (question_field, answer_field) = direction.resolve(rng);
    let pair = &deck.pairs[item];
    let correct_value = pair.get(answer_field).to_string();

    let shown_value = if rng.random_bool(0.5) {
        correct_value.clone()
    } else {
        let pool = distractors(deck, item, answer_field, &correct_value, matcher);
        pool.choose(rng)
            .map(|v| v.to_string())
            .unwrap_or_else(|| correct_value.clone())
    };

    Ok(TrueFalseQuestion {
        item_index: item,
        question_field,
        answer_field,
        question_value: pair.get(question_field).to_string(),
        is_true: matcher.normalize(&shown_value) == matcher.normalize(&correct_value),
        shown_value,
        correct_value,
    })
}

/// True/false statement for a mistake-book entry.
///
/// Shows either the correct value or a wrong one: the recorded wrong answer
/// when it is a real value, otherwise another item's answer.
pub fn build_review<R: Rng + ?Sized>(
    deck: &Deck,
    entry: &MistakeEntry,
    matcher: &Matcher,
    rng: &mut R,
) -> TrueFalseQuestion {
    let answer_field = entry.answer_field;
    let correct_value = entry.correct_value.clone();

    let shown_value = if rng.random_bool(0.5) {
        correct_value.clone()
    } else {
        let recorded = entry.user_wrong.trim();
        let is_judgement = recorded.eq_ignore_ascii_case(SAID_TRUE)
            || recorded.eq_ignore_ascii_case(SAID_FALSE);
        if !recorded.is_empty() && !is_judgement {
            recorded.to_string()
        } else {
            let pool = distractors(
                deck,
                entry.item_index,
                answer_field,
                &correct_value,
                matcher,
            );
            pool.choose(rng)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }
    };

    TrueFalseQuestion {
        item_index: entry.item_index,
        question_field: entry.question_field,
        answer_field,
        question_value: entry.question_value.clone(),
        is_true: matcher.normalize(&shown_value) == matcher.normalize(&correct_value),
        shown_value,
        correct_value,
    }
}

// ---------------------------------------------------------------------------
// Question order
// ---------------------------------------------------------------------------

/// How the next item is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Uniform pick every time; never runs out.
    #[default]
    Random,
    /// Every candidate once, shuffled.
    Shuffled,
    /// Every candidate once, in deck order.
    Sequential,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Random => write!(f, "random"),
            Order::Shuffled => write!(f, "shuffled"),
            Order::Sequential => write!(f, "sequential"),
        }
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Order::Random),
            "shuffled" | "shuffle" => Ok(Order::Shuffled),
            "sequential" | "seq" => Ok(Order::Sequential),
            other => Err(format!("unknown order: {other}")),
        }
    }
}

/// Picks item indices from a candidate pool.
#[derive(Debug, Clone)]
pub struct QuestionPicker {
    order: Order,
    candidates: Vec<usize>,
    position: usize,
}

impl QuestionPicker {
    pub fn new<R: Rng + ?Sized>(order: Order, mut candidates: Vec<usize>, rng: &mut R) -> Self {
        match order {
            Order::Shuffled => candidates.shuffle(rng),
            Order::Sequential => candidates.sort_unstable(),
            Order::Random => {}
        }
        Self {
            order,
            candidates,
            position: 0,
        }
    }

    /// Every item of the deck.
    pub fn for_deck<R: Rng + ?Sized>(order: Order, deck: &Deck, rng: &mut R) -> Self {
        Self::new(order, (0..deck.len()).collect(), rng)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Next item, or `None` once a finite order is exhausted.
    pub fn next_item<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let item = match self.order {
            Order::Random => self.candidates.choose(rng).copied(),
            Order::Shuffled | Order::Sequential => self.candidates.get(self.position).copied(),
        };
        if item.is_some() {
            self.position += 1;
        }
        item
    }

    /// `(questions handed out, total)`; total is `None` for random order.
    pub fn progress(&self) -> (usize, Option<usize>) {
        let total = match self.order {
            Order::Random => None,
            Order::Shuffled | Order::Sequential => Some(self.candidates.len()),
        };
        (self.position, total)
    }
}

// ---------------------------------------------------------------------------
// Flashcards
// ---------------------------------------------------------------------------

/// A two-sided card browser over a deck.
#[derive(Debug, Clone)]
pub struct Flashcards {
    order: Vec<usize>,
    cursor: usize,
    shuffled: bool,
}

impl Flashcards {
    pub fn new(deck: &Deck) -> Self {
        Self {
            order: (0..deck.len()).collect(),
            cursor: 0,
            shuffled: false,
        }
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// `(deck index, position, total)` of the current card.
    pub fn current(&self) -> Option<(usize, usize, usize)> {
        self.order
            .get(self.cursor)
            .map(|&i| (i, self.cursor + 1, self.order.len()))
    }

    pub fn next(&mut self) {
        if !self.order.is_empty() {
            self.cursor = (self.cursor + 1) % self.order.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.order.is_empty() {
            self.cursor = (self.cursor + self.order.len() - 1) % self.order.len();
        }
    }

    /// Switch between deck order and a fresh shuffle; restarts at the first card.
    pub fn toggle_shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.shuffled = !self.shuffled;
        self.order.sort_unstable();
        if self.shuffled {
            self.order.shuffle(rng);
        }
        self.cursor = 0;
    }
}
