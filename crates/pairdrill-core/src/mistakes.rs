//! The mistake book: wrong answers with a reinforcement weight, persisted as
//! one JSON array per deck and rewritten wholesale after every change.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::model::{Deck, Field, QuizMode};
use crate::normalize::normalize_answer;
use crate::quiz::{SAID_FALSE, SAID_TRUE};

/// Weight added to an entry when a review judgement is wrong.
pub const PENALTY: u32 = 2;

/// One remembered wrong answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeEntry {
    pub id: Uuid,
    pub deck_id: String,
    pub item_index: usize,
    pub question_field: Field,
    #[serde(default)]
    pub question_value: String,
    pub answer_field: Field,
    #[serde(default)]
    pub correct_value: String,
    /// What the user answered; `q`/`e` for true/false judgements.
    #[serde(default)]
    pub user_wrong: String,
    #[serde(default)]
    pub mode: QuizMode,
    /// Sampling weight; 0 means mastered but not yet deleted.
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "epoch", deserialize_with = "deserialize_timestamp")]
    pub last_seen: DateTime<Utc>,
}

fn default_weight() -> u32 {
    1
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Accepts RFC 3339 strings or float epoch seconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Text(DateTime<Utc>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(t) => t,
        Raw::Seconds(secs) => {
            let whole = secs.floor();
            let nanos = (((secs - whole) * 1e9) as u32).min(999_999_999);
            let whole = whole as i64;
            Utc.timestamp_opt(whole, nanos).single().unwrap_or_else(epoch)
        }
    })
}

impl MistakeEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        deck_id: &str,
        item_index: usize,
        question_field: Field,
        question_value: &str,
        answer_field: Field,
        correct_value: &str,
        user_wrong: &str,
        mode: QuizMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id: deck_id.to_string(),
            item_index,
            question_field,
            question_value: question_value.to_string(),
            answer_field,
            correct_value: correct_value.to_string(),
            user_wrong: user_wrong.to_string(),
            mode,
            weight: 1,
            last_seen: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.weight > 0
    }

    fn dedup_key(&self) -> (String, usize, Field, Field, String) {
        (
            self.deck_id.clone(),
            self.item_index,
            self.question_field,
            self.answer_field,
            normalize_wrong(&self.user_wrong),
        )
    }
}

/// Judgement keys stay as-is (lowercased); real answers are normalized.
fn normalize_wrong(user_wrong: &str) -> String {
    let trimmed = user_wrong.trim();
    if trimmed.eq_ignore_ascii_case(SAID_TRUE) || trimmed.eq_ignore_ascii_case(SAID_FALSE) {
        trimmed.to_ascii_lowercase()
    } else {
        normalize_answer(trimmed, true)
    }
}

/// File name of a deck's mistake book.
pub fn book_file_name(deck_id: &str) -> String {
    format!("wrong_book_{deck_id}.json")
}

/// Persistent list of mistakes for one deck.
#[derive(Debug, Clone)]
pub struct MistakeBook {
    path: PathBuf,
    entries: Vec<MistakeEntry>,
}

impl MistakeBook {
    /// Open the book for `deck_id` inside `data_dir`.
    pub fn open(data_dir: &Path, deck_id: &str) -> Self {
        Self::load(&data_dir.join(book_file_name(deck_id)))
    }

    /// Load from disk. A missing file is an empty book; an unreadable or
    /// malformed one is logged and treated as empty. Duplicates found on load
    /// are merged and written back.
    pub fn load(path: &Path) -> Self {
        let mut book = Self {
            path: path.to_path_buf(),
            entries: Vec::new(),
        };
        if !path.exists() {
            return book;
        }

        let parsed = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mistake book: {}", path.display()))
            .and_then(|content| {
                serde_json::from_str::<Vec<MistakeEntry>>(&content)
                    .with_context(|| format!("failed to parse mistake book: {}", path.display()))
            });

        match parsed {
            Ok(entries) => book.entries = entries,
            Err(e) => {
                tracing::warn!("ignoring mistake book: {e:#}");
                return book;
            }
        }

        if book.dedup() > 0 {
            if let Err(e) = book.save() {
                tracing::warn!("failed to rewrite deduplicated mistake book: {e:#}");
            }
        }
        book
    }

    /// An in-memory book bound to `path`; nothing is written until a mutation.
    pub fn with_entries(path: impl Into<PathBuf>, entries: Vec<MistakeEntry>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    /// Rewrite the whole file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create data directory: {}", parent.display())
                })?;
            }
        }
        let json =
            serde_json::to_string_pretty(&self.entries).context("failed to serialize mistakes")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write mistake book: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "mistake book saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[MistakeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&MistakeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries that can still be drawn.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_active()).count()
    }

    /// Item indices of `deck_id` that still have an active mistake.
    pub fn active_items(&self, deck_id: &str) -> HashSet<usize> {
        self.entries
            .iter()
            .filter(|e| e.is_active() && e.deck_id == deck_id)
            .map(|e| e.item_index)
            .collect()
    }

    /// Merge entries sharing a dedup key. The first entry keeps its id and
    /// position; weights add up, `last_seen` takes the latest, and the later
    /// entry's displayed values win. Returns how many entries were removed.
    pub fn dedup(&mut self) -> usize {
        let before = self.entries.len();
        let mut merged: Vec<MistakeEntry> = Vec::with_capacity(before);
        let mut index: HashMap<(String, usize, Field, Field, String), usize> = HashMap::new();

        for entry in self.entries.drain(..) {
            match index.get(&entry.dedup_key()) {
                Some(&i) => {
                    let kept = &mut merged[i];
                    kept.weight = kept.weight.saturating_add(entry.weight);
                    kept.last_seen = kept.last_seen.max(entry.last_seen);
                    if !entry.correct_value.is_empty() {
                        kept.correct_value = entry.correct_value;
                    }
                    if !entry.question_value.is_empty() {
                        kept.question_value = entry.question_value;
                    }
                }
                None => {
                    index.insert(entry.dedup_key(), merged.len());
                    merged.push(entry);
                }
            }
        }

        self.entries = merged;
        before - self.entries.len()
    }

    /// Append, merge duplicates, save.
    pub fn record(&mut self, entry: MistakeEntry) -> Result<()> {
        tracing::debug!(item = entry.item_index, mode = %entry.mode, "recording mistake");
        self.entries.push(entry);
        self.dedup();
        self.save()
    }

    /// Record a fresh wrong answer for a deck item.
    pub fn record_wrong(
        &mut self,
        deck: &Deck,
        item_index: usize,
        question_field: Field,
        answer_field: Field,
        user_wrong: &str,
        mode: QuizMode,
    ) -> Result<()> {
        let pair = deck
            .get(item_index)
            .with_context(|| format!("item {item_index} is not in the deck"))?;
        self.record(MistakeEntry::new(
            &deck.id(),
            item_index,
            question_field,
            pair.get(question_field),
            answer_field,
            pair.get(answer_field),
            user_wrong,
            mode,
        ))
    }

    /// Weighted draw over active entries.
    ///
    /// Equivalent to expanding each entry into `weight` copies and picking
    /// uniformly. `exclude` (the previous pick) is left out whenever another
    /// active entry exists. Stamps `last_seen` on the chosen entry.
    pub fn weighted_pick<R: Rng + ?Sized>(
        &mut self,
        exclude: Option<Uuid>,
        rng: &mut R,
    ) -> Option<MistakeEntry> {
        let active: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.entries[i].is_active())
            .collect();
        if active.is_empty() {
            return None;
        }

        let distinct: HashSet<Uuid> = active.iter().map(|&i| self.entries[i].id).collect();
        let pool: Vec<usize> = match exclude {
            Some(id) if distinct.len() > 1 => active
                .iter()
                .copied()
                .filter(|&i| self.entries[i].id != id)
                .collect(),
            _ => active,
        };

        let total: u64 = pool.iter().map(|&i| u64::from(self.entries[i].weight)).sum();
        let mut ticket = rng.random_range(0..total);
        let mut chosen = pool[pool.len() - 1];
        for &i in &pool {
            let w = u64::from(self.entries[i].weight);
            if ticket < w {
                chosen = i;
                break;
            }
            ticket -= w;
        }

        let entry = &mut self.entries[chosen];
        entry.last_seen = Utc::now();
        Some(entry.clone())
    }

    /// Correct review judgement: weight −1, floored at zero.
    pub fn reward(&mut self, id: Uuid) -> Result<Option<u32>> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        entry.weight = entry.weight.saturating_sub(1);
        let weight = entry.weight;
        self.save()?;
        Ok(Some(weight))
    }

    /// Wrong review judgement: weight +2 and a new review-mode mistake
    /// carrying the user's judgement.
    pub fn penalize(&mut self, id: Uuid, said_true: bool) -> Result<Option<u32>> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        entry.weight = entry.weight.saturating_add(PENALTY);
        entry.last_seen = Utc::now();

        let judgement = if said_true { SAID_TRUE } else { SAID_FALSE };
        let follow_up = MistakeEntry::new(
            &entry.deck_id,
            entry.item_index,
            entry.question_field,
            &entry.question_value,
            entry.answer_field,
            &entry.correct_value,
            judgement,
            QuizMode::Review,
        );
        self.record(follow_up)?;
        Ok(self.get(id).map(|e| e.weight))
    }

    /// Delete one entry. Returns whether it existed.
    pub fn remove(&mut self, id: Uuid) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Delete every weight-0 entry. Returns how many were dropped.
    pub fn purge_exhausted(&mut self) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(MistakeEntry::is_active);
        let purged = before - self.entries.len();
        self.save()?;
        Ok(purged)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeckSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck() -> Deck {
        Deck::from_rows(
            [("cat", "猫"), ("dog", "狗"), ("bird", "鸟")],
            DeckSource::default(),
        )
    }

    fn book(dir: &tempfile::TempDir) -> MistakeBook {
        MistakeBook::open(dir.path(), "builtin")
    }

    #[test]
    fn missing_file_is_empty_and_save_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let mut book = MistakeBook::open(&nested, "x");
        assert!(book.is_empty());
        book.record_wrong(&deck(), 0, Field::A, Field::B, "狗", QuizMode::Choice)
            .unwrap();
        assert!(nested.join("wrong_book_x.json").exists());

        let reloaded = MistakeBook::open(&nested, "x");
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.entries()[0].correct_value, "猫");
        assert_eq!(reloaded.entries()[0].question_value, "cat");
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(book_file_name("bad"));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(MistakeBook::load(&path).is_empty());

        std::fs::write(&path, r#"{"an": "object"}"#).unwrap();
        assert!(MistakeBook::load(&path).is_empty());
    }

    #[test]
    fn record_merges_same_wrong_answer() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book(&dir);
        let deck = deck();
        book.record_wrong(&deck, 0, Field::A, Field::B, "狗", QuizMode::Choice).unwrap();
        book.record_wrong(&deck, 0, Field::A, Field::B, " 狗 ", QuizMode::Fill).unwrap();
        book.record_wrong(&deck, 0, Field::A, Field::B, "鸟", QuizMode::Choice).unwrap();
        book.record_wrong(&deck, 0, Field::B, Field::A, "狗", QuizMode::Choice).unwrap();

        assert_eq!(book.len(), 3);
        assert_eq!(book.entries()[0].weight, 2);
        assert_eq!(book.active_count(), 3);
        assert_eq!(book.active_items("builtin"), HashSet::from([0]));
    }

    #[test]
    fn judgement_keys_dedup_case_insensitively() {
        let mut a = MistakeEntry::new("d", 1, Field::A, "q", Field::B, "c", "Q", QuizMode::TrueFalse);
        a.weight = 3;
        let b = MistakeEntry::new("d", 1, Field::A, "q", Field::B, "c2", "q", QuizMode::Review);
        let first_id = a.id;
        let mut book = MistakeBook {
            path: PathBuf::from("unused.json"),
            entries: vec![a, b],
        };
        assert_eq!(book.dedup(), 1);
        assert_eq!(book.entries()[0].id, first_id);
        assert_eq!(book.entries()[0].weight, 4);
        assert_eq!(book.entries()[0].correct_value, "c2");
    }

    #[test]
    fn dedup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book(&dir);
        for wrong in ["狗", "狗", "鸟"] {
            book.entries.push(MistakeEntry::new(
                "builtin",
                0,
                Field::A,
                "cat",
                Field::B,
                "猫",
                wrong,
                QuizMode::Choice,
            ));
        }
        assert_eq!(book.dedup(), 1);
        let snapshot = book.entries().to_vec();
        assert_eq!(book.dedup(), 0);
        assert_eq!(book.entries(), &snapshot[..]);
    }

    #[test]
    fn float_seconds_before_epoch_round_down() {
        let stamp = |secs: &str| {
            let json = format!(
                r#"{{"id": "9f1c7a55-0c2e-4c8b-a4f1-6f3c3f1d2b10", "deck_id": "d", "item_index": 0,
                    "question_field": "A", "question_value": "cat", "answer_field": "B",
                    "correct_value": "猫", "user_wrong": "狗", "mode": "fill",
                    "last_seen": {secs}}}"#
            );
            serde_json::from_str::<MistakeEntry>(&json)
                .unwrap()
                .last_seen
                .timestamp_millis()
        };
        assert_eq!(stamp("-1.5"), -1_500);
        assert_eq!(stamp("-0.25"), -250);
        assert_eq!(stamp("1700000000.5"), 1_700_000_000_500);
    }

    #[test]
    fn load_dedups_and_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(book_file_name("legacy"));
        std::fs::write(
            &path,
            r#"[
              {"id": "9f1c7a55-0c2e-4c8b-a4f1-6f3c3f1d2b10", "deck_id": "legacy", "item_index": 0,
               "question_field": "A", "question_value": "cat", "answer_field": "B",
               "correct_value": "猫", "user_wrong": "狗", "mode": "mcq", "last_seen": 1700000000.5},
              {"id": "2b7f0c1e-8d4a-4e55-9a3e-1c2d3e4f5a6b", "deck_id": "legacy", "item_index": 0,
               "question_field": "A", "question_value": "cat", "answer_field": "B",
               "correct_value": "猫", "user_wrong": "狗", "mode": "tf-wb", "weight": 4,
               "last_seen": 1700000100.0}
            ]"#,
        )
        .unwrap();

        let book = MistakeBook::load(&path);
        assert_eq!(book.len(), 1);
        let entry = &book.entries()[0];
        assert_eq!(entry.weight, 5);
        assert_eq!(entry.mode, QuizMode::Choice);
        assert_eq!(entry.last_seen.timestamp(), 1_700_000_100);

        let on_disk: Vec<MistakeEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
    }

    #[test]
    fn weight_never_drops_below_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book(&dir);
        book.record_wrong(&deck(), 1, Field::A, Field::B, "猫", QuizMode::Fill).unwrap();
        let id = book.entries()[0].id;
        assert_eq!(book.reward(id).unwrap(), Some(0));
        assert_eq!(book.reward(id).unwrap(), Some(0));
        assert_eq!(book.active_count(), 0);
        assert_eq!(book.reward(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn penalize_adds_weight_and_records_judgement() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book(&dir);
        book.record_wrong(&deck(), 2, Field::A, Field::B, "猫", QuizMode::Choice).unwrap();
        let id = book.entries()[0].id;

        assert_eq!(book.penalize(id, true).unwrap(), Some(3));
        assert_eq!(book.len(), 2);
        let follow_up = &book.entries()[1];
        assert_eq!(follow_up.user_wrong, "q");
        assert_eq!(follow_up.mode, QuizMode::Review);
        assert_eq!(follow_up.correct_value, "鸟");

        // A second wrong "true" judgement merges into the follow-up.
        assert_eq!(book.penalize(id, true).unwrap(), Some(5));
        assert_eq!(book.len(), 2);
        assert_eq!(book.entries()[1].weight, 2);
    }

    #[test]
    fn weighted_pick_skips_zero_weight_and_previous() {
        let mut book = MistakeBook {
            path: PathBuf::from("unused.json"),
            entries: Vec::new(),
        };
        let mut rng = StdRng::seed_from_u64(42);
        assert!(book.weighted_pick(None, &mut rng).is_none());

        let mut heavy = MistakeEntry::new("d", 0, Field::A, "a", Field::B, "1", "x", QuizMode::Fill);
        heavy.weight = 9;
        let light = MistakeEntry::new("d", 1, Field::A, "b", Field::B, "2", "y", QuizMode::Fill);
        let mut dead = MistakeEntry::new("d", 2, Field::A, "c", Field::B, "3", "z", QuizMode::Fill);
        dead.weight = 0;
        let (heavy_id, light_id, dead_id) = (heavy.id, light.id, dead.id);
        book.entries = vec![heavy, light, dead];

        let mut heavy_hits = 0;
        for _ in 0..1000 {
            let pick = book.weighted_pick(None, &mut rng).unwrap();
            assert_ne!(pick.id, dead_id);
            if pick.id == heavy_id {
                heavy_hits += 1;
            }
        }
        // Expected 900 of 1000.
        assert!((800..=980).contains(&heavy_hits), "heavy hits: {heavy_hits}");

        for _ in 0..50 {
            let pick = book.weighted_pick(Some(heavy_id), &mut rng).unwrap();
            assert_eq!(pick.id, light_id);
        }

        // A single active entry is returned even when excluded.
        book.entries.retain(|e| e.id == light_id);
        let pick = book.weighted_pick(Some(light_id), &mut rng).unwrap();
        assert_eq!(pick.id, light_id);
    }

    #[test]
    fn weighted_pick_stamps_last_seen() {
        let mut old = MistakeEntry::new("d", 0, Field::A, "a", Field::B, "1", "x", QuizMode::Fill);
        old.last_seen = DateTime::<Utc>::UNIX_EPOCH;
        let mut book = MistakeBook {
            path: PathBuf::from("unused.json"),
            entries: vec![old],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let pick = book.weighted_pick(None, &mut rng).unwrap();
        assert!(pick.last_seen > DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(book.entries()[0].last_seen, pick.last_seen);
    }

    #[test]
    fn remove_purge_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut book = book(&dir);
        let deck = deck();
        book.record_wrong(&deck, 0, Field::A, Field::B, "狗", QuizMode::Choice).unwrap();
        book.record_wrong(&deck, 1, Field::A, Field::B, "猫", QuizMode::Choice).unwrap();
        book.record_wrong(&deck, 2, Field::A, Field::B, "猫", QuizMode::Choice).unwrap();

        let first = book.entries()[0].id;
        assert!(book.remove(first).unwrap());
        assert!(!book.remove(first).unwrap());

        let second = book.entries()[0].id;
        book.reward(second).unwrap();
        assert_eq!(book.purge_exhausted().unwrap(), 1);
        assert_eq!(book.len(), 1);

        book.clear().unwrap();
        assert!(MistakeBook::open(dir.path(), "builtin").is_empty());
    }
}
