//! Table loaders.
//!
//! Reads spreadsheets, delimited text, JSON and word-processor tables into a
//! plain grid of strings, then picks the A/B columns out of it.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::error::DeckError;
use crate::model::{Deck, DeckSource};
use crate::ooxml;

/// File names tried, in order, when no deck path is given.
pub const DEFAULT_DECK_NAMES: &[&str] =
    &["dict.xlsx", "dict.xlsm", "dict.csv", "dict.tsv", "dict.json"];

const JSON_A_KEYS: &[&str] = &["A", "a", "front", "left", "x"];
const JSON_B_KEYS: &[&str] = &["B", "b", "back", "right", "y"];

/// How to turn a table into pairs.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Zero-based A column.
    pub column_a: usize,
    /// Zero-based B column; defaults to the column right of A.
    pub column_b: Option<usize>,
    /// Forced delimiter for delimited text; sniffed when `None`.
    pub delimiter: Option<u8>,
    /// Treat the first row as headers.
    pub has_header: bool,
    /// Worksheet name for workbooks; first sheet when `None`.
    pub sheet: Option<String>,
}

impl LoadOptions {
    pub fn column_b(&self) -> usize {
        self.column_b.unwrap_or(self.column_a + 1)
    }
}

/// A loaded grid of cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn from_rows(mut rows: Vec<Vec<String>>, has_header: bool) -> Self {
        rows.retain(|r| r.iter().any(|c| !c.trim().is_empty()));
        let headers = if has_header && !rows.is_empty() {
            rows.remove(0)
        } else {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            (1..=width).map(|i| format!("col{i}")).collect()
        };
        Self { headers, rows }
    }

    /// Widest row, counting the header row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// The first `limit` rows.
    pub fn preview(&self, limit: usize) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(limit)]
    }

    /// Cell text, empty when the row is too short.
    pub fn cell(row: &[String], column: usize) -> &str {
        row.get(column).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Delimited,
    Json,
    Workbook,
    Document,
}

fn detect_format(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "tsv" | "txt" => Ok(Format::Delimited),
        "json" => Ok(Format::Json),
        "xlsx" | "xlsm" => Ok(Format::Workbook),
        "docx" => Ok(Format::Document),
        other => Err(DeckError::UnsupportedFormat(format!(".{other}")).into()),
    }
}

/// Load any supported file into a table.
pub fn load_table(path: &Path, opts: &LoadOptions) -> Result<Table> {
    let format = detect_format(path)?;
    tracing::debug!(path = %path.display(), ?format, "loading table");

    let table = match format {
        Format::Delimited => Table::from_rows(read_delimited(path, opts.delimiter)?, opts.has_header),
        Format::Json => Table {
            headers: vec!["A".into(), "B".into()],
            rows: read_json(path)?,
        },
        Format::Workbook => Table::from_rows(
            ooxml::read_xlsx(path, opts.sheet.as_deref())
                .with_context(|| format!("failed to read workbook: {}", path.display()))?,
            opts.has_header,
        ),
        Format::Document => Table::from_rows(
            ooxml::read_docx(path)
                .with_context(|| format!("failed to read document: {}", path.display()))?,
            opts.has_header,
        ),
    };

    Ok(table)
}

/// Load a deck: read the table, then take the A/B columns.
pub fn load_deck(path: &Path, opts: &LoadOptions) -> Result<Deck> {
    let format = detect_format(path)?;
    let table = load_table(path, opts)?;

    // JSON items are already A/B shaped.
    let (column_a, column_b) = if format == Format::Json {
        (0, 1)
    } else {
        (opts.column_a, opts.column_b())
    };

    let width = table.width();
    if !table.rows.is_empty() && column_a.max(column_b) >= width {
        return Err(DeckError::MissingColumn {
            column: column_a.max(column_b) + 1,
            width,
        }
        .into());
    }

    let source = DeckSource {
        path: Some(path.to_path_buf()),
        column_a,
        column_b,
        has_header: opts.has_header && format != Format::Json,
        sheet: opts.sheet.clone(),
    };
    let deck = Deck::from_rows(
        table
            .rows
            .iter()
            .map(|row| (Table::cell(row, column_a), Table::cell(row, column_b))),
        source,
    );

    if deck.is_empty() {
        return Err(DeckError::EmptyDeck.into());
    }

    tracing::info!(path = %path.display(), pairs = deck.len(), "deck loaded");
    Ok(deck)
}

/// Sheet names of a workbook; empty for other formats.
pub fn list_sheets(path: &Path) -> Result<Vec<String>> {
    match detect_format(path)? {
        Format::Workbook => ooxml::xlsx_sheet_names(path),
        _ => Ok(Vec::new()),
    }
}

/// First `dict.*` file present in `dir`.
pub fn discover_default_deck(dir: &Path) -> Option<PathBuf> {
    DEFAULT_DECK_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Tab when the line has at least as many tabs as commas, else comma.
fn sniff_delimiter(first_line: &str) -> u8 {
    let tabs = first_line.matches('\t').count();
    let commas = first_line.matches(',').count();
    if tabs > 0 && tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Strict UTF-8 first, then GB18030 (a superset of GBK) for older
/// Chinese word lists. Anything else is refused rather than patched with
/// replacement characters.
fn decode_text<'a>(path: &Path, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text));
    }
    match encoding_rs::GB18030.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => {
            tracing::debug!(path = %path.display(), "decoded table file as GB18030");
            Ok(text)
        }
        None => Err(DeckError::UnknownEncoding(path.display().to_string()).into()),
    }
}

fn read_delimited(path: &Path, forced: Option<u8>) -> Result<Vec<Vec<String>>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read table file: {}", path.display()))?;
    let text = decode_text(path, &bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let is_tsv = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    let delimiter = forced.unwrap_or_else(|| {
        if is_tsv {
            b'\t'
        } else {
            sniff_delimiter(text.lines().next().unwrap_or(""))
        }
    });

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => tracing::debug!("skipping malformed row {}: {}", i + 1, e),
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

fn json_scalar(val: Option<&JsonValue>) -> String {
    match val {
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn first_present<'a>(
    obj: &'a serde_json::Map<String, JsonValue>,
    keys: &[&str],
) -> Option<&'a JsonValue> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null() && !matches!(v.as_str(), Some(s) if s.trim().is_empty()))
}

/// Expected shapes:
///
/// ```json
/// [["bonjour", "hello"], ["merci", "thanks"]]
/// [{"A": "bonjour", "B": "hello"}, {"front": "merci", "back": "thanks"}]
/// ```
fn read_json(path: &Path) -> Result<Vec<Vec<String>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read JSON file: {}", path.display()))?;
    let root: JsonValue = serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;

    let items = root.as_array().context("expected a top-level JSON array")?;

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let row = match item {
            JsonValue::Object(obj) => vec![
                json_scalar(first_present(obj, JSON_A_KEYS)),
                json_scalar(first_present(obj, JSON_B_KEYS)),
            ],
            JsonValue::Array(arr) if arr.len() >= 2 => {
                vec![json_scalar(arr.first()), json_scalar(arr.get(1))]
            }
            _ => {
                tracing::debug!("skipping JSON item {i}: not a pair");
                continue;
            }
        };
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::fixtures;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn sniff_prefers_tab_only_when_dominant() {
        assert_eq!(sniff_delimiter("a\tb"), b'\t');
        assert_eq!(sniff_delimiter("a\tb,c"), b'\t');
        assert_eq!(sniff_delimiter("a,b,c\td"), b',');
        assert_eq!(sniff_delimiter("plain"), b',');
    }

    #[test]
    fn csv_with_bom_quotes_and_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "words.csv",
            "\u{feff}cat,猫\n\"hello, world\",你好世界\nlonely\n,empty\ncat,猫\n",
        );
        let deck = load_deck(&path, &LoadOptions::default()).unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.pairs[0].a, "cat");
        assert_eq!(deck.pairs[1].a, "hello, world");
        assert_eq!(deck.source.column_b, 1);
    }

    #[test]
    fn gbk_word_list_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gbk.csv");
        std::fs::write(&path, b"cat,\xC3\xA8\ndog,\xB9\xB7\n").unwrap();

        let deck = load_deck(&path, &LoadOptions::default()).unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.pairs[0].b, "猫");
        assert_eq!(deck.pairs[1].b, "狗");
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.csv");
        std::fs::write(&path, b"cat,\xFF\xFF\n").unwrap();

        let err = load_deck(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeckError>(),
            Some(DeckError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn tsv_and_header_and_column_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "words.tsv",
            "id\tword\tmeaning\n1\tsun\t太阳\n2\tmoon\t月亮\n",
        );
        let opts = LoadOptions {
            column_a: 1,
            has_header: true,
            ..Default::default()
        };
        let table = load_table(&path, &opts).unwrap();
        assert_eq!(table.headers, vec!["id", "word", "meaning"]);
        assert_eq!(table.rows.len(), 2);

        let deck = load_deck(&path, &opts).unwrap();
        assert_eq!(deck.answers(crate::model::Field::B), vec!["太阳", "月亮"]);
    }

    #[test]
    fn forced_delimiter_and_explicit_b_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "words.txt", "sun;x;太阳\nmoon;y;月亮\n");
        let opts = LoadOptions {
            column_a: 0,
            column_b: Some(2),
            delimiter: Some(b';'),
            ..Default::default()
        };
        let deck = load_deck(&path, &opts).unwrap();
        assert_eq!(deck.pairs[1].b, "月亮");
    }

    #[test]
    fn synthesized_headers_without_header_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "words.csv", "a,b,c\n");
        let table = load_table(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.headers, vec!["col1", "col2", "col3"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn json_arrays_and_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "words.json",
            r#"[
                ["one", "一"],
                {"front": "two", "back": "二"},
                {"A": "", "a": "three", "B": 3},
                {"x": "four"},
                "junk",
                [5]
            ]"#,
        );
        let deck = load_deck(&path, &LoadOptions::default()).unwrap();
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.pairs[1].b, "二");
        assert_eq!(deck.pairs[2].a, "three");
        assert_eq!(deck.pairs[2].b, "3");
    }

    #[test]
    fn json_must_be_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "words.json", r#"{"A": "x"}"#);
        assert!(load_deck(&path, &LoadOptions::default()).is_err());
    }

    #[test]
    fn workbook_deck_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.xlsx");
        fixtures::write_xlsx(&path);

        let opts = LoadOptions {
            has_header: true,
            ..Default::default()
        };
        let deck = load_deck(&path, &opts).unwrap();
        // Row 3 has a blank A cell and is skipped.
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.pairs[0].a, "cat");
        assert_eq!(deck.pairs[1].a, "sun");
        assert_eq!(list_sheets(&path).unwrap(), vec!["Words", "Phrases"]);
    }

    #[test]
    fn document_deck_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.docx");
        fixtures::write_docx(&path);

        let opts = LoadOptions {
            has_header: true,
            ..Default::default()
        };
        let table = load_table(&path, &opts).unwrap();
        assert_eq!(table.headers, vec!["English", "French"]);
        let deck = load_deck(&path, &opts).unwrap();
        assert_eq!(deck.pairs[0].b, "merci");
    }

    #[test]
    fn unsupported_and_empty_and_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write(&dir, "words.pdf", "");
        let err = load_deck(&pdf, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeckError>(),
            Some(DeckError::UnsupportedFormat(_))
        ));

        let blank = write(&dir, "blank.csv", "a,\n,b\n");
        let err = load_deck(&blank, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DeckError>(), Some(DeckError::EmptyDeck)));

        let narrow = write(&dir, "narrow.csv", "a,b\n");
        let opts = LoadOptions {
            column_a: 4,
            ..Default::default()
        };
        let err = load_deck(&narrow, &opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DeckError>(),
            Some(DeckError::MissingColumn { column: 6, width: 2 })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_deck(Path::new("/no/such/words.csv"), &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("words.csv"));
    }

    #[test]
    fn discovers_default_deck_in_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_default_deck(dir.path()).is_none());
        write(&dir, "dict.json", "[]");
        write(&dir, "dict.csv", "a,b");
        let found = discover_default_deck(dir.path()).unwrap();
        assert!(found.ends_with("dict.csv"));
    }

    #[test]
    fn preview_limits_rows() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..50).map(|i| format!("w{i},m{i}\n")).collect();
        let path = write(&dir, "many.csv", &body);
        let table = load_table(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.preview(30).len(), 30);
        assert_eq!(table.preview(100).len(), 50);
    }
}
