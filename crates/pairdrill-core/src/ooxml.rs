//! Minimal OOXML readers: worksheet cells from `.xlsx` and the first table
//! from `.docx`. Both are zip archives of XML parts.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::DeckError;

type Archive = ZipArchive<File>;

fn open_archive(path: &Path) -> Result<Archive> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    ZipArchive::new(file).with_context(|| format!("not a valid OOXML archive: {}", path.display()))
}

/// Read an archive member as UTF-8 text; `Ok(None)` when the member is absent.
fn read_part(archive: &mut Archive, name: &str) -> Result<Option<String>> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("failed to read {name}")),
    };
    let mut content = String::new();
    part.read_to_string(&mut content)
        .with_context(|| format!("failed to decode {name}"))?;
    Ok(Some(content))
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

// ---------------------------------------------------------------------------
// Workbooks
// ---------------------------------------------------------------------------

struct SheetRef {
    name: String,
    rel_id: Option<String>,
}

fn workbook_sheets(archive: &mut Archive) -> Result<Vec<SheetRef>> {
    let xml = read_part(archive, "xl/workbook.xml")?.context("workbook.xml missing")?;
    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                if let Some(name) = attr(e, b"name") {
                    sheets.push(SheetRef {
                        name,
                        rel_id: attr(e, b"id"),
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("failed to parse workbook.xml"),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

fn workbook_relationships(archive: &mut Archive) -> Result<HashMap<String, String>> {
    let mut targets = HashMap::new();
    let Some(xml) = read_part(archive, "xl/_rels/workbook.xml.rels")? else {
        return Ok(targets);
    };
    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    };
                    targets.insert(id, path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("failed to parse workbook relationships"),
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

fn shared_strings(archive: &mut Archive) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let Some(xml) = read_part(archive, "xl/sharedStrings.xml")? else {
        return Ok(strings);
    };
    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    // Phonetic hints (<rPh>) carry furigana that is not part of the value.
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                current.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("failed to parse sharedStrings.xml"),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Column count of the widest worksheet a spreadsheet may hold (`XFD`).
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index from a cell reference like `AB12`.
///
/// `Ok(None)` when the reference carries no column letters.
fn column_index(reference: &str) -> Result<Option<usize>, DeckError> {
    let mut index = 0usize;
    let mut letters = 0;
    for b in reference.bytes().take_while(|b| b.is_ascii_alphabetic()) {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .filter(|&i| i <= MAX_COLUMNS)
            .ok_or_else(|| DeckError::BadCellReference(reference.to_string()))?;
        letters += 1;
    }
    if letters == 0 {
        return Ok(None);
    }
    Ok(Some(index - 1))
}

#[derive(Clone, Copy, PartialEq)]
enum CellKind {
    Shared,
    Inline,
    Bool,
    Error,
    Plain,
}

fn cell_column(cell: &BytesStart<'_>) -> Result<Option<usize>, DeckError> {
    match attr(cell, b"r") {
        Some(reference) => column_index(&reference),
        None => Ok(None),
    }
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut col = 0usize;
    let mut kind = CellKind::Plain;
    let mut value = String::new();
    let mut capture = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    row.clear();
                    col = 0;
                }
                b"c" => {
                    if let Some(c) = cell_column(e)? {
                        col = c;
                    }
                    kind = match attr(e, b"t").as_deref() {
                        Some("s") => CellKind::Shared,
                        Some("inlineStr") => CellKind::Inline,
                        Some("b") => CellKind::Bool,
                        Some("e") => CellKind::Error,
                        _ => CellKind::Plain,
                    };
                    value.clear();
                }
                b"v" => capture = true,
                b"t" if kind == CellKind::Inline => capture = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"c" => {
                if let Some(c) = cell_column(e)? {
                    col = c;
                }
                col += 1;
            }
            Ok(Event::Text(e)) if capture => {
                value.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    let cell = match kind {
                        CellKind::Shared => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared.get(i).cloned())
                            .unwrap_or_default(),
                        CellKind::Bool => match value.trim() {
                            "1" => "TRUE".to_string(),
                            _ => "FALSE".to_string(),
                        },
                        CellKind::Error => String::new(),
                        CellKind::Inline | CellKind::Plain => value.clone(),
                    };
                    if row.len() <= col {
                        row.resize(col + 1, String::new());
                    }
                    row[col] = cell;
                    col += 1;
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("failed to parse worksheet"),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// Sheet names of a workbook, in workbook order.
pub fn xlsx_sheet_names(path: &Path) -> Result<Vec<String>> {
    let mut archive = open_archive(path)?;
    Ok(workbook_sheets(&mut archive)?
        .into_iter()
        .map(|s| s.name)
        .collect())
}

/// Read the cells of one worksheet (the first when `sheet` is `None`).
pub fn read_xlsx(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>> {
    let mut archive = open_archive(path)?;
    let sheets = workbook_sheets(&mut archive)?;
    let relationships = workbook_relationships(&mut archive)?;

    let position = match sheet {
        Some(name) => sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| DeckError::SheetNotFound(name.to_string()))?,
        None => 0,
    };

    let part = sheets
        .get(position)
        .and_then(|s| s.rel_id.as_ref())
        .and_then(|id| relationships.get(id).cloned())
        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));
    tracing::debug!(sheet = ?sheet, part = %part, "reading worksheet");

    let shared = shared_strings(&mut archive)?;
    let xml = read_part(&mut archive, &part)?
        .with_context(|| format!("worksheet part missing: {part}"))?;
    parse_sheet(&xml, &shared)
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

fn parse_first_table(xml: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut found = false;
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    depth += 1;
                    found = true;
                }
                b"tr" if depth == 1 => row.clear(),
                b"tc" if depth == 1 => paragraphs.clear(),
                b"p" if depth >= 1 => paragraph.clear(),
                b"t" if depth >= 1 => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if depth >= 1 => {
                if matches!(e.local_name().as_ref(), b"tab" | b"br") {
                    paragraph.push(' ');
                }
            }
            Ok(Event::Text(e)) if in_text => {
                paragraph.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if depth >= 1 => {
                    let text = paragraph.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    paragraph.clear();
                }
                b"tc" if depth == 1 => row.push(paragraphs.join(" ")),
                b"tr" if depth == 1 => rows.push(std::mem::take(&mut row)),
                b"tbl" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("failed to parse document.xml"),
            _ => {}
        }
        buf.clear();
    }

    if !found {
        return Err(DeckError::NoTable.into());
    }
    Ok(rows)
}

/// Rows of the first table in a `.docx` document.
pub fn read_docx(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut archive = open_archive(path)?;
    let xml = read_part(&mut archive, "word/document.xml")?
        .context("word/document.xml missing")?;
    parse_first_table(&xml)
}
