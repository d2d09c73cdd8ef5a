//! BibTeX reader/writer for archive files and source payloads.
//!
//! Handles braced, quoted and bare field values, nested braces, and
//! `@comment`/`@string`/`@preamble` blocks. Malformed entries are skipped
//! with recovery at the next `@`.

use tracing::warn;

use crate::error::{LitrevError, Result};
use crate::record::PaperRecord;

pub fn parse(input: &str) -> Result<Vec<PaperRecord>> {
    let mut scanner = Scanner::new(input);
    let mut records = Vec::new();

    while scanner.seek_past('@') {
        scanner.skip_ws();
        let entry_type = scanner.take_while(|c| c.is_alphanumeric()).to_lowercase();
        scanner.skip_ws();
        if !scanner.eat('{') {
            warn!("skipping malformed bibtex block '@{entry_type}'");
            continue;
        }
        if matches!(entry_type.as_str(), "comment" | "string" | "preamble") {
            scanner.skip_balanced();
            continue;
        }
        match parse_entry_body(&mut scanner, &entry_type) {
            Some(record) => records.push(record),
            None => warn!("skipping unterminated bibtex entry '@{entry_type}'"),
        }
    }

    Ok(records)
}

/// Parse a blob expected to hold exactly one entry.
pub fn parse_one(input: &str) -> Result<PaperRecord> {
    let mut entries = parse(input)?.into_iter();
    match (entries.next(), entries.next()) {
        (Some(record), None) => Ok(record),
        (None, _) => Err(LitrevError::Bibtex("no entry found".to_string())),
        (Some(_), Some(_)) => Err(LitrevError::Bibtex(
            "expected exactly one entry".to_string(),
        )),
    }
}

pub fn serialize(record: &PaperRecord) -> String {
    let entry_type = if record.entry_type.is_empty() {
        "misc"
    } else {
        &record.entry_type
    };
    let cite_key = record.cite_key.as_deref().unwrap_or("unknown");

    let mut out = format!("@{entry_type}{{{cite_key},\n");
    for (name, value) in &record.fields {
        out.push_str(&format!("  {name} = {{{value}}},\n"));
    }
    out.push_str("}\n");
    out
}

pub fn serialize_many(records: &[PaperRecord]) -> String {
    records.iter().map(serialize).collect::<Vec<_>>().join("\n")
}

fn parse_entry_body(scanner: &mut Scanner<'_>, entry_type: &str) -> Option<PaperRecord> {
    let mut record = PaperRecord::new(entry_type);

    scanner.skip_ws();
    let cite_key = scanner
        .take_while(|c| c != ',' && c != '}' && !c.is_whitespace())
        .trim()
        .to_string();
    if !cite_key.is_empty() {
        record.cite_key = Some(cite_key);
    }

    loop {
        scanner.skip_ws();
        match scanner.peek() {
            Some(',') => {
                scanner.bump();
            }
            Some('}') => {
                scanner.bump();
                return Some(record);
            }
            None => return None,
            Some(_) => {
                let name = scanner
                    .take_while(|c| c != '=' && c != ',' && c != '}')
                    .trim()
                    .to_lowercase();
                scanner.skip_ws();
                if !scanner.eat('=') {
                    // Stray token; drop one char so the loop always advances.
                    if name.is_empty() {
                        scanner.bump();
                    }
                    continue;
                }
                scanner.skip_ws();
                let value = scanner.field_value();
                if !name.is_empty() {
                    record.fields.insert(name, value);
                }
            }
        }
    }
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Advance past the next occurrence of `target`; false at end of input.
    fn seek_past(&mut self, target: char) -> bool {
        match self.rest().find(target) {
            Some(offset) => {
                self.pos += offset + target.len_utf8();
                true
            }
            None => {
                self.pos = self.src.len();
                false
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Consume up to and including the `}` matching an already-consumed `{`.
    fn skip_balanced(&mut self) {
        let mut depth = 1u32;
        while depth > 0 {
            match self.bump() {
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some(_) => {}
                None => return,
            }
        }
    }

    /// A field value: `{...}` (nested braces kept), `"..."`, or a bare
    /// token up to the next `,` or `}`.
    fn field_value(&mut self) -> String {
        match self.peek() {
            Some('{') => {
                self.bump();
                let start = self.pos;
                let mut depth = 1u32;
                while depth > 0 {
                    match self.bump() {
                        Some('{') => depth += 1,
                        Some('}') => depth -= 1,
                        Some(_) => {}
                        None => break,
                    }
                }
                let end = if depth == 0 { self.pos - 1 } else { self.pos };
                squash(&self.src[start..end])
            }
            Some('"') => {
                self.bump();
                let raw = self.take_while(|c| c != '"');
                self.eat('"');
                squash(raw)
            }
            _ => squash(self.take_while(|c| c != ',' && c != '}')),
        }
    }
}

fn squash(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
