//
// bibliography/structured.rs
//
// Record-level BibTeX parser producing keys with title/author detail
//

use std::collections::HashMap;

use super::latex_text::display_detail;
use super::{is_citable, BibEntry, BibliographyExtractor};

/// One parsed BibTeX record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibRecord {
    /// Lower-cased entry type (`article`, `book`, ...)
    pub entry_type: String,
    pub key: String,
    /// Field values keyed by lower-cased field name, braces and quotes removed
    pub fields: HashMap<String, String>,
}

/// Month macros BibTeX predefines
const MONTHS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Parse every citable record in `text`.
///
/// `@string` definitions are collected and expanded in later field values;
/// `@preamble` and `@comment` blocks are skipped. A malformed record is
/// dropped and parsing resumes at the next `@`.
pub fn parse_records(text: &str) -> Vec<BibRecord> {
    let mut parser = Parser {
        src: text,
        pos: 0,
        macros: MONTHS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    };
    let mut records = Vec::new();

    while let Some(at) = parser.src[parser.pos..].find('@') {
        let start = parser.pos + at;
        parser.pos = start + 1;
        match parser.entry() {
            Some(Parsed::Record(record)) => records.push(record),
            Some(Parsed::Skipped) => {}
            None => {
                log::debug!("Skipping malformed BibTeX entry at byte {}", start);
                parser.pos = start + 1;
            }
        }
    }

    records
}

enum Parsed {
    Record(BibRecord),
    Skipped,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    macros: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| {
            !b.is_ascii_whitespace() && !matches!(b, b'{' | b'}' | b'(' | b')' | b',' | b'=' | b'#' | b'"' | b'@')
        }) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.src[start..self.pos])
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    /// Parse one entry; `pos` is just past the `@`
    fn entry(&mut self) -> Option<Parsed> {
        self.skip_ws();
        let entry_type = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let close = match self.peek()? {
            b'{' => b'}',
            b'(' => b')',
            _ => return None,
        };
        self.pos += 1;

        match entry_type.as_str() {
            "comment" | "preamble" => {
                self.skip_balanced(close)?;
                Some(Parsed::Skipped)
            }
            "string" => {
                self.skip_ws();
                let name = self.ident()?.to_ascii_lowercase();
                self.expect(b'=')?;
                let value = self.value()?;
                self.expect(close)?;
                self.macros.insert(name, value);
                Some(Parsed::Skipped)
            }
            _ => {
                self.skip_ws();
                let key_start = self.pos;
                while self
                    .peek()
                    .is_some_and(|b| b != b',' && b != close && b != b'\n')
                {
                    self.pos += 1;
                }
                let key = self.src[key_start..self.pos].trim().to_string();
                let fields = self.fields(close)?;
                if key.is_empty() || !is_citable(&entry_type) {
                    return Some(Parsed::Skipped);
                }
                Some(Parsed::Record(BibRecord {
                    entry_type,
                    key,
                    fields,
                }))
            }
        }
    }

    fn fields(&mut self, close: u8) -> Option<HashMap<String, String>> {
        let mut fields = HashMap::new();
        loop {
            self.skip_ws();
            match self.peek()? {
                b',' => self.pos += 1,
                b if b == close => {
                    self.pos += 1;
                    return Some(fields);
                }
                _ => {
                    let name = self.ident()?.to_ascii_lowercase();
                    self.expect(b'=')?;
                    let value = self.value()?;
                    fields.insert(name, value);
                }
            }
        }
    }

    /// A field value: pieces joined by `#`
    fn value(&mut self) -> Option<String> {
        let mut value = String::new();
        loop {
            self.skip_ws();
            match self.peek()? {
                b'{' => {
                    self.pos += 1;
                    let start = self.pos;
                    self.skip_balanced(b'}')?;
                    value.push_str(&self.src[start..self.pos - 1]);
                }
                b'"' => {
                    self.pos += 1;
                    let start = self.pos;
                    self.skip_quoted()?;
                    value.push_str(&self.src[start..self.pos - 1]);
                }
                _ => {
                    let word = self.ident()?;
                    if word.bytes().all(|b| b.is_ascii_digit()) {
                        value.push_str(word);
                    } else {
                        match self.macros.get(&word.to_ascii_lowercase()) {
                            Some(expansion) => value.push_str(expansion),
                            None => value.push_str(word),
                        }
                    }
                }
            }
            self.skip_ws();
            if self.peek() == Some(b'#') {
                self.pos += 1;
            } else {
                return Some(value);
            }
        }
    }

    /// Advance past the delimiter closing the current group, honouring
    /// nested braces
    fn skip_balanced(&mut self, close: u8) -> Option<()> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                _ if b == close && depth == 0 => return Some(()),
                _ => {}
            }
        }
        None
    }

    /// Advance past the closing quote of a `"..."` value; quotes inside
    /// braces do not terminate it
    fn skip_quoted(&mut self) -> Option<()> {
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'"' if depth == 0 => return Some(()),
                _ => {}
            }
        }
        None
    }
}

/// Extractor that parses full records and derives display detail
#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    title_max_length: usize,
}

impl StructuredExtractor {
    pub fn new(title_max_length: usize) -> Self {
        Self { title_max_length }
    }
}

impl BibliographyExtractor for StructuredExtractor {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn extract(&self, text: &str) -> Vec<BibEntry> {
        parse_records(text)
            .into_iter()
            .map(|record| {
                let detail = display_detail(
                    record.fields.get("title").map(String::as_str),
                    record.fields.get("author").map(String::as_str),
                    self.title_max_length,
                );
                BibEntry {
                    key: record.key,
                    entry_type: record.entry_type,
                    detail,
                }
            })
            .collect()
    }
}
