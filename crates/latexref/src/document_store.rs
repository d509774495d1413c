//
// document_store.rs
//
// Text of open documents, kept current from LSP change notifications
//

use std::collections::HashMap;

use ropey::Rope;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

/// An open document
#[derive(Debug, Clone)]
pub struct Document {
    pub contents: Rope,
    pub version: i32,
}

impl Document {
    pub fn new(text: &str, version: i32) -> Self {
        Self {
            contents: Rope::from_str(text),
            version,
        }
    }

    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        let Some(range) = change.range else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
            return;
        };

        let start_idx = self.position_to_char(range.start.line, range.start.character);
        let end_idx = self.position_to_char(range.end.line, range.end.character);
        if start_idx > end_idx {
            log::warn!("Ignoring change with inverted range {:?}", range);
            return;
        }
        self.contents.remove(start_idx..end_idx);
        self.contents.insert(start_idx, &change.text);
    }

    /// Text of `line` (0-based) without its line terminator
    pub fn line_text(&self, line: u32) -> Option<String> {
        let line = line as usize;
        if line >= self.contents.len_lines() {
            return None;
        }
        let text = self.contents.line(line).to_string();
        Some(text.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string())
    }

    /// Text of `line` up to the UTF-16 column `character`
    pub fn line_prefix(&self, line: u32, character: u32) -> Option<String> {
        let text = self.line_text(line)?;
        let end = utf16_offset_to_byte_offset(&text, character as usize);
        Some(text[..end].to_string())
    }

    /// Char index in the rope for an LSP position, clamped to the document
    fn position_to_char(&self, line: u32, character: u32) -> usize {
        let line = line as usize;
        if line >= self.contents.len_lines() {
            return self.contents.len_chars();
        }
        let line_text = self.contents.line(line).to_string();
        let byte = utf16_offset_to_byte_offset(&line_text, character as usize);
        self.contents.line_to_char(line) + line_text[..byte].chars().count()
    }
}

fn utf16_offset_to_byte_offset(line_text: &str, utf16_offset: usize) -> usize {
    let mut utf16_count = 0;
    for (byte_idx, ch) in line_text.char_indices() {
        if utf16_count >= utf16_offset {
            return byte_idx;
        }
        utf16_count += ch.len_utf16();
    }
    line_text.len()
}

/// All documents the client has open
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, uri: Url, text: &str, version: i32) {
        self.documents.insert(uri, Document::new(text, version));
    }

    pub fn update(&mut self, uri: &Url, version: i32, changes: Vec<TextDocumentContentChangeEvent>) {
        let Some(doc) = self.documents.get_mut(uri) else {
            log::warn!("Change for unopened document {}", uri);
            return;
        };
        for change in changes {
            doc.apply_change(change);
        }
        doc.version = version;
    }

    pub fn close(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
