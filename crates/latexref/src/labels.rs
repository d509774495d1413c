//
// labels.rs
//
// Label definition discovery and the project-wide label location table
//

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::candidate::Candidate;
use crate::file_cache::{CacheLookup, FileCache};
use crate::scan::{self, ScanScope};

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\\label\{([^{}]+)\}").unwrap())
}

/// Where a label is defined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub identifier: String,
    pub file: PathBuf,
    /// 1-based line number
    pub line: u32,
    /// 0-based character offset of the identifier within the line
    pub column: u32,
    /// Same offset in UTF-16 code units, for LSP positions
    pub utf16_column: u32,
}

#[derive(Debug, Clone)]
struct FileLabels {
    /// Scan sequence number; higher means scanned more recently
    seq: u64,
    entries: Vec<LabelEntry>,
}

/// Identifier → definition table shared by every document of a session.
///
/// The most recently scanned definition of an identifier wins. Rescanning a
/// file replaces everything that file contributed; an identifier it no
/// longer defines falls back to the latest other file that still does.
#[derive(Debug, Default)]
pub struct LabelIndex {
    by_id: HashMap<String, LabelEntry>,
    by_file: HashMap<PathBuf, FileLabels>,
    next_seq: u64,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&LabelEntry> {
        self.by_id.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Replace the labels contributed by `file` with a fresh scan result
    pub fn replace_file(&mut self, file: &Path, entries: Vec<LabelEntry>) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let previous = self.by_file.insert(
            file.to_path_buf(),
            FileLabels {
                seq,
                entries: entries.clone(),
            },
        );

        let mut orphaned = HashSet::new();
        for old in previous.map(|p| p.entries).unwrap_or_default() {
            if self.by_id.get(&old.identifier).is_some_and(|e| e.file == file) {
                self.by_id.remove(&old.identifier);
                orphaned.insert(old.identifier);
            }
        }

        for entry in entries {
            orphaned.remove(&entry.identifier);
            self.by_id.insert(entry.identifier.clone(), entry);
        }

        for identifier in orphaned {
            if let Some(entry) = self.latest_definition(&identifier) {
                log::trace!(
                    "Label '{}' now resolves to {}",
                    identifier,
                    entry.file.display()
                );
                self.by_id.insert(identifier, entry);
            }
        }
    }

    /// Forget everything `file` contributed
    pub fn remove_file(&mut self, file: &Path) {
        if !self.by_file.contains_key(file) {
            return;
        }
        self.replace_file(file, Vec::new());
        self.by_file.remove(file);
    }

    /// Files that currently contribute to the table
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.by_file.keys().map(PathBuf::as_path)
    }

    fn latest_definition(&self, identifier: &str) -> Option<LabelEntry> {
        self.by_file
            .values()
            .filter_map(|labels| {
                labels
                    .entries
                    .iter()
                    .rev()
                    .find(|e| e.identifier == identifier)
                    .map(|e| (labels.seq, e))
            })
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, e)| e.clone())
    }
}

/// Extract every `\label{...}` definition from `text`.
///
/// Text after an unescaped `%` is a comment and is ignored.
pub fn extract_labels(file: &Path, text: &str) -> Vec<LabelEntry> {
    let pattern = label_pattern();
    let mut entries = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let code = strip_comment(line);
        for caps in pattern.captures_iter(code) {
            let Some(m) = caps.get(1) else {
                continue;
            };
            let before = &code[..m.start()];
            entries.push(LabelEntry {
                identifier: m.as_str().to_string(),
                file: file.to_path_buf(),
                line: idx as u32 + 1,
                column: before.chars().count() as u32,
                utf16_column: before.encode_utf16().count() as u32,
            });
        }
    }

    entries
}

/// The part of `line` before its first unescaped `%`
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let backslashes = bytes[..i].iter().rev().take_while(|&&c| c == b'\\').count();
        if backslashes % 2 == 0 {
            return &line[..i];
        }
    }
    line
}

/// Finds label candidates in every document file under a scope
#[derive(Debug, Clone)]
pub struct LabelIndexer {
    extensions: Vec<String>,
}

impl LabelIndexer {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    /// Collect label candidates under `scope`, updating `index` for every
    /// file that had to be rescanned.
    ///
    /// A file without labels is cached as an empty result. Files that fail
    /// to read are skipped and keep their previous index entries; files the
    /// walk no longer finds lose theirs.
    pub fn find_labels(
        &self,
        scope: &ScanScope,
        cache: &mut FileCache,
        index: &mut LabelIndex,
    ) -> Vec<Candidate> {
        let files = scan::matching_files(scope, |name| {
            self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
        });
        let mut candidates = Vec::new();

        let present: HashSet<&Path> = files.iter().map(PathBuf::as_path).collect();
        let vanished: Vec<PathBuf> = index
            .files()
            .filter(|f| scope.contains(f) && !present.contains(f))
            .map(Path::to_path_buf)
            .collect();
        for path in vanished {
            log::debug!("Dropping labels of vanished {}", path.display());
            index.remove_file(&path);
        }

        for path in files {
            let mtime = match cache.check(&path) {
                Ok(CacheLookup::Hit(cached)) => {
                    candidates.extend(cached);
                    continue;
                }
                Ok(CacheLookup::Miss { mtime }) => mtime,
                Err(e) => {
                    log::warn!("Skipping document: {}", e);
                    continue;
                }
            };

            let text = match scan::read_text(&path) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Skipping document: {}", e);
                    continue;
                }
            };

            let entries = extract_labels(&path, &text);
            let found: Vec<Candidate> = entries
                .iter()
                .map(|e| Candidate::new(e.identifier.clone()))
                .collect();
            log::trace!("Found {} labels in {}", found.len(), path.display());

            index.replace_file(&path, entries);
            candidates.extend(found.iter().cloned());
            cache.store(path, mtime, found);
        }

        log::debug!(
            "Label scan of {}: {} candidates, {} labels indexed",
            scope.dir.display(),
            candidates.len(),
            index.len()
        );
        candidates
    }
}
