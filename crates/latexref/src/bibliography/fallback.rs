//
// bibliography/fallback.rs
//
// Line-pattern extraction of citation keys
//

use regex::Regex;
use std::sync::OnceLock;

use super::{is_citable, BibEntry, BibliographyExtractor};

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Groups: 1=entry type, 2=citation key
    PATTERN.get_or_init(|| Regex::new(r"^\s*@(\w+)\s*[{(]\s*([^,\s{}()]+)\s*,").unwrap())
}

/// Extractor that only recognises `@type{key,` entry headers.
///
/// Used when record parsing is unavailable; entries carry no detail text.
#[derive(Debug, Clone, Default)]
pub struct FallbackExtractor;

impl FallbackExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl BibliographyExtractor for FallbackExtractor {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn extract(&self, text: &str) -> Vec<BibEntry> {
        let pattern = header_pattern();
        text.lines()
            .filter_map(|line| pattern.captures(line))
            .filter_map(|caps| {
                let entry_type = caps[1].to_ascii_lowercase();
                if !is_citable(&entry_type) {
                    return None;
                }
                Some(BibEntry {
                    key: caps[2].to_string(),
                    entry_type,
                    detail: None,
                })
            })
            .collect()
    }
}
