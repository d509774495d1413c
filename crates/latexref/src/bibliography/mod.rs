//
// bibliography/mod.rs
//
// Citation key discovery across a project's bibliography files
//

pub mod fallback;
#[cfg(feature = "structured-bibliography")]
pub mod latex_text;
#[cfg(feature = "structured-bibliography")]
pub mod structured;

use std::fmt;

use crate::candidate::Candidate;
use crate::config::{BibliographyParser, IndexerConfig};
use crate::file_cache::{CacheLookup, FileCache};
use crate::scan::{self, ScanScope};

pub use fallback::FallbackExtractor;
#[cfg(feature = "structured-bibliography")]
pub use structured::StructuredExtractor;

/// Entry types that define macros or preamble text rather than citable works
const NON_CITABLE: &[&str] = &["string", "preamble", "comment"];

/// Whether an entry of `entry_type` (lower-cased) can be cited
pub fn is_citable(entry_type: &str) -> bool {
    !NON_CITABLE.contains(&entry_type)
}

/// A citable bibliography entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    /// "Title (Authors)" text; `None` when the strategy has no detail
    pub detail: Option<String>,
}

impl BibEntry {
    pub fn into_candidate(self) -> Candidate {
        Candidate {
            identifier: self.key,
            detail: self.detail,
        }
    }
}

/// Strategy for turning bibliography file text into entries.
///
/// Implementations must be pure functions of the text: the same content
/// always yields the same entries, and text without entries yields none.
pub trait BibliographyExtractor: fmt::Debug + Send + Sync {
    /// Short name for logs and diagnostics
    fn name(&self) -> &'static str;
    fn extract(&self, text: &str) -> Vec<BibEntry>;
}

/// Finds citation candidates in every bibliography file under a scope
#[derive(Debug)]
pub struct BibliographyIndexer {
    extension: String,
    extractor: Box<dyn BibliographyExtractor>,
}

impl BibliographyIndexer {
    /// Build an indexer, choosing the extraction strategy once
    pub fn new(config: &IndexerConfig) -> Self {
        let extractor: Box<dyn BibliographyExtractor> = match config.bibliography_parser {
            BibliographyParser::Fallback => Box::new(FallbackExtractor::new()),
            BibliographyParser::Auto => best_available(config),
        };
        log::debug!("Bibliography extraction strategy: {}", extractor.name());
        Self {
            extension: config.bibliography_extension.clone(),
            extractor,
        }
    }

    /// Build an indexer around an explicit strategy
    pub fn with_extractor(extension: impl Into<String>, extractor: Box<dyn BibliographyExtractor>) -> Self {
        Self {
            extension: extension.into(),
            extractor,
        }
    }

    pub fn strategy(&self) -> &'static str {
        self.extractor.name()
    }

    /// Collect candidates from all bibliography files in `scope`.
    ///
    /// Unchanged files are served from `cache`. Files that vanish or cannot
    /// be read are logged and skipped. Keys repeated across files are kept.
    pub fn find_entries(&self, scope: &ScanScope, cache: &mut FileCache) -> Vec<Candidate> {
        let files = scan::matching_files(scope, |name| name.ends_with(self.extension.as_str()));
        let mut candidates = Vec::new();
        let mut rescanned = 0usize;

        for path in files {
            let mtime = match cache.check(&path) {
                Ok(CacheLookup::Hit(cached)) => {
                    candidates.extend(cached);
                    continue;
                }
                Ok(CacheLookup::Miss { mtime }) => mtime,
                Err(e) => {
                    log::warn!("Skipping bibliography file: {}", e);
                    continue;
                }
            };

            let text = match scan::read_text(&path) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Skipping bibliography file: {}", e);
                    continue;
                }
            };

            let extracted: Vec<Candidate> = self
                .extractor
                .extract(&text)
                .into_iter()
                .map(BibEntry::into_candidate)
                .collect();
            log::trace!("Extracted {} entries from {}", extracted.len(), path.display());
            candidates.extend(extracted.iter().cloned());
            cache.store(path, mtime, extracted);
            rescanned += 1;
        }

        log::debug!(
            "Bibliography scan of {}: {} candidates, {} files rescanned",
            scope.dir.display(),
            candidates.len(),
            rescanned
        );
        candidates
    }
}

#[cfg(feature = "structured-bibliography")]
fn best_available(config: &IndexerConfig) -> Box<dyn BibliographyExtractor> {
    Box::new(StructuredExtractor::new(config.title_max_length))
}

#[cfg(not(feature = "structured-bibliography"))]
fn best_available(_config: &IndexerConfig) -> Box<dyn BibliographyExtractor> {
    log::debug!("Structured bibliography parsing not compiled in; citations carry no detail");
    Box::new(FallbackExtractor::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture_project::set_mtime;
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const SAMPLE: &str = "@article{key1, title={A Very Long Title About Something}, author={Smith, J. and Doe, A.}}\n";

    fn scope(dir: &Path) -> ScanScope {
        ScanScope {
            dir: dir.to_path_buf(),
            recursive: true,
            follow_links: false,
        }
    }

    fn base_time() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn fallback_indexer() -> BibliographyIndexer {
        BibliographyIndexer::with_extractor(".bib", Box::new(FallbackExtractor::new()))
    }

    #[test]
    fn test_recursive_discovery() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("refs");
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(tmp.path().join("main.bib"), "@book{b1,\n}\n").unwrap();
        std::fs::write(sub.join("more.bib"), "@misc{m1,\n}\n").unwrap();
        std::fs::write(sub.join("notes.txt"), "@misc{ignored,\n}\n").unwrap();

        let mut cache = FileCache::new();
        let mut ids: Vec<_> = fallback_indexer()
            .find_entries(&scope(tmp.path()), &mut cache)
            .into_iter()
            .map(|c| c.identifier)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["b1".to_string(), "m1".to_string()]);
        assert_eq!(cache.file_count(), 2);
    }

    #[test]
    fn test_duplicates_across_files_kept() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.bib"), "@book{same,\n}\n").unwrap();
        std::fs::write(tmp.path().join("b.bib"), "@book{same,\n}\n").unwrap();

        let mut cache = FileCache::new();
        let found = fallback_indexer().find_entries(&scope(tmp.path()), &mut cache);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_unchanged_file_served_from_cache() {
        let tmp = TempDir::new().unwrap();
        let bib = tmp.path().join("refs.bib");
        std::fs::write(&bib, "@book{original,\n}\n").unwrap();
        set_mtime(&bib, base_time());

        let indexer = fallback_indexer();
        let mut cache = FileCache::new();
        let first = indexer.find_entries(&scope(tmp.path()), &mut cache);

        // New content with the old mtime: only a re-read would notice it
        std::fs::write(&bib, "@book{rewritten,\n}\n").unwrap();
        set_mtime(&bib, base_time());

        let second = indexer.find_entries(&scope(tmp.path()), &mut cache);
        assert_eq!(first, second);
        assert_eq!(second[0].identifier, "original");
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_touched_file_rescanned_even_when_emptied() {
        let tmp = TempDir::new().unwrap();
        let bib = tmp.path().join("refs.bib");
        std::fs::write(&bib, "@book{original,\n}\n").unwrap();
        set_mtime(&bib, base_time());

        let indexer = fallback_indexer();
        let mut cache = FileCache::new();
        assert_eq!(indexer.find_entries(&scope(tmp.path()), &mut cache).len(), 1);

        std::fs::write(&bib, "% nothing left\n").unwrap();
        set_mtime(&bib, base_time() + Duration::from_secs(5));

        assert!(indexer.find_entries(&scope(tmp.path()), &mut cache).is_empty());
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_string_only_file_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("macros.bib"), "@string{abbr = \"X\"}\n").unwrap();

        let indexer = BibliographyIndexer::new(&IndexerConfig::default());
        let mut cache = FileCache::new();
        assert!(indexer.find_entries(&scope(tmp.path()), &mut cache).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_skipped_walk_continues() {
        use crate::test_utils::fixture_project::make_unreadable;

        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.bib"), "@book{hidden,\n}\n").unwrap();
        std::fs::write(tmp.path().join("good.bib"), "@book{visible,\n}\n").unwrap();
        if !make_unreadable(&tmp.path().join("bad.bib")) {
            return;
        }

        let indexer = fallback_indexer();
        let mut cache = FileCache::new();
        let found = indexer.find_entries(&scope(tmp.path()), &mut cache);
        assert_eq!(found, vec![Candidate::new("visible")]);
        // Nothing is recorded for the failed file, so it is retried next time
        assert_eq!(cache.file_count(), 1);

        let again = indexer.find_entries(&scope(tmp.path()), &mut cache);
        assert_eq!(again, found);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_forced_fallback_strategy() {
        let config = IndexerConfig {
            bibliography_parser: BibliographyParser::Fallback,
            ..Default::default()
        };
        assert_eq!(BibliographyIndexer::new(&config).strategy(), "fallback");
    }

    #[cfg(feature = "structured-bibliography")]
    #[test]
    fn test_structured_strategy_is_default_and_repeatable() {
        let tmp = TempDir::new().unwrap();
        let bib = tmp.path().join("refs.bib");
        std::fs::write(&bib, SAMPLE).unwrap();

        let indexer = BibliographyIndexer::new(&IndexerConfig::default());
        assert_eq!(indexer.strategy(), "structured");

        let expected = vec![Candidate::with_detail(
            "key1",
            "A Very Long Title About... (J. Smith et al.)",
        )];
        let mut cache = FileCache::new();
        assert_eq!(indexer.find_entries(&scope(tmp.path()), &mut cache), expected);

        // A fresh cache forces a second extraction of the same bytes
        let mut fresh = FileCache::new();
        assert_eq!(indexer.find_entries(&scope(tmp.path()), &mut fresh), expected);
    }

    #[cfg(not(feature = "structured-bibliography"))]
    #[test]
    fn test_without_structured_parser_keys_have_no_detail() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("refs.bib"), SAMPLE).unwrap();

        let indexer = BibliographyIndexer::new(&IndexerConfig::default());
        assert_eq!(indexer.strategy(), "fallback");
        let mut cache = FileCache::new();
        assert_eq!(
            indexer.find_entries(&scope(tmp.path()), &mut cache),
            vec![Candidate::new("key1")]
        );
    }
}
