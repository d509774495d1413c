//
// session.rs
//
// Per-document completion session tying root discovery, caches and indexers
// together
//

use std::path::{Path, PathBuf};

use crate::bibliography::BibliographyIndexer;
use crate::candidate::Candidate;
use crate::completion_context::{CandidateSource, Classification, CompletionContext, ContextClassifier};
use crate::config::IndexerConfig;
use crate::definition::{resolve_definition, NavigationTarget};
use crate::error::NavigationError;
use crate::file_cache::FileCache;
use crate::labels::{LabelIndex, LabelIndexer};
use crate::root::{resolve_root, ProjectRoot};
use crate::scan::ScanScope;

/// What the host knows about the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Text of the line at the cursor
    pub line: String,
    /// Filesystem path of the active document
    pub document: PathBuf,
}

impl Request {
    pub fn new(line: impl Into<String>, document: impl Into<PathBuf>) -> Self {
        Self {
            line: line.into(),
            document: document.into(),
        }
    }
}

/// All indexing state for one editing session.
///
/// Sessions share nothing: each owns its cache, root, label table and
/// completion context, and is driven by one caller at a time.
#[derive(Debug)]
pub struct Session {
    config: IndexerConfig,
    root: Option<ProjectRoot>,
    cache: FileCache,
    labels: LabelIndex,
    classifier: ContextClassifier,
    bibliography: BibliographyIndexer,
    label_indexer: LabelIndexer,
}

impl Session {
    pub fn new(config: IndexerConfig) -> Self {
        let bibliography = BibliographyIndexer::new(&config);
        let label_indexer = LabelIndexer::new(config.document_extensions.clone());
        Self {
            config,
            root: None,
            cache: FileCache::new(),
            labels: LabelIndex::new(),
            classifier: ContextClassifier::new(),
            bibliography,
            label_indexer,
        }
    }

    /// Project root, resolved from `document` on first use
    pub fn root(&mut self, document: &Path) -> &ProjectRoot {
        self.root
            .get_or_insert_with(|| resolve_root(document, &self.config.bibliography_extension))
    }

    /// Forget the resolved root; the next request resolves it again
    pub fn reset_root(&mut self) {
        self.root = None;
    }

    pub fn context(&self) -> CompletionContext {
        self.classifier.context()
    }

    pub fn label_index(&self) -> &LabelIndex {
        &self.labels
    }

    /// Classify the request line and report whether completion applies
    pub fn classify(&mut self, request: &Request) -> Classification {
        self.root(&request.document);
        self.classifier.classify(&request.line)
    }

    pub fn should_complete(&mut self, request: &Request) -> bool {
        self.classify(request).activate
    }

    /// Candidates for the context chosen by the last classification.
    ///
    /// Labels come before citations when both are wanted.
    pub fn candidates(&mut self, request: &Request) -> Vec<Candidate> {
        let scope = self.scope(&request.document);
        let mut candidates = Vec::new();

        for source in self.classifier.context().sources() {
            match source {
                CandidateSource::Labels => candidates.extend(self.label_indexer.find_labels(
                    &scope,
                    &mut self.cache,
                    &mut self.labels,
                )),
                CandidateSource::Bibliography => {
                    candidates.extend(self.bibliography.find_entries(&scope, &mut self.cache))
                }
            }
        }

        candidates
    }

    /// Rescan label files so the label table reflects the project on disk
    pub fn refresh_labels(&mut self, document: &Path) {
        let scope = self.scope(document);
        self.label_indexer
            .find_labels(&scope, &mut self.cache, &mut self.labels);
    }

    /// Jump target for the cross-reference on the request line.
    ///
    /// Only labels found by earlier label scans are known.
    pub fn goto(&self, request: &Request) -> Result<NavigationTarget, NavigationError> {
        resolve_definition(&request.line, &self.labels)
    }

    /// Human-readable session summary
    pub fn diagnostics(&self) -> String {
        let root = match &self.root {
            Some(root) => root.path.display().to_string(),
            None => String::from("(not yet resolved)"),
        };
        let mut text = format!(
            "Looking for *{} in {}\nNumber of cached files: {}\nNumber of cache hits: {}",
            self.config.bibliography_extension,
            root,
            self.cache.file_count(),
            self.cache.hits()
        );
        if self.root.as_ref().is_some_and(|r| !r.found) {
            text.push_str("\nProject root not found; indexing next to the document only");
        }
        text
    }

    fn scope(&mut self, document: &Path) -> ScanScope {
        let follow_links = self.config.follow_links;
        let (dir, recursive) = self.root(document).scan_scope();
        ScanScope {
            dir,
            recursive,
            follow_links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixture_project::{create_fixture_project, write_files, FixtureConfig};
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), files);
        tmp
    }

    #[test]
    fn test_cite_candidates() {
        let tmp = project(&[
            ("refs.bib", "@article{key1, title={T}, author={Doe, A.}}\n@string{x = \"y\"}\n"),
            ("chapters/one.tex", "\\label{sec:one}\n"),
        ]);
        let doc = tmp.path().join("chapters/one.tex");
        let mut session = Session::new(IndexerConfig::default());

        let request = Request::new(r"\cite{", &doc);
        assert!(session.classify(&request).activate);
        let ids: Vec<_> = session
            .candidates(&request)
            .into_iter()
            .map(|c| c.identifier)
            .collect();
        assert_eq!(ids, vec!["key1".to_string()]);
    }

    #[test]
    fn test_both_lists_labels_first() {
        let tmp = project(&[
            ("refs.bib", "@book{b1,\n}\n"),
            ("main.tex", "\\label{fig1}\n"),
        ]);
        let doc = tmp.path().join("main.tex");
        let mut session = Session::new(IndexerConfig::default());

        let request = Request::new(r"\cite{b1} \ref{", &doc);
        assert_eq!(session.classify(&request).context, CompletionContext::Both);
        let ids: Vec<_> = session
            .candidates(&request)
            .into_iter()
            .map(|c| c.identifier)
            .collect();
        assert_eq!(ids, vec!["fig1".to_string(), "b1".to_string()]);
    }

    #[test]
    fn test_idle_session_has_no_candidates() {
        let tmp = project(&[("refs.bib", "@book{b1,\n}\n"), ("main.tex", "")]);
        let mut session = Session::new(IndexerConfig::default());
        let request = Request::new("plain", tmp.path().join("main.tex"));
        assert!(!session.should_complete(&request));
        assert!(session.candidates(&request).is_empty());
    }

    #[test]
    fn test_goto_after_label_scan() {
        let tmp = project(&[("refs.bib", ""), ("sub/fig.tex", "\n\n    \\label{fig1}\n")]);
        let doc = tmp.path().join("sub/fig.tex");
        let mut session = Session::new(IndexerConfig::default());

        let request = Request::new(r"See \ref{fig1} here", &doc);
        assert_eq!(
            session.goto(&request),
            Err(NavigationError::UnknownLabel("fig1".to_string()))
        );

        session.refresh_labels(&doc);
        let target = session.goto(&request).unwrap();
        assert_eq!(target.file, doc);
        assert_eq!((target.line, target.column), (3, 11));
    }

    #[test]
    fn test_root_is_memoized_until_reset() {
        let tmp = project(&[("a/refs.bib", ""), ("a/b/doc.tex", "")]);
        let doc = tmp.path().join("a/b/doc.tex");
        let mut session = Session::new(IndexerConfig::default());
        assert_eq!(session.root(&doc).path, tmp.path().join("a"));

        // A closer marker appears, but the session keeps its root
        std::fs::write(tmp.path().join("a/b/near.bib"), "").unwrap();
        assert_eq!(session.root(&doc).path, tmp.path().join("a"));

        session.reset_root();
        assert_eq!(session.root(&doc).path, tmp.path().join("a/b"));
    }

    #[test]
    fn test_diagnostics_text() {
        let tmp = project(&[("refs.bib", "@book{b1,\n}\n"), ("main.tex", "")]);
        let doc = tmp.path().join("main.tex");
        let mut session = Session::new(IndexerConfig::default());
        assert!(session.diagnostics().contains("(not yet resolved)"));

        let request = Request::new(r"\cite{", &doc);
        session.classify(&request);
        session.candidates(&request);
        session.candidates(&request);

        let text = session.diagnostics();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                format!("Looking for *.bib in {}", tmp.path().display()).as_str(),
                "Number of cached files: 1",
                "Number of cache hits: 1",
            ]
        );
    }

    #[test]
    fn test_fallback_root_indexes_neighbours_only() {
        let mut config = IndexerConfig::default();
        config.bibliography_extension = String::from(".latexref-no-such-marker");
        let tmp = project(&[
            ("docs/main.tex", "\\label{here}\n"),
            ("docs/side.tex", "\\label{beside}\n"),
            ("docs/deeper/skip.tex", "\\label{below}\n"),
        ]);
        let doc = tmp.path().join("docs/main.tex");
        let mut session = Session::new(config);

        let request = Request::new(r"\ref{", &doc);
        session.classify(&request);
        assert_eq!(session.root(&doc).path, doc);

        let mut ids: Vec<_> = session
            .candidates(&request)
            .into_iter()
            .map(|c| c.identifier)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["beside".to_string(), "here".to_string()]);
        assert!(session.diagnostics().contains("Project root not found"));
    }

    #[test]
    fn test_generated_project_counts() {
        let config = FixtureConfig::small();
        let tmp = create_fixture_project(&config);
        let doc = tmp.path().join("chapters").join("chapter_0.tex");
        let mut session = Session::new(IndexerConfig::default());

        let request = Request::new(r"\cite{x} \ref{", &doc);
        session.classify(&request);
        let candidates = session.candidates(&request);
        assert_eq!(
            candidates.len(),
            config.chapter_count * config.labels_per_chapter + config.bib_entries
        );
        assert_eq!(session.label_index().len(), config.chapter_count * config.labels_per_chapter);
    }
}
