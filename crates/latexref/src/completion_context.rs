//
// completion_context.rs
//
// Detects whether the cursor line is completing a citation, a cross-reference,
// or both, and keeps that decision for the candidate step.
//

use regex::Regex;
use std::sync::OnceLock;

/// Compiled patterns for line classification
struct ContextPatterns {
    /// Any cite-family command followed somewhere by an opening brace
    cite: Regex,
    /// `ref{` or `pageref{`
    reference: Regex,
}

fn patterns() -> &'static ContextPatterns {
    static PATTERNS: OnceLock<ContextPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ContextPatterns {
        cite: Regex::new(r"cite.*\{").unwrap(),
        reference: Regex::new(r"ref\{|pageref\{").unwrap(),
    })
}

/// Find the cross-reference command on `line`, if any.
///
/// Returns the byte range of the matched `ref{` / `pageref{` token.
pub fn find_reference(line: &str) -> Option<std::ops::Range<usize>> {
    patterns().reference.find(line).map(|m| m.range())
}

/// What kind of identifier the session is completing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionContext {
    /// Nothing classified yet this session
    #[default]
    Idle,
    Cite,
    Label,
    Both,
}

/// An index that can supply candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Labels,
    Bibliography,
}

impl CompletionContext {
    /// Indexers to run for this context, in concatenation order
    pub fn sources(self) -> &'static [CandidateSource] {
        match self {
            CompletionContext::Idle => &[],
            CompletionContext::Cite => &[CandidateSource::Bibliography],
            CompletionContext::Label => &[CandidateSource::Labels],
            CompletionContext::Both => &[CandidateSource::Labels, CandidateSource::Bibliography],
        }
    }
}

/// Result of classifying one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub context: CompletionContext,
    /// Whether completion should be offered for this line
    pub activate: bool,
}

/// Per-session line classifier.
///
/// The context survives lines that match neither pattern, so the candidate
/// step still knows what the last relevant line asked for.
#[derive(Debug, Default)]
pub struct ContextClassifier {
    context: CompletionContext,
}

impl ContextClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> CompletionContext {
        self.context
    }

    pub fn classify(&mut self, line: &str) -> Classification {
        let patterns = patterns();
        let cite = patterns.cite.is_match(line);
        let reference = patterns.reference.is_match(line);

        self.context = match (cite, reference) {
            (true, true) => CompletionContext::Both,
            (true, false) => CompletionContext::Cite,
            (false, true) => CompletionContext::Label,
            (false, false) => self.context,
        };

        log::trace!(
            "Classified line (cite={}, ref={}) as {:?}",
            cite,
            reference,
            self.context
        );

        Classification {
            context: self.context,
            activate: cite || reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cite_line() {
        let mut classifier = ContextClassifier::new();
        assert_eq!(
            classifier.classify(r"\cite{"),
            Classification {
                context: CompletionContext::Cite,
                activate: true
            }
        );
    }

    #[test]
    fn test_cite_variants() {
        let mut classifier = ContextClassifier::new();
        for line in [r"\citep[p.~4]{", r"\textcite{", r"see \citeauthor{knuth"] {
            assert_eq!(classifier.classify(line).context, CompletionContext::Cite, "{line}");
        }
    }

    #[test]
    fn test_ref_line() {
        let mut classifier = ContextClassifier::new();
        assert_eq!(
            classifier.classify(r"\ref{"),
            Classification {
                context: CompletionContext::Label,
                activate: true
            }
        );
        assert_eq!(classifier.classify(r"\pageref{").context, CompletionContext::Label);
    }

    #[test]
    fn test_plain_line_keeps_context() {
        let mut classifier = ContextClassifier::new();
        let plain = classifier.classify("just prose");
        assert_eq!(plain.context, CompletionContext::Idle);
        assert!(!plain.activate);

        classifier.classify(r"\ref{");
        let plain = classifier.classify("more prose");
        assert_eq!(plain.context, CompletionContext::Label);
        assert!(!plain.activate);
    }

    #[test]
    fn test_both_on_one_line() {
        let mut classifier = ContextClassifier::new();
        let both = classifier.classify(r"\cite{a} and \ref{");
        assert_eq!(both.context, CompletionContext::Both);
        assert!(both.activate);
    }

    #[test]
    fn test_both_needs_same_line() {
        let mut classifier = ContextClassifier::new();
        classifier.classify(r"\cite{");
        assert_eq!(classifier.classify(r"\ref{").context, CompletionContext::Label);
        assert_eq!(classifier.classify(r"\cite{").context, CompletionContext::Cite);
    }

    #[test]
    fn test_sources_order() {
        assert!(CompletionContext::Idle.sources().is_empty());
        assert_eq!(CompletionContext::Cite.sources(), &[CandidateSource::Bibliography]);
        assert_eq!(CompletionContext::Label.sources(), &[CandidateSource::Labels]);
        assert_eq!(
            CompletionContext::Both.sources(),
            &[CandidateSource::Labels, CandidateSource::Bibliography]
        );
    }

    #[test]
    fn test_find_reference() {
        assert_eq!(find_reference(r"See \ref{fig1}"), Some(5..9));
        assert_eq!(find_reference(r"p. \pageref{x}"), Some(4..12));
        assert_eq!(find_reference("nothing"), None);
    }
}
