//
// definition.rs
//
// Go-to-definition for cross-references
//

use std::path::PathBuf;

use crate::completion_context::find_reference;
use crate::error::NavigationError;
use crate::labels::LabelIndex;

/// Location of a label definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub file: PathBuf,
    /// 1-based line
    pub line: u32,
    /// 0-based character column
    pub column: u32,
    /// 0-based UTF-16 column
    pub utf16_column: u32,
}

/// Resolve the cross-reference on `line` to the label it names.
///
/// The identifier runs from the end of the first `ref{` / `pageref{` token to
/// the next `}` on the same line.
pub fn resolve_definition(line: &str, index: &LabelIndex) -> Result<NavigationTarget, NavigationError> {
    let token = find_reference(line).ok_or(NavigationError::NoReference)?;
    let rest = &line[token.end..];
    let close = rest.find('}').ok_or(NavigationError::Unterminated)?;
    let identifier = &rest[..close];

    let entry = index
        .get(identifier)
        .ok_or_else(|| NavigationError::UnknownLabel(identifier.to_string()))?;

    Ok(NavigationTarget {
        file: entry.file.clone(),
        line: entry.line,
        column: entry.column,
        utf16_column: entry.utf16_column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelEntry;
    use std::path::Path;

    fn index_with_fig1() -> LabelIndex {
        let mut index = LabelIndex::new();
        index.replace_file(
            Path::new("fileX.tex"),
            vec![LabelEntry {
                identifier: "fig1".to_string(),
                file: PathBuf::from("fileX.tex"),
                line: 7,
                column: 4,
                utf16_column: 4,
            }],
        );
        index
    }

    #[test]
    fn test_resolves_indexed_label() {
        let target = resolve_definition(r"See \ref{fig1} for details", &index_with_fig1()).unwrap();
        assert_eq!(target.file, PathBuf::from("fileX.tex"));
        assert_eq!((target.line, target.column), (7, 4));
    }

    #[test]
    fn test_pageref_resolves() {
        let target = resolve_definition(r"on page \pageref{fig1}", &index_with_fig1()).unwrap();
        assert_eq!(target.line, 7);
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(
            resolve_definition(r"See \ref{unknown}", &index_with_fig1()),
            Err(NavigationError::UnknownLabel("unknown".to_string()))
        );
    }

    #[test]
    fn test_no_reference_on_line() {
        assert_eq!(
            resolve_definition("See figure one", &index_with_fig1()),
            Err(NavigationError::NoReference)
        );
    }

    #[test]
    fn test_unterminated_reference() {
        assert_eq!(
            resolve_definition(r"See \ref{fig1", &index_with_fig1()),
            Err(NavigationError::Unterminated)
        );
    }

    #[test]
    fn test_first_reference_is_used() {
        let line = r"\ref{fig1} and \ref{unknown}";
        assert_eq!(resolve_definition(line, &index_with_fig1()).unwrap().line, 7);
    }

    #[test]
    fn test_spelling_must_match() {
        assert!(matches!(
            resolve_definition(r"\ref{Fig1}", &index_with_fig1()),
            Err(NavigationError::UnknownLabel(_))
        ));
    }
}
