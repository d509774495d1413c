//
// config.rs
//
// Configuration for citation and label indexing
//

/// Which bibliography extraction strategy a session may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BibliographyParser {
    /// Record parser when compiled in, line matcher otherwise
    #[default]
    Auto,
    /// Always use the line matcher (keys only, no detail text)
    Fallback,
}

/// Indexer configuration, fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// File name suffix that marks bibliography files and the project root
    pub bibliography_extension: String,
    /// File name suffixes of documents scanned for labels
    pub document_extensions: Vec<String>,
    /// Maximum title length in citation detail text, suffix included
    pub title_max_length: usize,
    /// Bibliography extraction strategy preference
    pub bibliography_parser: BibliographyParser,
    /// Whether directory walks follow symbolic links
    pub follow_links: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            bibliography_extension: String::from(".bib"),
            document_extensions: vec![String::from(".tex")],
            title_max_length: 30,
            bibliography_parser: BibliographyParser::Auto,
            follow_links: false,
        }
    }
}

/// Parse indexer configuration from LSP settings.
///
/// Reads the top-level `latexref` section. Keys that are absent or carry a
/// value of the wrong shape keep their defaults. Returns `None` when the
/// section itself is missing.
pub fn parse_indexer_config(settings: &serde_json::Value) -> Option<IndexerConfig> {
    let section = settings.get("latexref")?;
    let mut config = IndexerConfig::default();

    if let Some(v) = section.get("bibliographyExtension").and_then(|v| v.as_str()) {
        if v.is_empty() {
            log::warn!("Ignoring empty bibliographyExtension setting");
        } else {
            config.bibliography_extension = v.to_string();
        }
    }
    if let Some(v) = section.get("documentExtensions").and_then(|v| v.as_array()) {
        let exts: Vec<String> = v
            .iter()
            .filter_map(|e| e.as_str())
            .filter(|e| !e.is_empty())
            .map(String::from)
            .collect();
        if exts.is_empty() {
            log::warn!("Ignoring documentExtensions setting without usable entries");
        } else {
            config.document_extensions = exts;
        }
    }
    if let Some(v) = section.get("titleMaxLength").and_then(|v| v.as_u64()) {
        // Shorter than the ellipsis leaves nothing to show
        if v < 4 {
            log::warn!("Ignoring titleMaxLength {} (minimum is 4)", v);
        } else {
            config.title_max_length = v as usize;
        }
    }
    if let Some(v) = section
        .get("bibliography")
        .and_then(|b| b.get("parser"))
        .and_then(|v| v.as_str())
    {
        config.bibliography_parser = match v {
            "fallback" | "regex" => BibliographyParser::Fallback,
            "auto" | "structured" => BibliographyParser::Auto,
            other => {
                log::warn!("Unknown bibliography parser '{}', using auto", other);
                BibliographyParser::Auto
            }
        };
    }
    if let Some(v) = section.get("followLinks").and_then(|v| v.as_bool()) {
        config.follow_links = v;
    }

    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_values() {
        let config = IndexerConfig::default();
        assert_eq!(config.bibliography_extension, ".bib");
        assert_eq!(config.document_extensions, vec![".tex".to_string()]);
        assert_eq!(config.title_max_length, 30);
        assert_eq!(config.bibliography_parser, BibliographyParser::Auto);
        assert!(!config.follow_links);
    }

    #[test]
    fn test_missing_section() {
        assert!(parse_indexer_config(&json!({ "other": {} })).is_none());
    }

    #[test]
    fn test_absent_keys_keep_defaults() {
        let config = parse_indexer_config(&json!({ "latexref": {} })).unwrap();
        assert_eq!(config, IndexerConfig::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let settings = json!({
            "latexref": {
                "bibliographyExtension": ".bibtex",
                "documentExtensions": [".tex", ".ltx"],
                "titleMaxLength": 50,
                "bibliography": { "parser": "fallback" },
                "followLinks": true
            }
        });
        let config = parse_indexer_config(&settings).unwrap();
        assert_eq!(config.bibliography_extension, ".bibtex");
        assert_eq!(config.document_extensions, vec![".tex".to_string(), ".ltx".to_string()]);
        assert_eq!(config.title_max_length, 50);
        assert_eq!(config.bibliography_parser, BibliographyParser::Fallback);
        assert!(config.follow_links);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let settings = json!({
            "latexref": {
                "bibliographyExtension": "",
                "documentExtensions": [],
                "titleMaxLength": 2,
                "bibliography": { "parser": "magic" }
            }
        });
        let config = parse_indexer_config(&settings).unwrap();
        assert_eq!(config, IndexerConfig::default());
    }
}
