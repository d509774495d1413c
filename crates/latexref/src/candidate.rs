//
// candidate.rs
//
// Completion candidate shared by every indexer
//

/// A completion suggestion: the identifier to insert plus optional detail text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub identifier: String,
    pub detail: Option<String>,
}

impl Candidate {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            detail: None,
        }
    }

    pub fn with_detail(identifier: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            detail: Some(detail.into()),
        }
    }
}
