use serde::{Deserialize, Serialize};

use crate::Document;

/// Documents parsed from one captured source (usually one session log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    /// Name of the source the lines came from (file path or `-`).
    pub source: String,
    /// Documents in stream order.
    pub documents: Vec<Document>,
}

impl Capture {
    pub fn new(source: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            source: source.into(),
            documents,
        }
    }

    /// Returns the documents of one type, in stream order.
    pub fn documents_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents.iter().filter(move |doc| doc.kind == kind)
    }
}

/// Serializable bundle of captures handed to the storage collaborator.
///
/// # Examples
///
/// ```
/// use netlog_core::*;
///
/// let mut bundle = CaptureBundle::new("1.0.0", "2024-01-15T10:30:00Z");
/// bundle.captures.push(Capture::new("r1.log", vec![Document::new("arp")]));
/// bundle.captures.push(Capture::new("r2.log", vec![Document::new("arp"), Document::new("vlan")]));
///
/// assert_eq!(bundle.capture_count(), 2);
/// assert_eq!(bundle.document_count(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureBundle {
    /// Document contract version (populated from
    /// [`DOCUMENT_CONTRACT_VERSION`](crate::DOCUMENT_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_version: Option<String>,
    /// Bundle format version (semver string).
    pub version: String,
    /// ISO-8601 timestamp for bundle creation.
    pub generated_at: String,
    pub captures: Vec<Capture>,
}

impl CaptureBundle {
    pub fn new(version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            contract_version: Some(crate::DOCUMENT_CONTRACT_VERSION.to_string()),
            version: version.into(),
            generated_at: generated_at.into(),
            captures: Vec::new(),
        }
    }

    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    pub fn document_count(&self) -> usize {
        self.captures.iter().map(|c| c.documents.len()).sum()
    }
}
