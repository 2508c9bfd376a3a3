//! Core types: listing pages, the match set, and per-file download outcomes

use serde::Deserialize;
use std::collections::HashMap;

/// One candidate file from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    /// Opaque remote identifier, unique within the Drive namespace
    pub id: String,
    /// Display name the filter is applied to
    pub name: String,
}

/// One page of the cursor-paginated listing
///
/// Field names follow the Drive v3 `files.list` response so the page can be
/// decoded straight off the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilePage {
    /// Candidate files on this page
    #[serde(default)]
    pub files: Vec<RemoteFile>,
    /// Cursor for the next page; `None` on the last page
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Accumulated mapping of remote identifier → display name for every file
/// that passed the filter
///
/// Built page-by-page during the strictly sequential listing phase, then
/// handed read-only to the download coordinator. Insertion order is
/// irrelevant; downloads complete independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    entries: HashMap<String, String>,
}

impl MatchSet {
    /// Create an empty match set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a match. Duplicate identifiers overwrite, which cannot occur
    /// given remote identifier uniqueness.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.entries.insert(id.into(), name.into());
    }

    /// Number of matched files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no file matched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name for a remote identifier, if it matched
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Iterate over `(identifier, display name)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

impl FromIterator<(String, String)> for MatchSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Classification of how a single transfer ended
///
/// Machine-readable so consumers can distinguish failure stages without
/// parsing log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The full byte stream was written to the local file
    Success,
    /// Opening the remote content stream failed
    StreamError,
    /// Creating or truncating the local file failed
    LocalWriteError,
    /// Copying bytes from the remote stream into the local file failed
    CopyError,
}

impl OutcomeKind {
    /// Whether the transfer completed successfully
    pub fn is_success(self) -> bool {
        matches!(self, OutcomeKind::Success)
    }

    /// Stable lowercase label for logs
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::StreamError => "stream_error",
            OutcomeKind::LocalWriteError => "local_write_error",
            OutcomeKind::CopyError => "copy_error",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file result reported by the download coordinator
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Remote identifier of the file
    pub id: String,
    /// Display name (also the local file name)
    pub name: String,
    /// How the transfer ended
    pub kind: OutcomeKind,
}
