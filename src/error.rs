//! Error types shared by the encoder, the document loader and the dump writer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce the canonical text of a node.
///
/// Always fatal to the single encode call: no partial text is ever returned.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A shared child refers back to one of the nodes currently being encoded.
    #[error("cycle detected: node at depth {depth} refers to one of its ancestors")]
    Cycle { depth: usize },

    /// The tree is nested deeper than the configured limit.
    #[error("node nesting exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// A shared node is write-locked by the thread doing the encoding,
    /// typically because a cyclic node is being encoded through its own
    /// write guard.
    #[error("shared node at depth {depth} is write-locked by the encoding thread")]
    Locked { depth: usize },

    /// A field holds a value the structural encoder cannot represent
    /// (for instance a map with non-string keys).
    #[error("value cannot be encoded: {0}")]
    Unsupported(#[source] serde_json::Error),
}

/// The kind of JSON document a loader error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Query,
    Table,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Query => write!(f, "query"),
            DocumentKind::Table => write!(f, "table"),
        }
    }
}

/// Failure to read a query or table document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Error opening {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error reading {path:?} as {kind} JSON: {source}")]
    Parse {
        path: PathBuf,
        kind: DocumentKind,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Path of the document that failed to load.
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => path,
        }
    }
}

/// Failure while writing the dump of a query and its tables.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("failed to write dump: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
