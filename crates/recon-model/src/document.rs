//! Document handles.
//!
//! A handle owns the raw bytes of one uploaded file together with the name
//! the user gave it. The bytes are never inspected locally; the service
//! does all parsing. A SHA-256 fingerprint lets the workflow tell a real
//! replacement apart from re-selecting the same file.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::DocumentError;

/// Which side of the comparison a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSide {
    /// The base document (first upload).
    Source,
    /// The document audited against the base (second upload).
    Target,
}

impl DocumentSide {
    /// Get the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for DocumentSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user-supplied file plus its declared name.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone)]
pub struct DocumentHandle {
    name: String,
    bytes: Arc<[u8]>,
    fingerprint: String,
}

impl DocumentHandle {
    /// Create a handle from in-memory bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        let fingerprint = hex::encode(Sha256::digest(&bytes));
        Self {
            name: name.into(),
            bytes: Arc::from(bytes),
            fingerprint,
        }
    }

    /// Read a document from disk, using the file name as declared name.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocumentError::NoFileName {
                path: path.to_path_buf(),
            })?
            .to_string();
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(name, bytes))
    }

    /// Declared file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the file has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the contents.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// True when both handles carry the same contents, whatever their names.
    pub fn is_same_document(&self, other: &DocumentHandle) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}
