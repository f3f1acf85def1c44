//! Where documents come from and where they go.

use std::io::Write;
use std::path::{Path as FsPath, PathBuf};

use jsonkit_core::{Error, Node};

use crate::store::Store;

/// Input accepted by [`Store::import`].
#[derive(Clone, Debug, PartialEq)]
pub enum ImportSource {
    /// An in-memory tree, taken as is.
    Node(Node),
    /// JSON text, parsed whatever the store's transport encoding.
    Json(String),
    /// Encoded or encrypted text.
    Text(String),
    /// Encoded, serialized or encrypted bytes.
    Bytes(Vec<u8>),
    /// A file to load. A file that does not exist yet is bound to the store
    /// for later saves, provided its directory exists.
    File(PathBuf),
}

impl ImportSource {
    /// Classify a string argument.
    ///
    /// A JSON object or array is JSON; an existing file, or a file name whose
    /// directory exists, becomes a file source; anything else is treated as
    /// encoded text.
    pub fn detect(raw: &str) -> Self {
        let trimmed = raw.trim();
        if looks_like_json(trimmed.as_bytes())
            && serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok()
        {
            return ImportSource::Json(raw.to_string());
        }

        let candidate = FsPath::new(trimmed);
        if !trimmed.is_empty() && !trimmed.contains('\n') {
            if candidate.is_file() {
                return ImportSource::File(candidate.to_path_buf());
            }
            if candidate.extension().is_some() && bindable(candidate) {
                return ImportSource::File(candidate.to_path_buf());
            }
        }
        ImportSource::Text(raw.to_string())
    }
}

impl From<Node> for ImportSource {
    fn from(node: Node) -> Self {
        ImportSource::Node(node)
    }
}

impl From<PathBuf> for ImportSource {
    fn from(path: PathBuf) -> Self {
        ImportSource::File(path)
    }
}

impl From<Vec<u8>> for ImportSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImportSource::Bytes(bytes)
    }
}

impl From<&str> for ImportSource {
    fn from(raw: &str) -> Self {
        ImportSource::detect(raw)
    }
}

/// Output accepted by [`Store::export`].
pub enum ExportSink<'a> {
    /// Hand the payload back to the caller.
    Return,
    /// Write the payload to an open stream.
    Writer(&'a mut dyn Write),
    /// Pass the payload, the key and the store to a callback.
    Callback(&'a mut dyn FnMut(&[u8], Option<&str>, &Store)),
    /// Replace a file atomically.
    File(PathBuf),
}

fn looks_like_json(bytes: &[u8]) -> bool {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    matches!(first, Some(b'{' | b'['))
}

/// Parse `bytes` when they hold a JSON object or array.
pub(crate) fn json_document(bytes: &[u8]) -> Option<Node> {
    if !looks_like_json(bytes) {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// A missing file can be bound when the directory it would live in exists.
pub(crate) fn bindable(path: &FsPath) -> bool {
    match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => true,
        Some(dir) => dir.is_dir(),
        None => false,
    }
}

pub(crate) fn read_file(path: &FsPath) -> Result<Vec<u8>, Error> {
    log::debug!("Reading document from {}", path.display());
    std::fs::read(path).map_err(|e| Error::invalid_file(path, e.to_string()))
}

pub(crate) fn write_stream(writer: &mut dyn Write, payload: &[u8]) -> Result<(), Error> {
    writer
        .write_all(payload)
        .and_then(|()| writer.flush())
        .map_err(|e| Error::invalid_file("<stream>", format!("unable to write: {}", e)))
}

/// Write `payload` to a temporary file next to `path`, then rename it over
/// `path`. Readers see either the old or the new document, never a torn one.
pub(crate) fn write_atomic(path: &FsPath, payload: &[u8]) -> Result<(), Error> {
    log::debug!("Writing document to {}", path.display());
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => FsPath::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::invalid_file(path, format!("unable to create temporary file: {}", e)))?;
    temp.write_all(payload)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| Error::invalid_file(path, e.to_string()))?;
    temp.persist(path)
        .map_err(|e| Error::invalid_file(path, e.error.to_string()))?;
    Ok(())
}
