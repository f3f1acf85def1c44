//! Error types shared by every jsonkit layer.

use std::fmt;
use std::path::PathBuf;

use crate::node::TypeTag;

/// Errors raised by path resolution, mutation, codecs, crypto and file I/O.
///
/// Resolution misses surface as `EmptyResult` only when the store's miss
/// policy asks for it. Codec, crypto and file errors always propagate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no result found for path '{path}'")]
    EmptyResult { path: String },

    #[error("value at '{path}' is {existing} and can not be overwritten with {incoming}")]
    TypeMismatch {
        path: String,
        existing: TypeTag,
        incoming: TypeTag,
    },

    #[error("{kind} '{name}' is not supported")]
    UnsupportedAlgorithm { kind: AlgorithmKind, name: String },

    #[error("invalid file '{}': {message}", path.display())]
    InvalidFile { path: PathBuf, message: String },

    #[error("unable to decrypt document with the given key")]
    DecryptionFailed,

    #[error("invalid override: {message}")]
    InvalidOverride { message: String },

    #[error("encode error ({algorithm}): {message}")]
    Encode { algorithm: String, message: String },

    #[error("decode error ({algorithm}): {message}")]
    Decode { algorithm: String, message: String },

    #[error("encryption failed: {message}")]
    Encryption { message: String },

    #[error("invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn empty_result(path: impl fmt::Display) -> Self {
        Error::EmptyResult {
            path: path.to_string(),
        }
    }

    pub fn unsupported(kind: AlgorithmKind, name: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            kind,
            name: name.into(),
        }
    }

    pub fn encode(algorithm: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::Encode {
            algorithm: algorithm.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(algorithm: impl fmt::Display, message: impl Into<String>) -> Self {
        Error::Decode {
            algorithm: algorithm.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::InvalidFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for resolution misses, the only recoverable query outcome.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Error::EmptyResult { .. })
    }
}

/// Which closed algorithm family an unsupported name was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgorithmKind {
    Codec,
    Cipher,
    Hash,
    BlockMode,
    Filter,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlgorithmKind::Codec => "codec algorithm",
            AlgorithmKind::Cipher => "cipher",
            AlgorithmKind::Hash => "hash algorithm",
            AlgorithmKind::BlockMode => "block mode",
            AlgorithmKind::Filter => "query filter",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn empty_result_display() {
        let e = Error::empty_result("/store/book");
        assert_eq!(e.to_string(), "no result found for path '/store/book'");
        assert!(e.is_empty_result());
    }

    #[test]
    fn type_mismatch_display() {
        let e = Error::TypeMismatch {
            path: "/name".to_string(),
            existing: TypeTag::String,
            incoming: TypeTag::Integer,
        };
        let display = e.to_string();
        assert!(display.contains("/name"));
        assert!(display.contains("string"));
        assert!(display.contains("integer"));
        assert!(!e.is_empty_result());
    }

    #[test]
    fn unsupported_display() {
        let e = Error::unsupported(AlgorithmKind::Cipher, "des");
        assert_eq!(e.to_string(), "cipher 'des' is not supported");
    }

    #[test]
    fn invalid_file_display() {
        let e = Error::invalid_file("/tmp/missing/x.json", "no parent directory");
        let display = e.to_string();
        assert!(display.contains("/tmp/missing/x.json"));
        assert!(display.contains("no parent directory"));
    }

    #[test]
    fn codec_error_display() {
        let e = Error::decode("base64", "invalid padding");
        assert_eq!(e.to_string(), "decode error (base64): invalid padding");
        let e = Error::encode("rot13", "not text");
        assert!(e.to_string().contains("encode error"));
    }

    #[test]
    fn io_error_conversion_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn decryption_failed_has_no_source() {
        assert!(StdError::source(&Error::DecryptionFailed).is_none());
    }
}
