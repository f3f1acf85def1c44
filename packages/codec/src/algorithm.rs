//! The closed set of transport algorithms.

use std::fmt;
use std::str::FromStr;

use jsonkit_core::{AlgorithmKind, Error};
use serde::{Deserialize, Serialize};

/// A transport encoding for documents.
///
/// Names are matched case-insensitively at the string boundary; anything
/// else is `UnsupportedAlgorithm`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Structural JSON text. No serialization fallback.
    #[default]
    Json,
    /// Standard base64 over a string or a serialized node.
    Base64,
    /// ROT13 letter rotation over a string or a serialized node.
    Rot13,
    /// Traditional uuencode body over a string or a serialized node.
    Uu,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Json,
        Algorithm::Base64,
        Algorithm::Rot13,
        Algorithm::Uu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Json => "json",
            Algorithm::Base64 => "base64",
            Algorithm::Rot13 => "rot13",
            Algorithm::Uu => "uu",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Algorithm::Json),
            "base64" => Ok(Algorithm::Base64),
            "rot13" => Ok(Algorithm::Rot13),
            "uu" | "uuencode" => Ok(Algorithm::Uu),
            _ => Err(Error::unsupported(AlgorithmKind::Codec, s)),
        }
    }
}
