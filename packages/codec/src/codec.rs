//! Encoding documents for transport.

use base64::Engine;
use bytes::Bytes;
use jsonkit_core::{Error, Node};

use crate::algorithm::Algorithm;
use crate::serial;
use crate::transform;

/// Codec for converting between nodes and transport bytes.
///
/// # Implementing Custom Codecs
///
/// ```rust
/// use bytes::Bytes;
/// use jsonkit_codec::Codec;
/// use jsonkit_core::{Error, Node};
///
/// struct Uppercase;
///
/// impl Codec for Uppercase {
///     fn encode(&self, node: &Node) -> Result<Bytes, Error> {
///         Ok(Bytes::from(node.to_string().to_uppercase()))
///     }
///
///     fn decode(&self, bytes: &[u8]) -> Result<Node, Error> {
///         Ok(serde_json::from_slice::<Node>(&bytes.to_ascii_lowercase())?)
///     }
/// }
/// ```
pub trait Codec: Send + Sync {
    /// Encode a node into transport bytes.
    fn encode(&self, node: &Node) -> Result<Bytes, Error>;

    /// Decode transport bytes into a node.
    fn decode(&self, bytes: &[u8]) -> Result<Node, Error>;
}

/// The built-in codec for one [`Algorithm`], or for the raw serialized form
/// when no algorithm is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardCodec {
    algorithm: Option<Algorithm>,
}

impl StandardCodec {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm: Some(algorithm),
        }
    }

    /// Codec for the raw serialized form.
    pub fn serialized() -> Self {
        Self { algorithm: None }
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }
}

impl Codec for StandardCodec {
    fn encode(&self, node: &Node) -> Result<Bytes, Error> {
        encode(node, self.algorithm).map(Bytes::from)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Node, Error> {
        decode(bytes, self.algorithm)
    }
}

/// Encode a node.
///
/// `Json` encodes structurally. The byte transforms work on the UTF-8 bytes
/// of a string node and on the serialized form of any other node. With no
/// algorithm, the node is serialized.
pub fn encode(node: &Node, algorithm: Option<Algorithm>) -> Result<Vec<u8>, Error> {
    let Some(algorithm) = algorithm else {
        return serial::to_bytes(node);
    };

    if algorithm == Algorithm::Json {
        return serde_json::to_vec(node).map_err(|e| Error::encode(algorithm, e.to_string()));
    }

    let payload = match node {
        Node::String(s) => s.as_bytes().to_vec(),
        other => serial::to_bytes(other)?,
    };

    Ok(match algorithm {
        Algorithm::Base64 => base64::engine::general_purpose::STANDARD
            .encode(payload)
            .into_bytes(),
        Algorithm::Rot13 => transform::rot13(&payload),
        Algorithm::Uu => transform::uuencode(&payload),
        Algorithm::Json => unreachable!("json is encoded structurally above"),
    })
}

/// Decode bytes produced by [`encode`].
///
/// After reversing a byte transform, a serialized payload is deserialized
/// once; anything else comes back as a string node. With no algorithm, the
/// bytes are deserialized if they are a serialized form and returned as a
/// string otherwise.
pub fn decode(bytes: &[u8], algorithm: Option<Algorithm>) -> Result<Node, Error> {
    let payload = match algorithm {
        None => return unwrap_payload(bytes.to_vec(), "serialized"),
        Some(Algorithm::Json) => {
            return serde_json::from_slice(bytes)
                .map_err(|e| Error::decode(Algorithm::Json, e.to_string()));
        }
        Some(Algorithm::Base64) => base64::engine::general_purpose::STANDARD
            .decode(bytes.trim_ascii())
            .map_err(|e| Error::decode(Algorithm::Base64, e.to_string()))?,
        Some(Algorithm::Rot13) => transform::rot13(bytes),
        Some(Algorithm::Uu) => transform::uudecode(bytes)?,
    };
    let name = algorithm.map_or("serialized", |a| a.as_str());
    unwrap_payload(payload, name)
}

fn unwrap_payload(payload: Vec<u8>, algorithm: &str) -> Result<Node, Error> {
    if serial::is_serialized(&payload) {
        return serial::from_bytes(&payload);
    }
    String::from_utf8(payload)
        .map(Node::String)
        .map_err(|_| Error::decode(algorithm, "payload is neither text nor a serialized node"))
}
