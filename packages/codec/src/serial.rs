//! The serialized byte form of a node.
//!
//! A serialized node is a four byte marker followed by MessagePack. The
//! marker starts with `0xC1`, a byte MessagePack never emits and UTF-8 never
//! contains, so serialized payloads cannot be confused with transported
//! strings.

use jsonkit_core::{Error, Node};

/// Marker prepended to every serialized node.
pub const MAGIC: [u8; 4] = [0xC1, b'J', b'K', 0x01];

const FORMAT: &str = "serialized";

/// Serialize a node to its byte form.
pub fn to_bytes(node: &Node) -> Result<Vec<u8>, Error> {
    let body = rmp_serde::to_vec(node).map_err(|e| Error::encode(FORMAT, e.to_string()))?;
    let mut out = Vec::with_capacity(MAGIC.len() + body.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Deserialize a node from its byte form.
pub fn from_bytes(bytes: &[u8]) -> Result<Node, Error> {
    let body = bytes
        .strip_prefix(&MAGIC[..])
        .ok_or_else(|| Error::decode(FORMAT, "missing serialized marker"))?;
    rmp_serde::from_slice(body).map_err(|e| Error::decode(FORMAT, e.to_string()))
}

/// True if `bytes` carry the marker and a decodable body.
pub fn is_serialized(bytes: &[u8]) -> bool {
    bytes.starts_with(&MAGIC) && from_bytes(bytes).is_ok()
}
