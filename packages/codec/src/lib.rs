//! jsonkit codec: transport encodings and encryption.
//!
//! This layer turns documents into bytes and back:
//! - `Algorithm`: the closed set of transport encodings (JSON, base64, ROT13, uuencode)
//! - `serial`: the marked MessagePack byte form used before byte transforms
//! - `crypto`: symmetric encryption with a hash-derived key schedule
//!
//! # Example
//!
//! ```rust
//! use jsonkit_codec::{decode, encode, Algorithm};
//! use jsonkit_core::Node;
//!
//! let doc = Node::from(serde_json::json!({"name": "jsonkit"}));
//! let bytes = encode(&doc, Some(Algorithm::Base64)).unwrap();
//! assert_eq!(decode(&bytes, Some(Algorithm::Base64)).unwrap(), doc);
//! ```

pub use bytes::Bytes;

mod algorithm;
mod codec;
pub mod crypto;
pub mod serial;
mod transform;

pub use algorithm::Algorithm;
pub use codec::{decode, encode, Codec, StandardCodec};
pub use crypto::{BlockMode, Cipher, CryptoConfig, CryptoHook, HashAlgorithm, NonceStrategy};
pub use transform::{rot13, uudecode, uuencode};
