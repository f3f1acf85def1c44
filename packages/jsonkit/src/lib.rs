//! jsonkit: a mutable JSON document store addressed by paths.
//!
//! Documents are trees of [`Node`]s. A [`Store`] owns one document and
//! exposes path-based reads and writes, conditional queries with a chaining
//! cursor, and import/export through transport encodings or encryption.
//!
//! The crates behind this one can be used on their own:
//! - `jsonkit-core`: `Node`, `Path` and the shared `Error`
//! - `jsonkit-codec`: transport encodings and the cipher layer
//! - `jsonkit-store`: resolvers, the mutation engine and `Store`
//!
//! # Example
//!
//! ```rust
//! use jsonkit::{ExportSink, Node, Store};
//!
//! let mut store = Store::new();
//! store.set("/user/name", "ada").unwrap();
//! store.append("/user/roles", "admin").unwrap();
//!
//! let sealed = store.export(ExportSink::Return, Some("pass")).unwrap().unwrap();
//! let mut opened = Store::new();
//! opened.import(sealed, Some("pass")).unwrap();
//! assert_eq!(opened.get_at("/user/roles/0").unwrap(), Node::from("admin"));
//! ```

pub use jsonkit_core::{path, AlgorithmKind, Error, Node, Object, Path, PathBuilder, Position, Segment, TypeTag};

pub use jsonkit_codec::{
    crypto, decode, encode, serial, Algorithm, BlockMode, Cipher, Codec, CryptoConfig, CryptoHook,
    HashAlgorithm, NonceStrategy, StandardCodec,
};

pub use jsonkit_store::{
    mutation, query, Condition, DocumentStore, ExportSink, Filter, ImportSource, MissPolicy,
    Reader, Resolved, Resolver, Store, StoreBuilder, StoreConfig, Writer,
};
