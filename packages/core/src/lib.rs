//! jsonkit core: document model.
//!
//! This layer defines what a jsonkit document is made of:
//! - `Node`: JSON-shaped tree with ordered objects
//! - `Path`: normalized slash-delimited address into a tree
//! - `Position`: array edit positions (`first`, `last`, index)
//! - `Error`: the error taxonomy shared by codec and store layers
//!
//! # Example
//!
//! ```rust
//! use jsonkit_core::{path, Node};
//!
//! let doc = Node::from(serde_json::json!({"store": {"name": "corner"}}));
//! assert_eq!(doc.get(&path!("/store/name")), Some(&Node::from("corner")));
//! ```

mod error;
mod node;
mod path;

pub use error::{AlgorithmKind, Error};
pub use node::{Node, Object, TypeTag};
pub use path::{Path, PathBuilder, Position, Segment};
