//! jsonkit store: a mutable JSON document addressed by paths.
//!
//! The crate is layered the same way the rest of jsonkit is:
//!
//! - [`query`]: resolvers, conditions and the miss policy
//! - [`mutation`]: the write engine every store operation goes through
//! - [`Store`]: the document, its query cursor, and import/export
//!
//! # Example
//!
//! ```rust
//! use jsonkit_core::Node;
//! use jsonkit_store::{Condition, Filter, Store};
//!
//! let mut store = Store::new();
//! store.append("/books", serde_json::json!({"title": "Emma", "year": 1815})).unwrap();
//! store.append("/books", serde_json::json!({"title": "Ulysses", "year": 1922})).unwrap();
//!
//! let modern = ["year>1900".parse::<Condition>().unwrap()];
//! let title = store.find("/books", &modern, Filter::First).unwrap();
//! assert_eq!(title.get(&"title".into()), Some(&Node::from("Ulysses")));
//! ```

mod config;
pub mod mutation;
mod persist;
pub mod query;
mod store;
mod traits;

pub use config::StoreConfig;
pub use mutation::{extend, mutate, Mode, Mutation, Outcome};
pub use persist::{ExportSink, ImportSource};
pub use query::{Condition, Filter, MissPolicy, Operator, PathResolver, Resolved, Resolver};
pub use store::{Store, StoreBuilder};
pub use traits::{DocumentStore, Reader, Writer};
