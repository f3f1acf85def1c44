//! The document store.

use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use jsonkit_codec::{crypto, serial, Algorithm, Codec, CryptoHook, StandardCodec};
use jsonkit_core::{Error, Node, Path, Position, Segment};

use crate::config::StoreConfig;
use crate::mutation::{mutate, Mode, Mutation};
use crate::persist::{self, ExportSink, ImportSource};
use crate::query::{Condition, Filter, PathResolver, Resolved, Resolver};

/// The target of a chained query.
#[derive(Clone, Debug)]
enum Cursor {
    Handle(Path),
    /// Detached result; writes to it are copied back to `sources`.
    Materialized { node: Node, sources: Vec<Path> },
}

/// A mutable JSON document addressed by paths.
///
/// Reads and writes take `/`-separated paths. [`Store::query`] narrows the
/// store to a cursor; until the next `get` or `init`, writes are relative to
/// that cursor.
///
/// ```rust
/// use jsonkit_core::Node;
/// use jsonkit_store::Store;
///
/// let mut store = Store::new();
/// store.set("/store/book/0/title", "Moby Dick").unwrap();
/// store.query("/store/book/0").unwrap().set("price", 8.99).unwrap();
///
/// assert_eq!(store.get_at("/store/book/0/price").unwrap(), Node::from(8.99));
/// ```
pub struct Store {
    root: Node,
    cursor: Option<Cursor>,
    config: StoreConfig,
    key: Option<String>,
    hook: Option<Arc<dyn CryptoHook>>,
    codec: Arc<dyn Codec>,
    file: Option<PathBuf>,
    resolver: Arc<dyn Resolver>,
}

impl Default for Store {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            root: Node::Null,
            cursor: None,
            codec: Arc::new(StandardCodec::new(config.algorithm)),
            config,
            key: None,
            hook: None,
            file: None,
            resolver: Arc::new(PathResolver),
        }
    }

    pub fn from_node(root: impl Into<Node>) -> Self {
        let mut store = Self::new();
        store.root = root.into();
        store
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The whole document.
    pub fn object(&self) -> &Node {
        &self.root
    }

    /// Replace the whole document. Clears the cursor.
    pub fn set_object(&mut self, root: impl Into<Node>) -> &mut Self {
        self.root = root.into();
        self.cursor = None;
        self
    }

    pub fn into_node(self) -> Node {
        self.root
    }

    /// File bound by a file import, if any.
    pub fn file(&self) -> Option<&FsPath> {
        self.file.as_deref()
    }

    // ---- Reads ----

    /// Value at the cursor, or the whole document without one. Clears the
    /// cursor.
    pub fn get(&mut self) -> Result<Node, Error> {
        match self.cursor.take() {
            None => Ok(self.root.clone()),
            Some(cursor) => self.cursor_value(cursor),
        }
    }

    /// Value at `path`, resolved from the document root. Clears the cursor.
    pub fn get_at(&mut self, path: impl Into<Path>) -> Result<Node, Error> {
        self.cursor = None;
        let path = path.into();
        match self.view(&path) {
            Some(node) => Ok(node.clone()),
            None => self.config.miss.miss(&path),
        }
    }

    /// Value at `path` narrowed by `conditions`, resolved from the root.
    ///
    /// With [`Filter::All`] the matches come back as an array.
    pub fn find(
        &mut self,
        path: impl Into<Path>,
        conditions: &[Condition],
        filter: Filter,
    ) -> Result<Node, Error> {
        self.cursor = None;
        let path = path.into();
        match self.resolver.find(&self.root, &path, conditions, filter) {
            Some(Resolved::Handle(handle)) => match self.root.get(&handle) {
                Some(node) => Ok(node.clone()),
                None => self.config.miss.miss(&path),
            },
            Some(Resolved::Materialized { node, .. }) => Ok(node),
            None => self.config.miss.miss(&path),
        }
    }

    /// Borrow the value at `path` without copying it.
    pub fn view(&self, path: impl Into<Path>) -> Option<&Node> {
        let path = path.into();
        let handle = self.resolver.retrieve(&self.root, &path)?;
        self.root.get(&handle)
    }

    /// Canonical handle for the value at `path`.
    pub fn handle(&self, path: impl Into<Path>) -> Result<Path, Error> {
        let path = path.into();
        self.resolver
            .retrieve(&self.root, &path)
            .ok_or_else(|| Error::empty_result(&path))
    }

    /// Dereference a handle from [`Store::handle`].
    pub fn at(&self, handle: &Path) -> Option<&Node> {
        self.root.get(handle)
    }

    /// Dereference a handle for in-place edits.
    pub fn at_mut(&mut self, handle: &Path) -> Option<&mut Node> {
        self.root.get_mut(handle)
    }

    /// True if a value other than the miss default lives at `path`.
    pub fn has(&self, path: impl Into<Path>) -> bool {
        self.view(path)
            .is_some_and(|node| !self.config.miss.is_default(node))
    }

    /// True if a query cursor is pending.
    pub fn has_result(&self) -> bool {
        self.cursor.is_some()
    }

    /// Drop the cursor, returning its value if there was one.
    ///
    /// A cursor whose target has since disappeared resolves through the miss
    /// policy, so a strict store reports `EmptyResult`.
    pub fn init(&mut self) -> Result<Option<Node>, Error> {
        match self.cursor.take() {
            None => Ok(None),
            Some(cursor) => self.cursor_value(cursor).map(Some),
        }
    }

    fn cursor_value(&self, cursor: Cursor) -> Result<Node, Error> {
        match cursor {
            Cursor::Handle(handle) => match self.root.get(&handle) {
                Some(node) => Ok(node.clone()),
                None => self.config.miss.miss(&handle),
            },
            Cursor::Materialized { node, .. } => Ok(node),
        }
    }

    // ---- Queries ----

    /// Move the cursor to `path`, relative to the current cursor.
    pub fn query(&mut self, path: impl Into<Path>) -> Result<&mut Self, Error> {
        self.query_where(path, &[], Filter::First)
    }

    /// Move the cursor to the children of `path` matching `conditions`.
    ///
    /// A miss leaves the miss policy's default value as the cursor, or fails
    /// with `EmptyResult` under a strict policy.
    pub fn query_where(
        &mut self,
        path: impl Into<Path>,
        conditions: &[Condition],
        filter: Filter,
    ) -> Result<&mut Self, Error> {
        let path = path.into();
        let next = match self.cursor.take() {
            None => self
                .resolver
                .find(&self.root, &path, conditions, filter)
                .map(Cursor::from),
            Some(Cursor::Handle(base)) => self.root.get(&base).and_then(|scope| {
                self.resolver
                    .find(scope, &path, conditions, filter)
                    .map(|found| rebase(found, &base))
            }),
            Some(Cursor::Materialized { node, sources }) => self
                .resolver
                .find(&node, &path, conditions, filter)
                .map(|found| within(found, &node, &sources)),
        };

        let cursor = match next {
            Some(cursor) => cursor,
            None => Cursor::Materialized {
                node: self.config.miss.miss(&path)?,
                sources: Vec::new(),
            },
        };
        self.cursor = Some(cursor);
        Ok(self)
    }

    // ---- Writes ----

    fn apply(
        &mut self,
        path: Path,
        value: Node,
        mode: Mode,
        position: Option<Position>,
        typesafe: bool,
    ) -> Result<&mut Self, Error> {
        let mutation = Mutation::new(mode, self.resolver.as_ref(), &self.config.miss)
            .position(position)
            .typesafe(typesafe);

        match &mut self.cursor {
            None => {
                mutate(&mut self.root, &path, value, &mutation)?;
            }
            Some(Cursor::Handle(base)) => match self.root.get_mut(base) {
                Some(scope) => {
                    mutate(scope, &path, value, &mutation)?;
                }
                None => {
                    mutation.miss.miss(&*base)?;
                }
            },
            Some(Cursor::Materialized { node, sources }) => match removed_entry(&path, mode, node, sources) {
                Some(index) => {
                    let source = sources[index].clone();
                    log::debug!("removing {} through a query result", source);
                    let shifts = matches!(self.root.get(&source.split_last().0), Some(Node::Array(_)));
                    mutate(&mut self.root, &source, value, &mutation)?;
                    sources.remove(index);
                    if let Node::Array(items) = node {
                        items.remove(index);
                    }
                    if shifts {
                        shift_siblings(sources, &source);
                    }
                }
                None => {
                    let mut updated = node.clone();
                    mutate(&mut updated, &path, value, &mutation)?;
                    write_back(&mut self.root, &updated, sources, &path)?;
                    *node = updated;
                }
            },
        }
        Ok(self)
    }

    /// Set `value` at `path`, creating the path as needed.
    pub fn set(&mut self, path: impl Into<Path>, value: impl Into<Node>) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::Overwrite, None, false)
    }

    /// Set `value` at a position of the array at `path`.
    pub fn set_at(
        &mut self,
        path: impl Into<Path>,
        value: impl Into<Node>,
        position: Position,
    ) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::Overwrite, Some(position), false)
    }

    /// Set `value` at `path` unless something is already there.
    pub fn add(&mut self, path: impl Into<Path>, value: impl Into<Node>) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::AddOnly, None, false)
    }

    /// Add `key: value` under `path` unless the key is already there.
    pub fn add_entry(
        &mut self,
        path: impl Into<Path>,
        key: impl Into<Segment>,
        value: impl Into<Node>,
    ) -> Result<&mut Self, Error> {
        let path = path.into().child(key);
        self.apply(path, value.into(), Mode::AddOnly, None, false)
    }

    /// Replace the existing value at `path`. With `typesafe`, the new value
    /// must have the same type as the old one.
    pub fn replace(
        &mut self,
        path: impl Into<Path>,
        value: impl Into<Node>,
        typesafe: bool,
    ) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::StrictReplace, None, typesafe)
    }

    pub fn append(&mut self, path: impl Into<Path>, value: impl Into<Node>) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::Append, None, false)
    }

    pub fn prepend(&mut self, path: impl Into<Path>, value: impl Into<Node>) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::Prepend, None, false)
    }

    /// Insert `value` into the array at `path`. A numeric last segment is
    /// taken as the insert position.
    pub fn inject(&mut self, path: impl Into<Path>, value: impl Into<Node>) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::Inject, None, false)
    }

    pub fn inject_at(
        &mut self,
        path: impl Into<Path>,
        value: impl Into<Node>,
        position: Position,
    ) -> Result<&mut Self, Error> {
        self.apply(path.into(), value.into(), Mode::Inject, Some(position), false)
    }

    pub fn remove(&mut self, path: impl Into<Path>) -> Result<&mut Self, Error> {
        self.apply(path.into(), Node::Null, Mode::Remove, None, false)
    }

    /// Replace the value at `path` with null, keeping the key.
    pub fn reset(&mut self, path: impl Into<Path>) -> Result<&mut Self, Error> {
        self.apply(path.into(), Node::Null, Mode::Reset, None, false)
    }

    /// Move the value at `from` to `to`. Paths are resolved from the root.
    pub fn copy(&mut self, from: impl Into<Path>, to: impl Into<Path>) -> Result<&mut Self, Error> {
        let (from, to) = (from.into(), to.into());
        self.cursor = None;
        let value = self.view(&from).cloned().ok_or_else(|| Error::empty_result(&from))?;
        self.set(to, value)?;
        self.remove(from)
    }

    /// Merge the value at `from` into the value at `into`, then remove `from`.
    ///
    /// Both values must have the same type. Arrays gain the elements of
    /// `from` at the end; objects gain its entries, with `from` winning on
    /// shared keys; scalars are replaced.
    pub fn merge(&mut self, from: impl Into<Path>, into: impl Into<Path>) -> Result<&mut Self, Error> {
        let (from, into) = (from.into(), into.into());
        self.cursor = None;
        let incoming = self.view(&from).cloned().ok_or_else(|| Error::empty_result(&from))?;
        let target = self
            .root
            .get_mut(&into)
            .ok_or_else(|| Error::empty_result(&into))?;

        if target.type_tag() != incoming.type_tag() {
            return Err(Error::TypeMismatch {
                path: into.to_string(),
                existing: target.type_tag(),
                incoming: incoming.type_tag(),
            });
        }
        match (target, incoming) {
            (Node::Array(items), Node::Array(extra)) => items.extend(extra),
            (Node::Object(map), Node::Object(extra)) => map.extend(extra),
            (slot, value) => *slot = value,
        }
        self.remove(from)
    }

    /// Replace the value at `path` with its encoded text.
    pub fn serialize_at(&mut self, path: impl Into<Path>, algorithm: Algorithm) -> Result<&mut Self, Error> {
        self.apply(path.into(), Node::Null, Mode::Serialize(algorithm), None, false)
    }

    /// Decode the text stored at `path`.
    ///
    /// With no algorithm the text is decoded with the store's configured
    /// transport encoding.
    pub fn unserialize_at(
        &mut self,
        path: impl Into<Path>,
        algorithm: Option<Algorithm>,
    ) -> Result<Node, Error> {
        let algorithm = algorithm.unwrap_or(self.config.algorithm);
        match self.get_at(path)? {
            Node::String(text) => jsonkit_codec::decode(text.as_bytes(), Some(algorithm)),
            other => Err(Error::decode(
                algorithm,
                format!("expected encoded text, found {}", other.type_tag()),
            )),
        }
    }

    /// Visit every entry of the document depth-first, children before their
    /// parent. The callback may edit entries in place; `Break` stops the walk.
    pub fn iterate<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(&Segment, &mut Node, &Path) -> ControlFlow<()>,
    {
        let _ = self.root.walk_mut(&mut callback);
        self
    }

    // ---- Persistence ----

    /// Replace the document with `source`.
    ///
    /// JSON text is parsed as is. With a key (or the store's own key), any
    /// other payload is decrypted. Without one, serialized payloads are
    /// deserialized and anything else goes through the store's codec.
    pub fn import(&mut self, source: impl Into<ImportSource>, key: Option<&str>) -> Result<&Node, Error> {
        let key = key.map(str::to_string).or_else(|| self.key.clone());
        self.cursor = None;
        match source.into() {
            ImportSource::Node(node) => self.root = node,
            ImportSource::Json(text) => self.root = serde_json::from_str(&text)?,
            ImportSource::Text(text) => self.root = self.decode_payload(text.as_bytes(), key.as_deref())?,
            ImportSource::Bytes(bytes) => self.root = self.decode_payload(&bytes, key.as_deref())?,
            ImportSource::File(path) => {
                if path.is_file() {
                    let bytes = persist::read_file(&path)?;
                    self.root = self.decode_payload(&bytes, key.as_deref())?;
                } else if !persist::bindable(&path) {
                    return Err(Error::invalid_file(
                        &path,
                        "not a file, and its directory does not exist",
                    ));
                }
                self.file = Some(path);
            }
        }
        Ok(&self.root)
    }

    fn decode_payload(&self, bytes: &[u8], key: Option<&str>) -> Result<Node, Error> {
        if let Some(key) = key {
            return match &self.hook {
                Some(hook) => hook.decrypt(bytes, key),
                None => crypto::decrypt(bytes, key, &self.config.crypto),
            };
        }
        if let Some(node) = persist::json_document(bytes) {
            return Ok(node);
        }
        if serial::is_serialized(bytes) {
            return StandardCodec::serialized().decode(bytes);
        }
        self.codec.decode(bytes)
    }

    fn encode_payload(&self, key: Option<&str>) -> Result<Vec<u8>, Error> {
        match (key, &self.hook) {
            (Some(key), Some(hook)) => hook.encrypt(&self.root, key),
            (Some(key), None) => crypto::encrypt(&self.root, key, &self.config.crypto).map(String::into_bytes),
            (None, _) => self.codec.encode(&self.root).map(|bytes| bytes.to_vec()),
        }
    }

    /// Encode (or encrypt, given a key) the document and deliver it.
    ///
    /// Only [`ExportSink::Return`] hands the payload back.
    pub fn export(&self, sink: ExportSink<'_>, key: Option<&str>) -> Result<Option<Vec<u8>>, Error> {
        let key = key.or(self.key.as_deref());
        let payload = self.encode_payload(key)?;
        match sink {
            ExportSink::Return => return Ok(Some(payload)),
            ExportSink::Writer(writer) => persist::write_stream(writer, &payload)?,
            ExportSink::Callback(callback) => callback(&payload, key, self),
            ExportSink::File(path) => persist::write_atomic(&path, &payload)?,
        }
        Ok(None)
    }

    /// Write the document to the bound file, or return it when there is no
    /// file.
    pub fn save(&self, key: Option<&str>) -> Result<Option<Vec<u8>>, Error> {
        match &self.file {
            Some(path) => self.export(ExportSink::File(path.clone()), key),
            None => self.export(ExportSink::Return, key),
        }
    }
}

impl Clone for Store {
    /// Copies the document, configuration and bindings. The cursor and the
    /// key are not carried over.
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            cursor: None,
            config: self.config.clone(),
            key: None,
            hook: self.hook.clone(),
            codec: Arc::clone(&self.codec),
            file: self.file.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.root)
            .field("cursor", &self.cursor)
            .field("file", &self.file)
            .field("keyed", &self.key.is_some())
            .finish_non_exhaustive()
    }
}

impl From<Resolved> for Cursor {
    fn from(resolved: Resolved) -> Self {
        match resolved {
            Resolved::Handle(path) => Cursor::Handle(path),
            Resolved::Materialized { node, sources } => Cursor::Materialized { node, sources },
        }
    }
}

/// Lift a result found inside the subtree at `base` to document paths.
fn rebase(found: Resolved, base: &Path) -> Cursor {
    match found {
        Resolved::Handle(path) => Cursor::Handle(base.join(&path)),
        Resolved::Materialized { node, sources } => Cursor::Materialized {
            node,
            sources: sources.iter().map(|source| base.join(source)).collect(),
        },
    }
}

/// Map a path inside a materialized array back to the document.
fn locate(sources: &[Path], path: &Path) -> Option<Path> {
    let (first, rest) = path.segments().split_first()?;
    let source = sources.get(first.as_index()?)?;
    Some(source.join(&Path::from_segments(rest.to_vec())))
}

/// Lift a result found inside a materialized cursor.
fn within(found: Resolved, node: &Node, sources: &[Path]) -> Cursor {
    match found {
        Resolved::Handle(path) if path.is_root() => Cursor::Materialized {
            node: node.clone(),
            sources: sources.to_vec(),
        },
        Resolved::Handle(path) => match locate(sources, &path) {
            Some(handle) => Cursor::Handle(handle),
            None => Cursor::Materialized {
                node: node.get(&path).cloned().unwrap_or_default(),
                sources: Vec::new(),
            },
        },
        Resolved::Materialized { node, sources: inner } => {
            let mapped: Option<Vec<Path>> = inner.iter().map(|p| locate(sources, p)).collect();
            Cursor::Materialized {
                node,
                sources: mapped.unwrap_or_default(),
            }
        }
    }
}

/// Index of the cursor entry a write removes outright, when it does.
fn removed_entry(path: &Path, mode: Mode, node: &Node, sources: &[Path]) -> Option<usize> {
    if mode != Mode::Remove || path.len() != 1 {
        return None;
    }
    let index = path.last()?.as_index()?;
    match node {
        Node::Array(items) if items.len() == sources.len() && index < sources.len() => Some(index),
        _ => None,
    }
}

/// Renumber the entries that followed `removed` in its parent array.
fn shift_siblings(sources: &mut [Path], removed: &Path) {
    let (parent, Some(gone)) = removed.split_last() else {
        return;
    };
    let Some(gone) = gone.as_index() else {
        return;
    };
    let depth = parent.len();
    for source in sources.iter_mut() {
        let segments = source.segments();
        if segments.len() <= depth || &segments[..depth] != parent.segments() {
            continue;
        }
        if let Some(index) = segments[depth].as_index().filter(|&i| i > gone) {
            let mut shifted = segments.to_vec();
            shifted[depth] = Segment::from(index - 1);
            *source = Path::from_segments(shifted);
        }
    }
}

/// Copy a materialized result back over the entries it was drawn from.
///
/// A result that no longer has one element per entry can not be mapped back,
/// so the write is refused.
fn write_back(root: &mut Node, node: &Node, sources: &[Path], path: &Path) -> Result<(), Error> {
    if sources.is_empty() {
        return Ok(());
    }
    match node {
        Node::Array(items) if items.len() == sources.len() => {
            for (item, source) in items.iter().zip(sources) {
                if let Some(slot) = root.get_mut(source) {
                    *slot = item.clone();
                }
            }
            Ok(())
        }
        _ => Err(Error::InvalidPath {
            path: path.to_string(),
            message: format!(
                "write would change the shape of a query result drawn from {} entries",
                sources.len()
            ),
        }),
    }
}

/// Builder for a [`Store`] with non-default parts.
#[derive(Default)]
pub struct StoreBuilder {
    config: StoreConfig,
    key: Option<String>,
    hook: Option<Arc<dyn CryptoHook>>,
    codec: Option<Arc<dyn Codec>>,
    resolver: Option<Arc<dyn Resolver>>,
    source: Option<ImportSource>,
}

impl StoreBuilder {
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Key used for import and export when none is passed explicitly.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn crypto_hook(mut self, hook: impl CryptoHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Codec for unkeyed import and export, replacing the configured
    /// transport encoding.
    #[must_use]
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Document to import when the store is built.
    #[must_use]
    pub fn source(mut self, source: impl Into<ImportSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn build(self) -> Result<Store, Error> {
        self.config.crypto.validate()?;
        let mut store = Store::with_config(self.config);
        store.key = self.key;
        store.hook = self.hook;
        if let Some(codec) = self.codec {
            store.codec = codec;
        }
        if let Some(resolver) = self.resolver {
            store.resolver = resolver;
        }
        if let Some(source) = self.source {
            store.import(source, None)?;
        }
        Ok(store)
    }
}
