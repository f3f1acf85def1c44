//! The mutation engine.
//!
//! Every write operation of the store funnels into [`mutate`]: the target
//! path is split into a container path and a final key, the container is
//! resolved, and the [`Mode`] decides what happens to the key inside it.
//! When the container does not exist, creating modes fall back to
//! [`extend`], which builds the missing structure.

use jsonkit_codec::Algorithm;
use jsonkit_core::{Error, Node, Path, Position, Segment};

use crate::query::{MissPolicy, Resolver};

/// How a mutation treats its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Set the value, creating the path if needed.
    Overwrite,
    /// Set the value only if the target already exists.
    StrictReplace,
    /// Set the value only if the target does not exist yet.
    AddOnly,
    /// Insert at the end of the target array.
    Append,
    /// Insert at the front of the target array.
    Prepend,
    /// Insert at an explicit position of the target array.
    Inject,
    /// Delete the target key.
    Remove,
    /// Replace the target with null.
    Reset,
    /// Replace the target with its encoded text.
    Serialize(Algorithm),
}

impl Mode {
    fn creates(&self) -> bool {
        matches!(
            self,
            Mode::Overwrite | Mode::AddOnly | Mode::Append | Mode::Prepend | Mode::Inject
        )
    }

    fn inserts(&self) -> bool {
        matches!(self, Mode::Append | Mode::Prepend | Mode::Inject)
    }
}

/// What a mutation did.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Applied,
    /// Target already existed and the mode left it alone.
    Unchanged,
    /// Target was missing; carries the miss policy's default value.
    Default(Node),
}

/// Parameters of a single mutation.
pub struct Mutation<'a> {
    pub mode: Mode,
    pub position: Option<Position>,
    pub typesafe: bool,
    pub resolver: &'a dyn Resolver,
    pub miss: &'a MissPolicy,
}

impl<'a> Mutation<'a> {
    pub fn new(mode: Mode, resolver: &'a dyn Resolver, miss: &'a MissPolicy) -> Self {
        Self {
            mode,
            position: None,
            typesafe: false,
            resolver,
            miss,
        }
    }

    #[must_use]
    pub fn position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn typesafe(mut self, typesafe: bool) -> Self {
        self.typesafe = typesafe;
        self
    }

    fn insert_position(&self) -> Position {
        match (self.mode, self.position) {
            (Mode::Append, _) => Position::Last,
            (Mode::Prepend, _) => Position::First,
            (_, Some(position)) => position,
            (_, None) => Position::Last,
        }
    }

    fn missed(&self, path: &Path) -> Result<Outcome, Error> {
        self.miss.miss(path).map(Outcome::Default)
    }
}

/// Apply `mutation` to `tree` at `path`.
///
/// The root path addresses the whole tree: overwriting it replaces the
/// document, removing or resetting it leaves null behind.
pub fn mutate(
    tree: &mut Node,
    path: &Path,
    value: Node,
    mutation: &Mutation<'_>,
) -> Result<Outcome, Error> {
    let (parent, key) = path.split_last();
    let Some(key) = key else {
        return apply_whole(tree, value, mutation, path);
    };

    let container_path = match mutation.resolver.retrieve(tree, &parent) {
        Some(found) if tree.get(&found).is_some_and(Node::is_container) => found,
        _ => return fallback(tree, path, &key, value, mutation),
    };
    let Some(container) = tree.get_mut(&container_path) else {
        return fallback(tree, path, &key, value, mutation);
    };

    let key = match container {
        Node::Array(items) if !key.is_index() => match key.as_position() {
            Some(position) if mutation.mode.inserts() => {
                insert_at(items, position, value);
                return Ok(Outcome::Applied);
            }
            Some(position) => Segment::from(concrete_index(items, position)),
            None => key,
        },
        Node::Array(items) if mutation.mode == Mode::Inject => {
            let position = key.as_position().unwrap_or(Position::Last);
            insert_at(items, position, value);
            return Ok(Outcome::Applied);
        }
        _ => key,
    };

    if mutation.mode == Mode::Remove {
        return match remove_child(container, &key) {
            Some(_) => Ok(Outcome::Applied),
            None => mutation.missed(path),
        };
    }
    if let Some(slot) = container.child_mut(&key) {
        return apply_present(slot, value, mutation, path);
    }

    match mutation.mode {
        mode if mode.inserts() => {
            *slot(container, &key) = Node::Array(vec![value]);
            Ok(Outcome::Applied)
        }
        mode if mode.creates() => {
            *slot(container, &key) = value;
            Ok(Outcome::Applied)
        }
        _ => mutation.missed(path),
    }
}

fn apply_whole(
    tree: &mut Node,
    value: Node,
    mutation: &Mutation<'_>,
    path: &Path,
) -> Result<Outcome, Error> {
    match mutation.mode {
        Mode::Remove | Mode::Reset => {
            *tree = Node::Null;
            Ok(Outcome::Applied)
        }
        _ if !tree.is_null() => apply_present(tree, value, mutation, path),
        Mode::StrictReplace | Mode::Serialize(_) => mutation.missed(path),
        mode if mode.inserts() => {
            *tree = Node::Array(vec![value]);
            Ok(Outcome::Applied)
        }
        _ => {
            *tree = value;
            Ok(Outcome::Applied)
        }
    }
}

fn apply_present(
    slot: &mut Node,
    value: Node,
    mutation: &Mutation<'_>,
    path: &Path,
) -> Result<Outcome, Error> {
    match mutation.mode {
        Mode::AddOnly => Ok(Outcome::Unchanged),
        Mode::Remove | Mode::Reset => {
            *slot = Node::Null;
            Ok(Outcome::Applied)
        }
        Mode::Serialize(algorithm) => {
            *slot = Node::String(encode_text(slot, algorithm)?);
            Ok(Outcome::Applied)
        }
        Mode::Overwrite | Mode::StrictReplace => {
            if let (Some(position), Node::Array(items)) = (mutation.position, &mut *slot) {
                replace_at(items, position, value);
                return Ok(Outcome::Applied);
            }
            check_type(slot, &value, mutation.typesafe, path)?;
            *slot = value;
            Ok(Outcome::Applied)
        }
        Mode::Append | Mode::Prepend | Mode::Inject => {
            if let Node::Array(items) = slot {
                insert_at(items, mutation.insert_position(), value);
                return Ok(Outcome::Applied);
            }
            check_type(slot, &value, mutation.typesafe, path)?;
            *slot = value;
            Ok(Outcome::Applied)
        }
    }
}

fn fallback(
    tree: &mut Node,
    path: &Path,
    key: &Segment,
    value: Node,
    mutation: &Mutation<'_>,
) -> Result<Outcome, Error> {
    if !mutation.mode.creates() {
        return mutation.missed(path);
    }
    let value = if mutation.mode.inserts() && !(mutation.mode == Mode::Inject && key.is_index()) {
        Node::Array(vec![value])
    } else {
        value
    };
    extend(tree, path, value);
    Ok(Outcome::Applied)
}

fn check_type(existing: &Node, incoming: &Node, typesafe: bool, path: &Path) -> Result<(), Error> {
    if typesafe && existing.type_tag() != incoming.type_tag() {
        return Err(Error::TypeMismatch {
            path: path.to_string(),
            existing: existing.type_tag(),
            incoming: incoming.type_tag(),
        });
    }
    Ok(())
}

fn encode_text(node: &Node, algorithm: Algorithm) -> Result<String, Error> {
    let bytes = jsonkit_codec::encode(node, Some(algorithm))?;
    String::from_utf8(bytes).map_err(|_| Error::encode(algorithm, "encoded form is not text"))
}

/// Resolve a position against the current length; `Last` on an empty array
/// points one past the end.
fn concrete_index(items: &[Node], position: Position) -> usize {
    match position {
        Position::First => 0,
        Position::Last => items.len().saturating_sub(1),
        Position::Index(i) => i,
    }
}

fn insert_at(items: &mut Vec<Node>, position: Position, value: Node) {
    match position {
        Position::First => items.insert(0, value),
        Position::Index(i) if i < items.len() => items.insert(i, value),
        Position::Last | Position::Index(_) => items.push(value),
    }
}

fn replace_at(items: &mut Vec<Node>, position: Position, value: Node) {
    let index = concrete_index(items, position);
    if index >= items.len() {
        items.resize(index + 1, Node::Null);
    }
    items[index] = value;
}

fn remove_child(container: &mut Node, key: &Segment) -> Option<Node> {
    match container {
        Node::Object(map) => map.shift_remove(key.as_str()),
        Node::Array(items) => {
            let index = key.as_index()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

fn empty_container_for(next: &Segment) -> Node {
    if next.is_index() {
        Node::array()
    } else {
        Node::object()
    }
}

/// Write `value` at `path`, creating every missing container on the way.
///
/// Missing or scalar intermediates become arrays when the following segment
/// is numeric and objects otherwise. An index past the end of an array pads
/// it with nulls; a non-numeric key on an array turns it into an object.
pub fn extend(tree: &mut Node, path: &Path, value: Node) {
    log::trace!("extending document along {}", path);
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        *tree = value;
        return;
    };

    let mut current = tree;
    for (i, segment) in parents.iter().enumerate() {
        let child = slot(current, segment);
        if !child.is_container() {
            *child = empty_container_for(&segments[i + 1]);
        }
        current = child;
    }
    *slot(current, last) = value;
}

fn slot<'a>(current: &'a mut Node, segment: &Segment) -> &'a mut Node {
    if !current.is_container() {
        *current = empty_container_for(segment);
    }
    match (current, segment.as_index()) {
        (Node::Array(items), Some(index)) => {
            if index >= items.len() {
                items.resize(index + 1, Node::Null);
            }
            &mut items[index]
        }
        (other, _) => other
            .coerce_object()
            .entry(segment.as_str().to_string())
            .or_insert(Node::Null),
    }
}
