//! The Node type - a JSON-shaped document tree.
//!
//! A `Node` is what a jsonkit store holds and mutates. It maps directly onto
//! JSON, but keeps integers and floats apart so that typesafe overwrites can
//! tell them apart.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::path::{Path, Segment};

/// Ordered object map. Keys keep their insertion order.
pub type Object = IndexMap<String, Node>;

/// A node in a document tree.
///
/// # Design Notes
///
/// - Objects use `IndexMap` so that keys come back in insertion order
/// - Containers own their children exclusively; a tree never has cycles
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Node>),
    Object(Object),
}

/// Runtime type tag of a node, used for typesafe overwrites and merges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Null => "null",
            TypeTag::Boolean => "boolean",
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    /// Create an empty object.
    pub fn object() -> Self {
        Node::Object(Object::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Node::Array(Vec::new())
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Node::Null => TypeTag::Null,
            Node::Bool(_) => TypeTag::Boolean,
            Node::Int(_) => TypeTag::Integer,
            Node::Float(_) => TypeTag::Float,
            Node::String(_) => TypeTag::String,
            Node::Array(_) => TypeTag::Array,
            Node::Object(_) => TypeTag::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    /// True for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Array(_) | Node::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the node, accepting ints, floats and numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Int(i) => Some(*i as f64),
            Node::Float(f) => Some(*f),
            Node::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Number of direct children, zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Node::Array(arr) => arr.len(),
            Node::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a direct child by segment.
    pub fn child(&self, segment: &Segment) -> Option<&Node> {
        match self {
            Node::Object(map) => map.get(segment.as_str()),
            Node::Array(arr) => arr.get(segment.as_index()?),
            _ => None,
        }
    }

    /// Get a mutable direct child by segment.
    pub fn child_mut(&mut self, segment: &Segment) -> Option<&mut Node> {
        match self {
            Node::Object(map) => map.get_mut(segment.as_str()),
            Node::Array(arr) => arr.get_mut(segment.as_index()?),
            _ => None,
        }
    }

    /// Get a reference to a nested node by path.
    ///
    /// Returns `None` if the path doesn't exist or walks through a scalar.
    pub fn get(&self, path: &Path) -> Option<&Node> {
        let mut current = self;
        for segment in path.iter() {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Get a mutable reference to a nested node by path.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let mut current = self;
        for segment in path.iter() {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Turn an array into an object keyed by stringified indices.
    ///
    /// Scalars become an empty object; objects are left alone.
    pub fn coerce_object(&mut self) -> &mut Object {
        if !self.is_object() {
            let entries = match std::mem::take(self) {
                Node::Array(arr) => arr
                    .into_iter()
                    .enumerate()
                    .map(|(i, node)| (i.to_string(), node))
                    .collect(),
                _ => Object::new(),
            };
            *self = Node::Object(entries);
        }
        match self {
            Node::Object(map) => map,
            _ => unreachable!("node was just coerced to an object"),
        }
    }

    /// Visit every entry depth-first, children before their parent entry.
    ///
    /// The callback receives the entry key, the entry itself and its full
    /// path. Returning `ControlFlow::Break` stops the walk immediately.
    pub fn walk_mut<F>(&mut self, callback: &mut F) -> std::ops::ControlFlow<()>
    where
        F: FnMut(&Segment, &mut Node, &Path) -> std::ops::ControlFlow<()>,
    {
        self.walk_mut_at(&Path::root(), callback)
    }

    fn walk_mut_at<F>(&mut self, base: &Path, callback: &mut F) -> std::ops::ControlFlow<()>
    where
        F: FnMut(&Segment, &mut Node, &Path) -> std::ops::ControlFlow<()>,
    {
        let mut visit = |key: Segment, child: &mut Node| {
            let path = base.child(key.clone());
            if child.is_container() {
                child.walk_mut_at(&path, callback)?;
            }
            callback(&key, child, &path)
        };

        match self {
            Node::Array(arr) => {
                for (i, child) in arr.iter_mut().enumerate() {
                    visit(Segment::from(i), child)?;
                }
            }
            Node::Object(map) => {
                for (key, child) in map.iter_mut() {
                    visit(Segment::new(key.clone()), child)?;
                }
            }
            _ => {}
        }
        std::ops::ControlFlow::Continue(())
    }
}

impl fmt::Display for Node {
    /// Compact JSON text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Int(i) => serializer.serialize_i64(*i),
            Node::Float(f) => serializer.serialize_f64(*f),
            Node::String(s) => serializer.serialize_str(s),
            Node::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-compatible value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(i64::try_from(v).map_or(Node::Float(v as f64), Node::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Node, E> {
        std::str::from_utf8(v)
            .map(|s| Node::String(s.to_string()))
            .map_err(|_| E::invalid_value(de::Unexpected::Bytes(v), &self))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut arr = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            arr.push(item);
        }
        Ok(Node::Array(arr))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Node, A::Error> {
        let mut map = Object::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, Node>()? {
            map.insert(k, v);
        }
        Ok(Node::Object(map))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Node, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

// Conversion from common types

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Node::Bool(v)
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Node::Int(v)
    }
}

impl From<i32> for Node {
    fn from(v: i32) -> Self {
        Node::Int(v as i64)
    }
}

impl From<usize> for Node {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or(Node::Float(v as f64), Node::Int)
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Float(v)
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Node::String(v)
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Node::String(v.to_string())
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(v: Vec<T>) -> Self {
        Node::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        v.map_or(Node::Null, Into::into)
    }
}

impl From<Object> for Node {
    fn from(v: Object) -> Self {
        Node::Object(v)
    }
}

impl From<serde_json::Value> for Node {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Node::Null,
            serde_json::Value::Bool(b) => Node::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Int(i)
                } else {
                    Node::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Node::String(s),
            serde_json::Value::Array(arr) => Node::Array(arr.into_iter().map(Node::from).collect()),
            serde_json::Value::Object(map) => {
                Node::Object(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<Node> for serde_json::Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Null => serde_json::Value::Null,
            Node::Bool(b) => serde_json::Value::Bool(b),
            Node::Int(i) => serde_json::Value::Number(i.into()),
            Node::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Node::String(s) => serde_json::Value::String(s),
            Node::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Node::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
