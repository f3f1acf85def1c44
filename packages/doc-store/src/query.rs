//! Path resolution and conditional queries.
//!
//! A [`Resolver`] turns a path into a handle into the document. Plain lookups
//! go through [`Resolver::retrieve`]; lookups carrying conditions go through
//! [`Resolver::find`], which may produce a detached result when more than one
//! child matches.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use jsonkit_core::{AlgorithmKind, Error, Node, Path};
use serde::{Deserialize, Serialize};

/// Result of a conditional lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    /// Live location inside the document.
    Handle(Path),
    /// A detached array of matches together with the location each element
    /// was read from.
    Materialized { node: Node, sources: Vec<Path> },
}

/// Which matches a conditional lookup keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    First,
    Last,
    All,
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Filter::First),
            "last" => Ok(Filter::Last),
            "all" | "*" => Ok(Filter::All),
            _ => Err(Error::unsupported(AlgorithmKind::Filter, s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Operator {
    fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
        }
    }
}

/// A `field <op> value` test applied to the children of a container.
///
/// ```rust
/// use jsonkit_store::Condition;
/// use jsonkit_core::Node;
///
/// let cond: Condition = "price<10".parse().unwrap();
/// assert!(cond.matches(&Node::from(serde_json::json!({"price": 8.95}))));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    field: Path,
    operator: Operator,
    value: Node,
}

impl Condition {
    pub fn new(field: impl Into<Path>, operator: Operator, value: impl Into<Node>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Shorthand for an equality test.
    pub fn eq(field: impl Into<Path>, value: impl Into<Node>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    pub fn field(&self) -> &Path {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// True if `candidate` has the field and it compares as required.
    pub fn matches(&self, candidate: &Node) -> bool {
        let Some(actual) = candidate.get(&self.field) else {
            return false;
        };
        match self.operator {
            Operator::Eq => loose_eq(actual, &self.value),
            Operator::Ne => !loose_eq(actual, &self.value),
            Operator::Gt => loose_cmp(actual, &self.value) == Some(Ordering::Greater),
            Operator::Lt => loose_cmp(actual, &self.value) == Some(Ordering::Less),
            Operator::Ge => matches!(
                loose_cmp(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Le => matches!(
                loose_cmp(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

impl FromStr for Condition {
    type Err = Error;

    /// Parses `field=value`, `field!=value`, `field>=value` and friends. The
    /// value is read as JSON when it parses, and as a bare string otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidArgument {
            message: format!("'{}' is not a condition", s),
        };
        let at = s.find(['!', '=', '<', '>']).ok_or_else(invalid)?;
        let rest = &s[at..];
        let (operator, len) = if rest.starts_with("!=") {
            (Operator::Ne, 2)
        } else if rest.starts_with(">=") {
            (Operator::Ge, 2)
        } else if rest.starts_with("<=") {
            (Operator::Le, 2)
        } else if rest.starts_with('=') {
            (Operator::Eq, 1)
        } else if rest.starts_with('>') {
            (Operator::Gt, 1)
        } else if rest.starts_with('<') {
            (Operator::Lt, 1)
        } else {
            return Err(invalid());
        };

        let field = s[..at].trim();
        if field.is_empty() {
            return Err(invalid());
        }
        let raw = rest[len..].trim();
        let value = serde_json::from_str::<Node>(raw).unwrap_or_else(|_| Node::from(raw));
        Ok(Condition::new(Path::parse(field), operator, value))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.to_string();
        write!(
            f,
            "{}{}{}",
            field.trim_start_matches('/'),
            self.operator.as_str(),
            self.value
        )
    }
}

fn loose_text(node: &Node) -> Option<String> {
    match node {
        Node::String(s) => Some(s.clone()),
        Node::Null => Some(String::new()),
        Node::Bool(_) | Node::Int(_) | Node::Float(_) => Some(node.to_string()),
        Node::Array(_) | Node::Object(_) => None,
    }
}

fn loose_eq(left: &Node, right: &Node) -> bool {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a == b;
    }
    match (loose_text(left), loose_text(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn loose_cmp(left: &Node, right: &Node) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a.partial_cmp(&b);
    }
    Some(loose_text(left)?.cmp(&loose_text(right)?))
}

/// Turns paths into handles into a document.
///
/// # Object Safety
///
/// This trait is object-safe; stores hold an `Arc<dyn Resolver>`.
pub trait Resolver: Send + Sync {
    /// Locate the node at `path`. Returns the canonical handle for it, or
    /// `None` when nothing lives there.
    fn retrieve(&self, root: &Node, path: &Path) -> Option<Path>;

    /// Locate the node at `path` and narrow it by `conditions`.
    ///
    /// All returned paths are relative to `root`.
    fn find(
        &self,
        root: &Node,
        path: &Path,
        conditions: &[Condition],
        filter: Filter,
    ) -> Option<Resolved>;
}

/// The default resolver: walks segments from the root.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathResolver;

impl Resolver for PathResolver {
    fn retrieve(&self, root: &Node, path: &Path) -> Option<Path> {
        root.get(path).map(|_| path.clone())
    }

    fn find(
        &self,
        root: &Node,
        path: &Path,
        conditions: &[Condition],
        filter: Filter,
    ) -> Option<Resolved> {
        let base = root.get(path)?;
        if conditions.is_empty() {
            return Some(Resolved::Handle(path.clone()));
        }
        if base.is_object() && conditions.iter().all(|c| c.matches(base)) {
            return Some(Resolved::Handle(path.clone()));
        }

        let children: Vec<(String, &Node)> = match base {
            Node::Array(arr) => arr.iter().enumerate().map(|(i, n)| (i.to_string(), n)).collect(),
            Node::Object(map) => map.iter().map(|(k, n)| (k.clone(), n)).collect(),
            _ => return None,
        };
        let mut matches = children
            .into_iter()
            .filter(|(_, child)| conditions.iter().all(|c| c.matches(child)));

        match filter {
            Filter::First => matches.next().map(|(key, _)| Resolved::Handle(path.child(key))),
            Filter::Last => matches.last().map(|(key, _)| Resolved::Handle(path.child(key))),
            Filter::All => {
                let (nodes, sources): (Vec<Node>, Vec<Path>) = matches
                    .map(|(key, child)| (child.clone(), path.child(key)))
                    .unzip();
                if nodes.is_empty() {
                    None
                } else {
                    Some(Resolved::Materialized {
                        node: Node::Array(nodes),
                        sources,
                    })
                }
            }
        }
    }
}

/// What a failed lookup produces.
///
/// With `throw_on_miss` unset, misses yield `default_value`; reads return it
/// and destructive writes do nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissPolicy {
    pub throw_on_miss: bool,
    pub default_value: Node,
}

impl MissPolicy {
    /// Policy that raises `EmptyResult` on every miss.
    pub fn strict() -> Self {
        Self {
            throw_on_miss: true,
            default_value: Node::Null,
        }
    }

    pub fn miss(&self, path: impl fmt::Display) -> Result<Node, Error> {
        if self.throw_on_miss {
            Err(Error::empty_result(path))
        } else {
            Ok(self.default_value.clone())
        }
    }

    /// True if `node` is indistinguishable from a miss.
    pub fn is_default(&self, node: &Node) -> bool {
        *node == self.default_value
    }
}
