//! Ordered, name-addressable document tree used to hold job reports.
//!
//! A [`Section`] maps names to [`Node`]s in insertion order. A node is a
//! single [`Scalar`], a list of scalars, or a nested section.

use serde::{Serialize, Serializer, ser::SerializeMap};

/// Document key carrying a section's own name.
pub const SECTION_NAME_KEY: &str = "section_name_";
/// Document key listing the section-valued keys of a section.
pub const SECTIONS_KEY: &str = "sections_";

/// Names the document form uses for bookkeeping; they cannot be used as keys.
pub fn is_reserved_key(key: &str) -> bool {
    key == SECTION_NAME_KEY || key == SECTIONS_KEY
}

/// Largest unsigned value a [`Scalar::Int`] holds without loss.
pub const MAX_STORED_U64: u64 = i64::MAX as u64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Int(v.into())
    }
}

/// Saturates at [`MAX_STORED_U64`]. Catalog operations reject larger values
/// before they reach the tree.
impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Section(Section),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Node::Section(s) => Some(s),
            _ => None,
        }
    }

    /// Builds a list node from anything yielding scalars.
    pub fn list<I, T>(items: I) -> Node
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Node::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Scalar> for Node {
    fn from(v: Scalar) -> Self {
        Node::Scalar(v)
    }
}

impl From<Vec<Scalar>> for Node {
    fn from(v: Vec<Scalar>) -> Self {
        Node::List(v)
    }
}

impl From<Section> for Node {
    fn from(v: Section) -> Self {
        Node::Section(v)
    }
}

macro_rules! node_from_scalar {
    ($($t:ty),*) => {
        $(impl From<$t> for Node {
            fn from(v: $t) -> Self {
                Node::Scalar(v.into())
            }
        })*
    };
}

node_from_scalar!(bool, i64, i32, u32, u64, f64, &str, String);

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    entries: Vec<(String, Node)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.position(key).map(|i| &mut self.entries[i].1)
    }

    /// Sets `key`, replacing an existing value in place or appending a new entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Node>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Creates an empty child section named `key`; an existing entry is replaced.
    pub fn create_section(&mut self, key: &str) -> &mut Section {
        let idx = self.put(key, Node::Section(Section::new(key)));
        self.section_at(idx)
    }

    /// Returns the child section `key`, creating it if absent.
    pub fn ensure_section(&mut self, key: &str) -> &mut Section {
        let idx = match self.position(key) {
            Some(i) if matches!(self.entries[i].1, Node::Section(_)) => i,
            _ => self.put(key, Node::Section(Section::new(key))),
        };
        self.section_at(idx)
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.get(key).and_then(Node::as_section)
    }

    pub fn section_mut(&mut self, key: &str) -> Option<&mut Section> {
        match self.get_mut(key) {
            Some(Node::Section(s)) => Some(s),
            _ => None,
        }
    }

    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(Node::as_scalar)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.scalar(key).and_then(Scalar::as_i64)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.scalar(key).and_then(Scalar::as_str)
    }

    pub fn list(&self, key: &str) -> Option<&[Scalar]> {
        self.get(key).and_then(Node::as_list)
    }

    pub fn list_mut(&mut self, key: &str) -> Option<&mut Vec<Scalar>> {
        match self.get_mut(key) {
            Some(Node::List(items)) => Some(items),
            _ => None,
        }
    }

    /// All attribute names, child sections included, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Names of the entries that are themselves sections.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, n)| matches!(n, Node::Section(_)))
            .map(|(k, _)| k.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    /// Increments the integer counter `key` (missing counts as 0) and returns
    /// the value it held before.
    pub(crate) fn bump(&mut self, key: &str) -> i64 {
        let current = self.int(key).unwrap_or(0);
        self.set(key, current + 1);
        current
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn put(&mut self, key: &str, value: Node) -> usize {
        match self.position(key) {
            Some(i) => {
                self.entries[i].1 = value;
                i
            }
            None => {
                self.entries.push((key.to_string(), value));
                self.entries.len() - 1
            }
        }
    }

    fn section_at(&mut self, idx: usize) -> &mut Section {
        match &mut self.entries[idx].1 {
            Node::Section(s) => s,
            _ => unreachable!("entry {idx} was just filled with a section"),
        }
    }
}

// Serialized as a plain map; the section's own name is carried by its key.
impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
