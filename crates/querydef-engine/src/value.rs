//! Dynamic value model for processed parameters.
//!
//! Every parameter in an instance ultimately holds a [`Value`]: a scalar
//! atom (`Null`/`Str`/`Int`/`Bool`), an ordered sequence of atoms, or a
//! set built by a composite adapter.  Universes and complements are plain
//! values too, so set algebra stays inside this one enum.
//!
//! `BTreeSet` keeps set members in deterministic order, which makes the
//! canonical serialization byte-stable.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A processed parameter value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// A preserved empty atom (`empty = true` templates only).
    Null,
    /// A string atom.
    Str(String),
    /// An integer atom.
    Int(i64),
    /// A boolean atom.
    Bool(bool),
    /// An ordered sequence of values.
    Seq(Vec<Value>),
    /// A set of values in ascending order.
    Set(BTreeSet<Value>),
}

impl Value {
    /// Build a set value from anything iterable.
    pub fn set<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Set(members.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<Value>> {
        match self {
            Self::Set(members) => Some(members),
            _ => None,
        }
    }

    /// Number of atomic values behind this value.  Scalars (including a
    /// preserved null) count as one; sequences and sets count their
    /// members.  Used for cardinality validation.
    pub fn atom_count(&self) -> usize {
        match self {
            Self::Seq(items) => items.len(),
            Self::Set(members) => members.len(),
            _ => 1,
        }
    }

    /// Canonical rendering of an atom.  `Null` renders empty, strings
    /// render verbatim, integers in decimal, booleans as `true`/`false`.
    /// Sequences and sets render their members comma-joined; that form is
    /// for diagnostics only, serialization goes through the per-atom
    /// format instead.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Seq(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
            Self::Set(members) => members
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Seq(items)
    }
}
