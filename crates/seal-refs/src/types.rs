//! Core reference types.

use std::fmt;

use seal_types::ObjectId;
use serde::{Deserialize, Serialize};

/// Canonical name of the HEAD ref.
pub const HEAD: &str = "HEAD";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

/// A named pointer into the object graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ref {
    /// Points straight at an object.
    Direct(ObjectId),
    /// Points at another ref by canonical name (e.g. HEAD -> refs/heads/main).
    Symbolic(String),
}

impl Ref {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Ref::Symbolic(_))
    }

    /// The target object, if this ref is direct.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Ref::Direct(id) => Some(*id),
            Ref::Symbolic(_) => None,
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Direct(id) => write!(f, "{id}"),
            Ref::Symbolic(name) => write!(f, "ref: {name}"),
        }
    }
}

/// Canonical name of a branch.
pub fn branch_ref(name: &str) -> String {
    format!("{HEADS_PREFIX}{name}")
}

/// Canonical name of a tag.
pub fn tag_ref(name: &str) -> String {
    format!("{TAGS_PREFIX}{name}")
}

/// Returns `true` if `name` lives under `refs/tags/`.
pub fn is_tag_name(name: &str) -> bool {
    name.starts_with(TAGS_PREFIX)
}
