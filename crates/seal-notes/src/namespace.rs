use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NoteError, NoteResult};

/// Prefix under which notes namespaces live as refs.
pub const NOTES_REF_PREFIX: &str = "refs/notes/";

/// Reserved namespace holding commit signatures.
pub const SIGNATURE_NAMESPACE: &str = "crypto";

/// A validated notes namespace name, e.g. `crypto`.
///
/// Names follow ref-name rules. An input already carrying the
/// `refs/notes/` prefix is accepted and stored without it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NotesNamespace(String);

impl NotesNamespace {
    pub fn new(name: impl AsRef<str>) -> NoteResult<Self> {
        let name = name.as_ref();
        let short = name.strip_prefix(NOTES_REF_PREFIX).unwrap_or(name);
        seal_refs::validate_name(short).map_err(NoteError::InvalidNamespace)?;
        Ok(Self(short.to_string()))
    }

    /// The namespace signatures are attached under.
    pub fn signatures() -> Self {
        Self(SIGNATURE_NAMESPACE.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// `refs/notes/<name>`.
    pub fn canonical_ref(&self) -> String {
        format!("{NOTES_REF_PREFIX}{}", self.0)
    }
}

impl Default for NotesNamespace {
    fn default() -> Self {
        Self::signatures()
    }
}

impl fmt::Display for NotesNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NotesNamespace {
    type Error = NoteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NotesNamespace> for String {
    fn from(ns: NotesNamespace) -> Self {
        ns.0
    }
}

impl std::str::FromStr for NotesNamespace {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
