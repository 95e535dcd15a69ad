//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] stores all refs in a `HashMap` protected by a
//! `RwLock`.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{RefError, Result};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::{is_tag_name, Ref, HEAD};

/// Reject overwriting an existing tag.
pub(crate) fn check_write(name: &str, existing: Option<&Ref>) -> Result<()> {
    validate_ref_name(name)?;
    if is_tag_name(name) && existing.is_some() {
        return Err(RefError::TagImmutable {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Reject deleting the branch HEAD points at.
pub(crate) fn check_delete(name: &str, head: Option<&Ref>) -> Result<()> {
    if let Some(Ref::Symbolic(current)) = head {
        if current == name {
            return Err(RefError::DeleteCurrentBranch {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, Ref>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let refs = self.refs.read().map_err(|_| RefError::Poisoned)?;
        Ok(refs.get(name).cloned())
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        let mut refs = self.refs.write().map_err(|_| RefError::Poisoned)?;
        check_write(name, refs.get(name))?;
        refs.insert(name.to_string(), reference.clone());
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        let mut refs = self.refs.write().map_err(|_| RefError::Poisoned)?;
        check_delete(name, refs.get(HEAD))?;
        Ok(refs.remove(name).is_some())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        let refs = self.refs.read().map_err(|_| RefError::Poisoned)?;
        let mut result: Vec<(String, Ref)> = refs
            .iter()
            .filter(|(k, _)| k.as_str() != HEAD && k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        result.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(result)
    }
}
