//! Ref name validation following git-style conventions.
//!
//! Valid names:
//! - Must be non-empty
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start with `-`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - Components between slashes must be non-empty and not start with `.`
//!
//! The same rules apply to branch names, tag names, and notes namespaces.

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a name.
const FORBIDDEN_CHARS: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a ref-like name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use seal_refs::names::validate_name;
///
/// assert!(validate_name("main").is_ok());
/// assert!(validate_name("feature/auth").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("bad..name").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(name, format!("contains control character: {ch:?}")));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    // Reflog syntax.
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    // Would parse as a command-line flag.
    if name.starts_with('-') {
        return Err(invalid(name, "must not start with '-'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}

/// Validate a branch name (the part after `refs/heads/`).
pub fn validate_branch_name(name: &str) -> Result<()> {
    validate_name(name)
}

/// Validate a tag name. Same rules as branch names.
pub fn validate_tag_name(name: &str) -> Result<()> {
    validate_name(name)
}

/// Validate a full canonical ref name: `HEAD` or `refs/<...>`.
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name == crate::types::HEAD {
        return Ok(());
    }
    let rest = name
        .strip_prefix("refs/")
        .ok_or_else(|| invalid(name, "canonical ref names start with 'refs/'"))?;
    validate_name(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_simple_names() {
        assert!(validate_branch_name("main").is_ok());
        assert!(validate_branch_name("develop").is_ok());
        assert!(validate_branch_name("my-branch").is_ok());
        assert!(validate_branch_name("v1.0").is_ok());
    }

    #[test]
    fn valid_nested_names() {
        assert!(validate_branch_name("feature/auth").is_ok());
        assert!(validate_branch_name("user/alice/fix-123").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(validate_name("").is_err());
    }

    #[test]
    fn reject_double_dot() {
        assert!(validate_name("bad..name").is_err());
    }

    #[test]
    fn reject_whitespace_and_control() {
        assert!(validate_name("has space").is_err());
        assert!(validate_name("has\ttab").is_err());
        assert!(validate_name("has\nnewline").is_err());
        assert!(validate_name("bell\u{7}").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        for bad in ["a~b", "a^b", "a:b", "a?b", "a*b", "a[b", "a\\b"] {
            assert!(validate_name(bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn reject_leading_dash() {
        assert!(validate_name("-rf").is_err());
        assert!(validate_name("a-b").is_ok());
    }

    #[test]
    fn reject_dot_and_slash_boundaries() {
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("trailing.").is_err());
        assert!(validate_name("/leading").is_err());
        assert!(validate_name("trailing/").is_err());
        assert!(validate_name("a//b").is_err());
    }

    #[test]
    fn reject_lock_suffix_and_reflog() {
        assert!(validate_name("main.lock").is_err());
        assert!(validate_name("ref@{0}").is_err());
    }

    #[test]
    fn reject_component_starting_with_dot() {
        assert!(validate_name("feature/.hidden").is_err());
    }

    #[test]
    fn canonical_ref_names() {
        assert!(validate_ref_name("HEAD").is_ok());
        assert!(validate_ref_name("refs/heads/main").is_ok());
        assert!(validate_ref_name("refs/notes/crypto").is_ok());
        assert!(validate_ref_name("heads/main").is_err());
        assert!(validate_ref_name("refs/heads/bad..name").is_err());
    }
}
