//! Reference management for Seal.
//!
//! Refs are the human-readable entry points into the object graph:
//!
//! - **Branches** (`refs/heads/*`) are mutable pointers to commit tips.
//! - **Tags** (`refs/tags/*`) are immutable once written; delete and
//!   recreate to move one.
//! - **HEAD** is normally symbolic, naming the current branch, or detached,
//!   pointing straight at a commit.
//!
//! # Modules
//!
//! - [`types`] -- [`Ref`] and canonical name helpers
//! - [`traits`] -- the [`RefStore`] storage interface
//! - [`names`] -- git-style name validation, shared with notes namespaces
//! - [`memory`] / [`fs`] -- in-memory and JSON-file backends
//! - [`resolve`](mod@resolve) -- revision strings to object ids

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod resolve;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FileRefStore;
pub use memory::InMemoryRefStore;
pub use names::{validate_branch_name, validate_name, validate_ref_name, validate_tag_name};
pub use resolve::{peel, resolve, MAX_SYMBOLIC_DEPTH};
pub use traits::RefStore;
pub use types::{branch_ref, tag_ref, Ref, HEAD};
