//! Content-addressed object storage for Seal.
//!
//! Every object (blob, tree, commit) is stored immutably under the
//! domain-separated BLAKE3 hash of its stored encoding. Separately, every
//! object has a *canonical content*: the human-readable rendering that
//! signatures are computed over. The two never mix: the store's address is an
//! implementation detail of this crate, the canonical content is a contract
//! with signers and verifiers on other hosts.
//!
//! # Backends
//!
//! All backends implement [`ObjectStore`]:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- one file per object under `objects/xx/yyyy...`
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Writes are idempotent and return the object's id.
//! 3. Concurrent reads are always safe.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod history;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use history::{HistoryWalk, Walk};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, ObjectKind, Person, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
