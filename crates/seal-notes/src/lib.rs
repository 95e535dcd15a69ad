//! Namespaced annotations ("notes") for Seal.
//!
//! A note attaches a blob to an object without changing the object. Notes
//! are partitioned by [`NotesNamespace`]; signatures live in the reserved
//! [`SIGNATURE_NAMESPACE`] (`refs/notes/crypto`). Within a namespace there is
//! at most one note per object, and the last write wins.
//!
//! Backends implement [`NoteStore`]:
//!
//! - [`InMemoryNoteStore`] -- for tests and embedding
//! - [`FileNoteStore`] -- one file per note, fanned out by target id

pub mod error;
pub mod fs;
pub mod memory;
pub mod namespace;
pub mod traits;

pub use error::{NoteError, NoteResult};
pub use fs::FileNoteStore;
pub use memory::InMemoryNoteStore;
pub use namespace::{NotesNamespace, NOTES_REF_PREFIX, SIGNATURE_NAMESPACE};
pub use traits::{NoteEntry, NoteStore};
