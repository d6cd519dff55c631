//! Directory tree reconstructed from a replayed `cd`/`ls` transcript.
//!
//! The tree is made of entries: files with a fixed size and directories whose
//! total size is computed on demand and memoized until one of their mutating
//! accessors is used.

mod entry;
mod interpreter;
mod render;
mod traversal;

pub use entry::Directory;
pub use interpreter::{Interpreter, ScanError, ScanOptions};
pub use render::TreeRenderer;
pub use traversal::FileSystem;
