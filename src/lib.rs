// NoteStore - Note collection with search, sort and pluggable persistence

pub mod adapter;
pub mod codec;
pub mod config;
pub mod file_adapter;
pub mod filter;
pub mod models;
pub mod store;

// Re-export main types for convenience
pub use adapter::{MemoryAdapter, PersistenceAdapter};
pub use config::Config;
pub use file_adapter::FileAdapter;
pub use filter::{SearchTerm, SortOrder};
pub use models::{Note, now};
pub use store::{Clock, NotesStore, PersistenceHealth, PersistenceOp};
