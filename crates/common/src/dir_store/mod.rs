mod memory;
mod provider;

pub use memory::{MemoryDirStore, MemoryDirStoreError};
pub use provider::{DirStore, DirStoreError, EntryRef, LogOp, LogRecord, PutCondition};
