use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::entry::{DirEntry, EntryKind, Sequence, SEQ_IGNORE, SEQ_NOT_EXIST};
use crate::path::{Parsed, PathError, PathName, UserName};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DirStoreError<T> {
    #[error("unhandled dir store provider error: {0}")]
    Provider(#[from] T),
    /// The put condition did not hold when the write was applied
    #[error("put condition {condition:?} failed for {name} (current sequence {current:?})")]
    Conflict {
        name: PathName,
        condition: PutCondition,
        current: Option<Sequence>,
    },
    /// A write below a user's root before the root was ever created
    #[error("no root registered for {0}")]
    RootNotFound(UserName),
    #[error("invalid entry name: {0}")]
    InvalidPath(PathError),
}

/// Handle to a stored entry, as returned by [`DirStore::lookup_elem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    /// Identifier of the log operation that produced the entry.
    pub id: i64,
    pub path: Parsed,
    pub kind: EntryKind,
    pub sequence: Sequence,
}

/// Precondition on the current state of the target path, checked inside
/// the same transaction as the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    Any,
    NotExist,
    Exists,
    Sequence(Sequence),
}

impl PutCondition {
    /// Maps the sequence sentinels a client sends to a condition.
    pub fn from_sequence(seq: Sequence) -> Self {
        match seq {
            SEQ_IGNORE => PutCondition::Any,
            SEQ_NOT_EXIST => PutCondition::NotExist,
            n => PutCondition::Sequence(n),
        }
    }

    pub fn holds(&self, current: Option<Sequence>) -> bool {
        match (self, current) {
            (PutCondition::Any, _) => true,
            (PutCondition::NotExist, current) => current.is_none(),
            (PutCondition::Exists, current) => current.is_some(),
            (PutCondition::Sequence(want), Some(have)) => *want == have,
            (PutCondition::Sequence(_), None) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOp {
    Put(Box<DirEntry>),
    Delete,
}

/// One record of a user's append-only operation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub id: i64,
    pub name: PathName,
    pub time: i64,
    /// Sequence assigned to `name` (for deletes, to its parent).
    pub sequence: Sequence,
    pub op: LogOp,
}

/// Storage for directory trees.
///
/// Every mutation is appended to a per-user operation log and applied to
/// a projection of the current state in the same atomic step. Sequences
/// are assigned here: a write to a path gives that path and every existing
/// ancestor the new sequence `1 + max(sequence over the chain)`.
///
/// The store does no validation of tree shape or rights; that is the
/// caller's job.
#[async_trait]
pub trait DirStore: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Walks from the root towards `path`, stopping at the first missing
    /// element or the first element that is not a directory.
    ///
    /// # Returns
    /// * `Ok(None)` - The user's root does not exist
    /// * `Ok(Some(r))` - The deepest element reached; `r.path` may be a
    ///   proper prefix of `path`
    async fn lookup_elem(&self, path: &Parsed) -> Result<Option<EntryRef>, DirStoreError<Self::Error>>;

    /// Every entry along `path`, root first, in one consistent snapshot.
    /// Stops after a missing element or a link; so the result is shorter
    /// than `path.n_elem() + 1` whenever the full path was not reached.
    async fn lookup_all(&self, path: &Parsed) -> Result<Vec<DirEntry>, DirStoreError<Self::Error>>;

    /// Exact lookup of a single name.
    async fn lookup(&self, name: &PathName) -> Result<Option<DirEntry>, DirStoreError<Self::Error>>;

    /// Children of a directory ordered by name. Empty for anything else.
    async fn list(&self, dir: &EntryRef) -> Result<Vec<DirEntry>, DirStoreError<Self::Error>>;

    /// Appends a put and updates the projection. The root of the user's
    /// tree is registered when `entry` is the root itself.
    ///
    /// Should fail with the following errors to be considered correct:
    /// * `Err(DirStoreError::Conflict)` - `condition` does not hold
    /// * `Err(DirStoreError::RootNotFound)` - writing below a missing root
    async fn put(
        &self,
        entry: &DirEntry,
        condition: PutCondition,
    ) -> Result<Sequence, DirStoreError<Self::Error>>;

    /// Appends a delete and removes `path` from the projection. Returns the
    /// sequence assigned to the ancestors.
    async fn delete(&self, path: &Parsed) -> Result<Sequence, DirStoreError<Self::Error>>;

    /// The complete operation log of a user, oldest first.
    async fn log(&self, user: &UserName) -> Result<Vec<LogRecord>, DirStoreError<Self::Error>>;
}
