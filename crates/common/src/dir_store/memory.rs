use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use super::provider::{DirStore, DirStoreError, EntryRef, LogOp, LogRecord, PutCondition};
use crate::entry::{DirEntry, EntryKind, Sequence};
use crate::path::{Parsed, PathName, UserName};

/// In-memory dir store, mainly for tests
#[derive(Debug, Clone)]
pub struct MemoryDirStore {
    inner: Arc<RwLock<MemoryDirStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryDirStoreInner {
    /// Users whose root has been created at least once
    roots: HashSet<UserName>,
    /// Every operation ever applied, in order. Record ids are index + 1
    log: Vec<(UserName, LogRecord)>,
    /// Current state: canonical path name -> row
    projection: BTreeMap<PathName, Row>,
}

#[derive(Debug, Clone)]
struct Row {
    parent: Option<PathName>,
    /// Log record that produced the entry
    op: i64,
    sequence: Sequence,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryDirStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

impl MemoryDirStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryDirStoreInner::default())),
        }
    }
}

impl Default for MemoryDirStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(e: impl std::fmt::Display) -> DirStoreError<MemoryDirStoreError> {
    DirStoreError::Provider(MemoryDirStoreError::Internal(format!(
        "failed to acquire lock: {}",
        e
    )))
}

impl MemoryDirStoreInner {
    fn entry(&self, name: &PathName) -> Option<DirEntry> {
        let row = self.projection.get(name)?;
        let (_, record) = self.log.get((row.op - 1) as usize)?;
        match &record.op {
            LogOp::Put(entry) => {
                let mut entry = (**entry).clone();
                entry.sequence = row.sequence;
                Some(entry)
            }
            LogOp::Delete => None,
        }
    }

    /// `1 + max(sequence)` over `path` and its existing ancestors.
    fn next_sequence(&self, path: &Parsed) -> Sequence {
        (0..=path.n_elem())
            .filter_map(|i| self.projection.get(&path.first(i).path()))
            .map(|row| row.sequence)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn bump_ancestors(&mut self, path: &Parsed, seq: Sequence) {
        for ancestor in path.ancestors() {
            if let Some(row) = self.projection.get_mut(&ancestor.path()) {
                row.sequence = seq;
            }
        }
    }

    fn append(&mut self, user: &UserName, name: PathName, time: i64, seq: Sequence, op: LogOp) -> i64 {
        let id = self.log.len() as i64 + 1;
        self.log.push((
            user.clone(),
            LogRecord {
                id,
                name,
                time,
                sequence: seq,
                op,
            },
        ));
        id
    }
}

#[async_trait]
impl DirStore for MemoryDirStore {
    type Error = MemoryDirStoreError;

    async fn lookup_elem(&self, path: &Parsed) -> Result<Option<EntryRef>, DirStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;

        let mut found = None;
        for i in 0..=path.n_elem() {
            let prefix = path.first(i);
            let Some(row) = inner.projection.get(&prefix.path()) else {
                break;
            };
            let Some(entry) = inner.entry(&prefix.path()) else {
                break;
            };
            let kind = entry.kind;
            found = Some(EntryRef {
                id: row.op,
                path: prefix,
                kind,
                sequence: row.sequence,
            });
            if kind != EntryKind::Directory {
                break;
            }
        }
        Ok(found)
    }

    async fn lookup_all(&self, path: &Parsed) -> Result<Vec<DirEntry>, DirStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;

        let mut chain = Vec::new();
        for i in 0..=path.n_elem() {
            let Some(entry) = inner.entry(&path.first(i).path()) else {
                break;
            };
            let is_link = entry.is_link();
            chain.push(entry);
            if is_link {
                break;
            }
        }
        Ok(chain)
    }

    async fn lookup(&self, name: &PathName) -> Result<Option<DirEntry>, DirStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.entry(name))
    }

    async fn list(&self, dir: &EntryRef) -> Result<Vec<DirEntry>, DirStoreError<Self::Error>> {
        if dir.kind != EntryKind::Directory {
            return Ok(Vec::new());
        }
        let inner = self.inner.read().map_err(lock_error)?;

        let parent = dir.path.path();
        Ok(inner
            .projection
            .iter()
            .filter(|(_, row)| row.parent.as_ref() == Some(&parent))
            .filter_map(|(name, _)| inner.entry(name))
            .collect())
    }

    async fn put(
        &self,
        entry: &DirEntry,
        condition: PutCondition,
    ) -> Result<Sequence, DirStoreError<Self::Error>> {
        let path = Parsed::parse(&entry.name).map_err(DirStoreError::InvalidPath)?;
        let name = path.path();
        let mut inner = self.inner.write().map_err(lock_error)?;

        if !path.is_root() && !inner.roots.contains(path.user()) {
            return Err(DirStoreError::RootNotFound(path.user().clone()));
        }

        let current = inner.projection.get(&name).map(|row| row.sequence);
        if !condition.holds(current) {
            return Err(DirStoreError::Conflict {
                name,
                condition,
                current,
            });
        }
        if path.is_root() {
            inner.roots.insert(path.user().clone());
        }

        let seq = inner.next_sequence(&path);
        let mut stored = entry.clone();
        stored.name = name.clone();
        stored.sequence = seq;
        let op = inner.append(
            path.user(),
            name.clone(),
            entry.time,
            seq,
            LogOp::Put(Box::new(stored)),
        );
        inner.bump_ancestors(&path, seq);
        inner.projection.insert(
            name,
            Row {
                parent: path.parent().map(|p| p.path()),
                op,
                sequence: seq,
            },
        );
        Ok(seq)
    }

    async fn delete(&self, path: &Parsed) -> Result<Sequence, DirStoreError<Self::Error>> {
        let mut inner = self.inner.write().map_err(lock_error)?;
        if !inner.roots.contains(path.user()) {
            return Err(DirStoreError::RootNotFound(path.user().clone()));
        }

        let name = path.path();
        inner.projection.remove(&name);
        let seq = inner.next_sequence(path);
        inner.append(
            path.user(),
            name,
            chrono::Utc::now().timestamp(),
            seq,
            LogOp::Delete,
        );
        inner.bump_ancestors(path, seq);
        Ok(seq)
    }

    async fn log(&self, user: &UserName) -> Result<Vec<LogRecord>, DirStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner
            .log
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Packing;

    fn user() -> UserName {
        UserName::parse("foo@example.com").unwrap()
    }

    fn path(s: &str) -> Parsed {
        Parsed::parse(&PathName::from(s)).unwrap()
    }

    fn dir(name: &str) -> DirEntry {
        DirEntry::directory(name.into(), user())
    }

    async fn seq_of(store: &MemoryDirStore, name: &str) -> Sequence {
        store.lookup(&name.into()).await.unwrap().unwrap().sequence
    }

    #[tokio::test]
    async fn test_sequences_cascade_to_ancestors() {
        let store = MemoryDirStore::new();

        assert_eq!(store.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap(), 1);
        assert_eq!(store.put(&dir("foo@example.com/bar"), PutCondition::Any).await.unwrap(), 2);
        assert_eq!(
            store.put(&dir("foo@example.com/bar/baz"), PutCondition::Any).await.unwrap(),
            3
        );
        assert_eq!(
            store.put(&dir("foo@example.com/bar/baz"), PutCondition::Any).await.unwrap(),
            4
        );

        assert_eq!(seq_of(&store, "foo@example.com/").await, 4);
        assert_eq!(seq_of(&store, "foo@example.com/bar").await, 4);
        assert_eq!(seq_of(&store, "foo@example.com/bar/baz").await, 4);
    }

    #[tokio::test]
    async fn test_delete_bumps_parent() {
        let store = MemoryDirStore::new();
        store.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        store.put(&dir("foo@example.com/bar"), PutCondition::Any).await.unwrap();

        let seq = store.delete(&path("foo@example.com/bar")).await.unwrap();
        assert_eq!(seq, 3);
        assert_eq!(seq_of(&store, "foo@example.com/").await, 3);
        assert!(store.lookup(&"foo@example.com/bar".into()).await.unwrap().is_none());

        let log = store.log(&user()).await.unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].op, LogOp::Delete);
    }

    #[tokio::test]
    async fn test_lookup_elem_and_lookup_all() {
        let store = MemoryDirStore::new();
        assert!(store.lookup_elem(&path("foo@example.com/a")).await.unwrap().is_none());
        assert!(store.lookup_all(&path("foo@example.com/a")).await.unwrap().is_empty());

        store.put(&dir("foo@example.com/"), PutCondition::Any).await.unwrap();
        store.put(&dir("foo@example.com/a"), PutCondition::Any).await.unwrap();
        store
            .put(
                &DirEntry::file("foo@example.com/a/f".into(), user(), Packing::Plain),
                PutCondition::Any,
            )
            .await
            .unwrap();

        let found = store
            .lookup_elem(&path("foo@example.com/a/f/deeper"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.path, path("foo@example.com/a/f"));
        assert_eq!(found.kind, EntryKind::File);

        let chain = store.lookup_all(&path("foo@example.com/a/missing")).await.unwrap();
        assert_eq!(chain.len(), 2);

        let root = store.lookup_elem(&path("foo@example.com/")).await.unwrap().unwrap();
        assert!(root.path.is_root());
        let children = store.list(&root).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name.as_str(), "foo@example.com/a");
    }

    #[tokio::test]
    async fn test_put_condition_and_missing_root() {
        let store = MemoryDirStore::new();
        assert!(matches!(
            store.put(&dir("foo@example.com/a"), PutCondition::Any).await,
            Err(DirStoreError::RootNotFound(_))
        ));

        store.put(&dir("foo@example.com/"), PutCondition::NotExist).await.unwrap();
        assert!(matches!(
            store.put(&dir("foo@example.com/"), PutCondition::NotExist).await,
            Err(DirStoreError::Conflict { current: Some(1), .. })
        ));
        assert!(matches!(
            store.put(&dir("foo@example.com/"), PutCondition::Sequence(5)).await,
            Err(DirStoreError::Conflict { .. })
        ));
        assert_eq!(
            store.put(&dir("foo@example.com/"), PutCondition::Sequence(1)).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_failed_root_put_does_not_register_root() {
        let store = MemoryDirStore::new();
        assert!(matches!(
            store.put(&dir("foo@example.com/"), PutCondition::Exists).await,
            Err(DirStoreError::Conflict { current: None, .. })
        ));
        assert!(matches!(
            store.put(&dir("foo@example.com/a"), PutCondition::Any).await,
            Err(DirStoreError::RootNotFound(_))
        ));
        assert!(store.log(&user()).await.unwrap().is_empty());
    }
}
