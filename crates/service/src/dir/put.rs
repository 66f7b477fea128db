use common::access::{is_access_file, is_group_file, parse_group, Access, Right};
use common::dir_store::{DirStore, DirStoreError, PutCondition};
use common::entry::{DirEntry, EntryKind, Packing, SEQ_IGNORE, SEQ_NOT_EXIST};
use common::error::{DirError, Resolution};
use common::path::{Parsed, PathName};

use super::{internal, with_deadline, DirServer};
use crate::content::ContentError;
use crate::context::RequestContext;

const OP: &str = "dir.Put";

impl<S: DirStore> DirServer<S> {
    /// Creates or replaces an entry. Returns the stored entry with its
    /// newly assigned sequence.
    ///
    /// `entry.sequence` selects the write condition: `SEQ_IGNORE` writes
    /// unconditionally, `SEQ_NOT_EXIST` only creates, any other value must
    /// equal the current sequence of the existing entry.
    pub async fn put(&self, ctx: &RequestContext, entry: DirEntry) -> Result<Resolution<DirEntry>, DirError> {
        with_deadline(ctx, OP, self.put_inner(ctx, entry)).await
    }

    async fn put_inner(&self, ctx: &RequestContext, mut entry: DirEntry) -> Result<Resolution<DirEntry>, DirError> {
        let path = Self::parse(&entry.name)?;
        let name = path.path();
        if name != entry.name {
            return Err(DirError::invalid(entry.name.clone(), "path name is not clean"));
        }
        check_shape(ctx, &mut entry)?;
        entry.time = chrono::Utc::now().timestamp();

        if path.is_root() {
            return self.put_root(ctx, entry).await;
        }

        let parent = path.drop_elems(1);
        let chain = self
            .store
            .lookup_all(&parent)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;
        let Some(last) = chain.last() else {
            return Err(if ctx.requester() == path.user() {
                DirError::NotExist(parent.path())
            } else {
                DirError::Private(name)
            });
        };

        let last_path = Self::parse(&last.name)?;
        let access_entry = self
            .access
            .controlling_access_file(&last_path, last.is_dir())
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;
        let access = self.access.load(ctx, access_entry.as_ref()).await;
        let access = access.as_deref();

        if last.is_link() {
            if self.can(ctx, OP, access, Right::Any, &last_path).await? {
                return Ok(Resolution::FollowLink(last.clone()));
            }
            return Err(DirError::Private(name));
        }
        if !self.can(ctx, OP, access, Right::Any, &path).await? {
            return Err(DirError::Private(name));
        }
        if !last.is_dir() {
            return Err(DirError::NotDir(last.name.clone()));
        }
        if chain.len() < parent.n_elem() + 1 {
            return Err(DirError::NotExist(parent.path()));
        }

        let existing = self
            .store
            .lookup(&name)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;
        let condition = match &existing {
            Some(existing) => {
                if existing.is_dir() || entry.is_dir() {
                    return Err(DirError::Exist(name));
                }
                if !self.can(ctx, OP, access, Right::Write, &path).await? {
                    return Err(DirError::Permission(name));
                }
                match entry.sequence {
                    SEQ_IGNORE => PutCondition::Exists,
                    SEQ_NOT_EXIST => return Err(DirError::Exist(name)),
                    seq if seq == existing.sequence => PutCondition::Sequence(seq),
                    _ => return Err(DirError::Conflict(name)),
                }
            }
            None => {
                if !self.can(ctx, OP, access, Right::Create, &path).await? {
                    return Err(DirError::Permission(name));
                }
                match entry.sequence {
                    SEQ_IGNORE | SEQ_NOT_EXIST => PutCondition::NotExist,
                    _ => return Err(DirError::Conflict(name)),
                }
            }
        };

        self.check_access_control(ctx, &path, &entry).await?;
        self.persist(ctx, entry, condition).await
    }

    async fn put_root(&self, ctx: &RequestContext, entry: DirEntry) -> Result<Resolution<DirEntry>, DirError> {
        let name = entry.name.clone();
        if !entry.is_dir() {
            return Err(DirError::invalid(name, "root must be a directory"));
        }
        let owner = Self::parse(&name)?.user().clone();
        if *ctx.requester() != owner {
            return Err(DirError::Permission(name));
        }
        let existing = self
            .store
            .lookup(&name)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;
        if existing.is_some() {
            return Err(DirError::Exist(name));
        }
        tracing::info!(root = %name, "creating root");
        self.persist(ctx, entry, PutCondition::NotExist).await
    }

    async fn persist(
        &self,
        ctx: &RequestContext,
        mut entry: DirEntry,
        condition: PutCondition,
    ) -> Result<Resolution<DirEntry>, DirError> {
        let name = entry.name.clone();
        let seq = match self.store.put(&entry, condition).await {
            Ok(seq) => seq,
            Err(DirStoreError::Conflict { current, .. }) => {
                tracing::debug!(pathname = %name, ?condition, ?current, "lost put race");
                return Err(match condition {
                    PutCondition::NotExist => DirError::Exist(name),
                    _ => DirError::Conflict(name),
                });
            }
            Err(e) => return Err(internal(ctx, OP, &name, e)),
        };
        entry.sequence = seq;

        if entry.is_access_control() {
            self.access.cache().invalidate(&name).await;
        }
        tracing::debug!(pathname = %name, sequence = seq, "put");
        Ok(Resolution::Complete(entry))
    }

    /// Extra rules for Access files and the Group subtree.
    async fn check_access_control(&self, ctx: &RequestContext, path: &Parsed, entry: &DirEntry) -> Result<(), DirError> {
        let access_file = is_access_file(path);
        let group = is_group_file(path);
        if !access_file && !group {
            return Ok(());
        }
        let name = path.path();
        if ctx.requester() != path.user() {
            return Err(DirError::Permission(name));
        }

        if group {
            if path.n_elem() == 1 {
                return if entry.is_dir() {
                    Ok(())
                } else {
                    Err(DirError::invalid(name, "Group must be a directory"))
                };
            }
            if entry.is_link() {
                return Err(DirError::invalid(name, "links are not allowed in the Group tree"));
            }
            if path.elems()[1..].iter().any(|e| e.contains('@')) {
                return Err(DirError::invalid(name, "group names must not look like user names"));
            }
        }
        if access_file && !entry.is_regular() {
            return Err(DirError::invalid(name, "Access must be a regular file"));
        }
        if !entry.is_regular() {
            return Ok(());
        }
        if entry.packing.is_encrypted() {
            return Err(DirError::invalid(name, "access control files must not be encrypted"));
        }

        let data = match self.content.fetch(entry).await {
            Ok(data) => data,
            Err(ContentError::Http(e)) => return Err(internal(ctx, OP, &name, e)),
            Err(e) => return Err(DirError::invalid(name, format!("unreadable contents: {e}"))),
        };
        let parsed = if access_file {
            Access::parse(&name, &data).map(|_| ())
        } else {
            parse_group(path, &data).map(|_| ())
        };
        parsed.map_err(|e| DirError::invalid(name, e.to_string()))
    }
}

/// Field consistency for each kind. Directories are normalised rather
/// than rejected.
fn check_shape(ctx: &RequestContext, entry: &mut DirEntry) -> Result<(), DirError> {
    let name = entry.name.clone();
    if entry.incomplete {
        return Err(DirError::invalid(name, "cannot put an incomplete entry"));
    }
    if entry.sequence < SEQ_NOT_EXIST {
        return Err(DirError::invalid(name, "invalid sequence"));
    }
    if !entry.signed_name.is_empty() && entry.signed_name != entry.name {
        return Err(DirError::invalid(name, "signed name does not match name"));
    }
    entry.signed_name = entry.name.clone();

    match entry.kind {
        EntryKind::Directory => {
            entry.blocks.clear();
            entry.packdata.clear();
            entry.packing = Packing::default();
            entry.link = None;
            entry.writer = ctx.requester().clone();
            return Ok(());
        }
        EntryKind::Link => {
            let target = entry
                .link
                .as_ref()
                .ok_or_else(|| DirError::invalid(name.clone(), "link has no target"))?;
            let target = Parsed::parse(target)
                .map_err(|e| DirError::invalid(name.clone(), format!("invalid link target: {e}")))?;
            if !entry.blocks.is_empty() {
                return Err(DirError::invalid(name, "link cannot have blocks"));
            }
            entry.link = Some(target.path());
        }
        EntryKind::File => {
            if entry.link.is_some() {
                return Err(DirError::invalid(name, "regular file cannot have a link target"));
            }
            if entry.size().is_none() {
                return Err(DirError::invalid(name, "invalid block sizes"));
            }
        }
    }

    if entry.writer != *ctx.requester() {
        return Err(DirError::invalid(name, "writer must be the requester"));
    }
    Ok(())
}
