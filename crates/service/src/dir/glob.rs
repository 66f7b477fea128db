use common::access::Right;
use common::dir_store::DirStore;
use common::entry::DirEntry;
use common::error::{DirError, Resolution};
use common::path::{pattern, Parsed, PathName};

use super::{internal, with_deadline, DirServer};
use crate::context::RequestContext;

const OP: &str = "dir.Glob";

/// Entries matching a glob pattern, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobMatches {
    pub entries: Vec<DirEntry>,
    /// Set when at least one of `entries` is a link that interrupted
    /// expansion and has to be followed by the client.
    pub follow_link: bool,
}

impl GlobMatches {
    fn push_link(&mut self, link: DirEntry) {
        self.entries.push(link);
        self.follow_link = true;
    }
}

impl<S: DirStore> DirServer<S> {
    /// Matches `pattern` one element at a time, starting below its literal
    /// prefix. Branches the requester cannot see are skipped silently, except
    /// at the first listed level where the error is returned.
    pub async fn glob(&self, ctx: &RequestContext, pattern: &str) -> Result<GlobMatches, DirError> {
        with_deadline(ctx, OP, self.glob_inner(ctx, pattern)).await
    }

    async fn glob_inner(&self, ctx: &RequestContext, raw: &str) -> Result<GlobMatches, DirError> {
        let name = PathName::from(raw);
        let parsed = Self::parse(&name)?;
        let bad_pattern = |e: pattern::PatternError| DirError::invalid(name.clone(), e.to_string());
        let compiled = parsed
            .elems()
            .iter()
            .map(|elem| pattern::compile(elem))
            .collect::<Result<Vec<_>, _>>()
            .map_err(bad_pattern)?;

        let Some(first_meta) = parsed.elems().iter().position(|e| pattern::has_meta(e)) else {
            return match self.lookup_inner(ctx, &parsed.path()).await {
                Ok(Resolution::Complete(entry)) => Ok(GlobMatches {
                    entries: vec![entry],
                    follow_link: false,
                }),
                Ok(Resolution::FollowLink(link)) => Ok(GlobMatches {
                    entries: vec![link],
                    follow_link: true,
                }),
                Err(DirError::NotExist(_)) => Ok(GlobMatches::default()),
                Err(e) => Err(e),
            };
        };

        let mut matches = GlobMatches::default();
        let mut dirs = vec![parsed.first(first_meta)];
        for depth in first_meta..parsed.n_elem() {
            let elem = &compiled[depth];
            let last = depth + 1 == parsed.n_elem();
            let mut next = Vec::new();

            for dir in dirs {
                let listing = match self.list_dir(ctx, &dir).await {
                    Ok(listing) => listing,
                    Err(DirError::NotExist(_)) => continue,
                    Err(DirError::Private(_) | DirError::Permission(_)) if depth > first_meta => {
                        continue
                    }
                    Err(e) => return Err(e),
                };
                let children = match listing {
                    Resolution::Complete(children) => children,
                    Resolution::FollowLink(link) => {
                        matches.push_link(link);
                        continue;
                    }
                };

                for child in children {
                    let child_path = Self::parse(&child.name)?;
                    let Some(child_elem) = child_path.last() else {
                        continue;
                    };
                    if !elem.matches(child_elem) {
                        continue;
                    }
                    if last {
                        matches.entries.push(child);
                    } else if child.is_dir() {
                        next.push(child_path);
                    } else if child.is_link() {
                        matches.push_link(child);
                    }
                }
            }
            dirs = next;
        }

        matches.entries.sort_by(|a, b| a.name.cmp(&b.name));
        matches.entries.dedup_by(|a, b| a.name == b.name);
        Ok(matches)
    }

    /// Children of `dir`, gated by List and elided per Read.
    async fn list_dir(&self, ctx: &RequestContext, dir: &Parsed) -> Result<Resolution<Vec<DirEntry>>, DirError> {
        let resolved = match self.resolve(ctx, OP, dir.clone()).await? {
            Resolution::Complete(resolved) => resolved,
            Resolution::FollowLink(link) => return Ok(Resolution::FollowLink(link)),
        };
        let access = resolved.access.as_deref();
        let name = dir.path();

        if !self.can(ctx, OP, access, Right::List, dir).await? {
            return Err(DirError::Permission(name));
        }
        if !resolved.entry.is_dir() {
            return Ok(Resolution::Complete(Vec::new()));
        }

        let dir_ref = self
            .store
            .lookup_elem(dir)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?
            .filter(|r| r.path == *dir)
            .ok_or_else(|| DirError::NotExist(name.clone()))?;
        let mut children = self
            .store
            .list(&dir_ref)
            .await
            .map_err(|e| internal(ctx, OP, &name, e))?;

        if !self.can(ctx, OP, access, Right::Read, dir).await? {
            for child in children.iter_mut() {
                if !child.is_access_control() {
                    child.mark_incomplete();
                }
            }
        }
        Ok(Resolution::Complete(children))
    }
}
