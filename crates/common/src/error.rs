use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::path::PathName;

/// Errors surfaced to directory clients.
///
/// `Private` is returned whenever the requester holds no right at all on a
/// path, so that existence is not leaked; `Permission` only once the
/// requester is known to hold some other right.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirError {
    #[error("{name}: invalid operation: {reason}")]
    Invalid { name: PathName, reason: String },
    #[error("{0}: information withheld")]
    Private(PathName),
    #[error("{0}: permission denied")]
    Permission(PathName),
    #[error("{0}: item does not exist")]
    NotExist(PathName),
    #[error("{0}: item already exists")]
    Exist(PathName),
    #[error("{0}: item is not a directory")]
    NotDir(PathName),
    #[error("{0}: directory not empty")]
    NotEmpty(PathName),
    #[error("{0}: sequence number mismatch")]
    Conflict(PathName),
    /// Details stay in the server log under `reference`.
    #[error("internal server error (reference {reference})")]
    Internal { reference: Uuid },
    #[error("operation not supported")]
    NotSupported,
    #[error("operation timed out")]
    Timeout,
}

/// Stable, wire-visible error discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Invalid,
    Private,
    Permission,
    NotExist,
    Exist,
    NotDir,
    NotEmpty,
    Conflict,
    Internal,
    NotSupported,
    Timeout,
}

impl DirError {
    pub fn invalid(name: impl Into<PathName>, reason: impl Into<String>) -> Self {
        DirError::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DirError::Invalid { .. } => ErrorKind::Invalid,
            DirError::Private(_) => ErrorKind::Private,
            DirError::Permission(_) => ErrorKind::Permission,
            DirError::NotExist(_) => ErrorKind::NotExist,
            DirError::Exist(_) => ErrorKind::Exist,
            DirError::NotDir(_) => ErrorKind::NotDir,
            DirError::NotEmpty(_) => ErrorKind::NotEmpty,
            DirError::Conflict(_) => ErrorKind::Conflict,
            DirError::Internal { .. } => ErrorKind::Internal,
            DirError::NotSupported => ErrorKind::NotSupported,
            DirError::Timeout => ErrorKind::Timeout,
        }
    }
}

/// The result of an operation that may stop at a link.
///
/// When path resolution meets a link, the link entry is handed back instead
/// of a result; the client rewrites the path using the link target and
/// retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Complete(T),
    FollowLink(crate::entry::DirEntry),
}

impl<T> Resolution<T> {
    pub fn is_follow_link(&self) -> bool {
        matches!(self, Resolution::FollowLink(_))
    }

    pub fn complete(self) -> Option<T> {
        match self {
            Resolution::Complete(t) => Some(t),
            Resolution::FollowLink(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Complete(t) => Resolution::Complete(f(t)),
            Resolution::FollowLink(link) => Resolution::FollowLink(link),
        }
    }
}
