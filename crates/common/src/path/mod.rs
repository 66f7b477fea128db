//! # Path names
//!
//! Every path in the tree begins with the identity of the user who owns it:
//! `ann@example.com/docs/notes.txt`. The user component is the *root* of the
//! user's tree; the rest is a sequence of non-empty elements.
//!
//! Two representations are used throughout:
//! - [`PathName`]: the unvalidated string a client sends us
//! - [`Parsed`]: a cleaned, validated decomposition into user and elements
//!
//! Cleaning collapses repeated slashes, drops `.` elements and resolves `..`
//! (never above the root). A root is written with a trailing slash,
//! `ann@example.com/`, everything else without one.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod pattern;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty path name")]
    Empty,
    #[error("invalid user name {0:?}")]
    InvalidUser(String),
    #[error("invalid element {elem:?} in {name}")]
    InvalidElement { name: String, elem: String },
}

/// A user identity of the form `local@domain`.
///
/// Domains are case-insensitive and stored lower-cased; the local part is
/// kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let invalid = || PathError::InvalidUser(s.to_string());
        let (local, domain) = s.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        if local == "*" {
            return Err(invalid());
        }
        let bad_char = |c: char| c == '/' || c.is_whitespace() || c.is_control();
        if local.chars().any(bad_char) || domain.chars().any(bad_char) {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(invalid());
        }
        Ok(Self(format!("{}@{}", local, domain.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local(&self) -> &str {
        self.0.split_once('@').map(|(l, _)| l).unwrap_or_default()
    }

    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserName {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserName {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<UserName> for String {
    fn from(user: UserName) -> Self {
        user.0
    }
}

/// A path name as sent over the wire. Not validated until parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathName(String);

impl PathName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PathName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PathName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PathName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A cleaned path: the owning user plus zero or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parsed {
    user: UserName,
    elems: Vec<String>,
}

impl Parsed {
    pub fn parse(name: &PathName) -> Result<Self, PathError> {
        let raw = name.as_str();
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        let (user, rest) = raw.split_once('/').unwrap_or((raw, ""));
        let user = UserName::parse(user)?;

        let mut elems: Vec<String> = Vec::new();
        for elem in rest.split('/') {
            match elem {
                "" | "." => {}
                ".." => {
                    elems.pop();
                }
                e if e.chars().any(|c| c.is_control()) => {
                    return Err(PathError::InvalidElement {
                        name: raw.to_string(),
                        elem: e.to_string(),
                    });
                }
                e => elems.push(e.to_string()),
            }
        }
        Ok(Self { user, elems })
    }

    pub fn root(user: UserName) -> Self {
        Self {
            user,
            elems: Vec::new(),
        }
    }

    pub fn user(&self) -> &UserName {
        &self.user
    }

    pub fn elems(&self) -> &[String] {
        &self.elems
    }

    pub fn n_elem(&self) -> usize {
        self.elems.len()
    }

    /// Panics if `i` is out of range, like slice indexing.
    pub fn elem(&self, i: usize) -> &str {
        &self.elems[i]
    }

    pub fn last(&self) -> Option<&str> {
        self.elems.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.elems.is_empty()
    }

    /// The path made of the first `n` elements, clamped to the length.
    pub fn first(&self, n: usize) -> Parsed {
        let n = n.min(self.elems.len());
        Self {
            user: self.user.clone(),
            elems: self.elems[..n].to_vec(),
        }
    }

    /// The path with the last `n` elements removed, never going past the root.
    pub fn drop_elems(&self, n: usize) -> Parsed {
        self.first(self.elems.len().saturating_sub(n))
    }

    pub fn parent(&self) -> Option<Parsed> {
        if self.is_root() {
            None
        } else {
            Some(self.drop_elems(1))
        }
    }

    /// Appends a single element. The caller guarantees `elem` holds no `/`.
    pub fn join(&self, elem: &str) -> Parsed {
        let mut elems = self.elems.clone();
        elems.push(elem.to_string());
        Self {
            user: self.user.clone(),
            elems,
        }
    }

    /// Strict ancestors, root first.
    pub fn ancestors(&self) -> impl Iterator<Item = Parsed> + '_ {
        (0..self.elems.len()).map(move |i| self.first(i))
    }

    pub fn has_prefix(&self, other: &Parsed) -> bool {
        self.user == other.user && self.elems.starts_with(&other.elems)
    }

    /// The canonical name, e.g. `ann@example.com/docs` or `ann@example.com/`.
    pub fn path(&self) -> PathName {
        PathName(format!("{}{}", self.user, self.file_path()))
    }

    /// The path below the user, always starting with `/`.
    pub fn file_path(&self) -> String {
        format!("/{}", self.elems.join("/"))
    }
}

impl fmt::Display for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.user, self.file_path())
    }
}
