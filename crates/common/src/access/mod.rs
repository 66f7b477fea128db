//! # Access control files
//!
//! Rights in a tree are granted by plain-text files named `Access`. The
//! nearest `Access` file at or above a directory governs everything in it.
//! Each non-comment line has the form
//!
//! ```text
//! read, list: bob@example.com, *@example.org, friends
//! *: carol@example.com
//! ```
//!
//! Grantees are user names, `*@domain` wildcards, `all`, or group files.
//! A bare group name refers to `<owner>/Group/<name>`; a full path may name
//! a group in another user's tree. Group files themselves are parsed by
//! [`parse_group`].
//!
//! With no `Access` file anywhere above a path only the tree owner has
//! rights, and the owner always holds every right on the access-control
//! files themselves.

use std::collections::BTreeMap;
use std::fmt;

use crate::path::{Parsed, PathError, PathName, UserName};

mod group;

pub use group::parse_group;

pub const ACCESS_FILE: &str = "Access";
pub const GROUP_DIR: &str = "Group";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("invalid access file name: {0}")]
    InvalidName(#[from] PathError),
    #[error("{0} is not an Access file")]
    NotAccessFile(PathName),
    #[error("{0}: contents are not valid UTF-8")]
    NotUtf8(PathName),
    #[error("{name}:{line}: {msg}")]
    Syntax {
        name: PathName,
        line: usize,
        msg: String,
    },
    #[error("{name}:{line}: invalid grantee {grantee:?}")]
    InvalidGrantee {
        name: PathName,
        line: usize,
        grantee: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Right {
    Read,
    Write,
    List,
    Create,
    Delete,
    /// Satisfied by holding any of the five concrete rights.
    Any,
}

impl Right {
    pub const GRANTABLE: [Right; 5] = [
        Right::Read,
        Right::Write,
        Right::List,
        Right::Create,
        Right::Delete,
    ];

    fn parse(word: &str) -> Option<Right> {
        match word.to_ascii_lowercase().as_str() {
            "r" | "read" => Some(Right::Read),
            "w" | "write" => Some(Right::Write),
            "l" | "list" => Some(Right::List),
            "c" | "create" => Some(Right::Create),
            "d" | "delete" => Some(Right::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Right::Read => "read",
            Right::Write => "write",
            Right::List => "list",
            Right::Create => "create",
            Right::Delete => "delete",
            Right::Any => "any",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grantee {
    User(UserName),
    /// `*@domain`
    Domain(String),
    All,
    Group(PathName),
}

impl Grantee {
    /// Parses one grantee token. Bare names resolve to groups owned by `owner`.
    pub fn parse(token: &str, owner: &UserName) -> Option<Grantee> {
        if token.eq_ignore_ascii_case("all") {
            return Some(Grantee::All);
        }
        if token.contains('/') {
            let parsed = Parsed::parse(&PathName::from(token)).ok()?;
            if parsed.n_elem() < 2 || parsed.elem(0) != GROUP_DIR {
                return None;
            }
            return Some(Grantee::Group(parsed.path()));
        }
        if let Some(domain) = token.strip_prefix("*@") {
            // borrow the user-name validation for the domain half
            let sample = UserName::parse(&format!("x@{domain}")).ok()?;
            return Some(Grantee::Domain(sample.domain().to_string()));
        }
        if token.contains('@') {
            return UserName::parse(token).ok().map(Grantee::User);
        }
        if token.is_empty() || token.contains(['*', '?', '[']) {
            return None;
        }
        let group = Parsed::root(owner.clone()).join(GROUP_DIR).join(token);
        Some(Grantee::Group(group.path()))
    }

    /// Direct match against a user. Groups never match here; they have to
    /// be expanded by the caller.
    pub fn matches(&self, user: &UserName) -> bool {
        match self {
            Grantee::User(u) => u == user,
            Grantee::Domain(d) => user.domain() == d,
            Grantee::All => true,
            Grantee::Group(_) => false,
        }
    }
}

/// Outcome of checking a right against one parsed Access file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Granted,
    Denied,
    /// Not granted directly, but membership in one of these groups would.
    Groups(Vec<PathName>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    path: PathName,
    owner: UserName,
    grants: BTreeMap<Right, Vec<Grantee>>,
}

impl Access {
    pub fn parse(name: &PathName, data: &[u8]) -> Result<Access, AccessError> {
        let parsed = Parsed::parse(name)?;
        if !is_access_file(&parsed) {
            return Err(AccessError::NotAccessFile(name.clone()));
        }
        let name = parsed.path();
        let text = std::str::from_utf8(data).map_err(|_| AccessError::NotUtf8(name.clone()))?;
        let owner = parsed.user().clone();

        let mut grants: BTreeMap<Right, Vec<Grantee>> = BTreeMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let syntax = |msg: &str| AccessError::Syntax {
                name: name.clone(),
                line,
                msg: msg.to_string(),
            };

            let (rights_part, users_part) =
                content.split_once(':').ok_or_else(|| syntax("missing ':'"))?;

            let mut rights = Vec::new();
            for word in tokens(rights_part) {
                if word == "*" {
                    rights.extend(Right::GRANTABLE);
                } else {
                    let right = Right::parse(word)
                        .ok_or_else(|| syntax(&format!("unknown right {word:?}")))?;
                    rights.push(right);
                }
            }
            if rights.is_empty() {
                return Err(syntax("no rights named"));
            }

            let mut users = Vec::new();
            for token in tokens(users_part) {
                let grantee =
                    Grantee::parse(token, &owner).ok_or_else(|| AccessError::InvalidGrantee {
                        name: name.clone(),
                        line,
                        grantee: token.to_string(),
                    })?;
                users.push(grantee);
            }
            if users.is_empty() {
                return Err(syntax("no users named"));
            }

            for right in rights {
                let list = grants.entry(right).or_default();
                for user in &users {
                    if !list.contains(user) {
                        list.push(user.clone());
                    }
                }
            }
        }

        Ok(Access {
            path: name,
            owner,
            grants,
        })
    }

    pub fn path(&self) -> &PathName {
        &self.path
    }

    pub fn owner(&self) -> &UserName {
        &self.owner
    }

    /// Grantees holding `right`. For [`Right::Any`] the union over all rights.
    pub fn grantees(&self, right: Right) -> Vec<&Grantee> {
        let mut out: Vec<&Grantee> = Vec::new();
        let rights: &[Right] = match right {
            Right::Any => &Right::GRANTABLE,
            ref r => std::slice::from_ref(r),
        };
        for r in rights {
            for g in self.grants.get(r).into_iter().flatten() {
                if !out.contains(&g) {
                    out.push(g);
                }
            }
        }
        out
    }

    /// Every group file referenced anywhere in this Access file.
    pub fn groups(&self) -> Vec<PathName> {
        let mut out = Vec::new();
        for grantee in self.grantees(Right::Any) {
            if let Grantee::Group(g) = grantee {
                out.push(g.clone());
            }
        }
        out
    }

    /// Checks `right` for `requester` on `path` without expanding groups.
    pub fn check(&self, requester: &UserName, right: Right, path: &Parsed) -> Check {
        if requester == path.user() && is_access_control_file(path) {
            return Check::Granted;
        }
        let mut groups = Vec::new();
        for grantee in self.grantees(right) {
            match grantee {
                Grantee::Group(g) => groups.push(g.clone()),
                other if other.matches(requester) => return Check::Granted,
                _ => {}
            }
        }
        if groups.is_empty() {
            Check::Denied
        } else {
            Check::Groups(groups)
        }
    }
}

/// Splits on commas and whitespace, dropping empties.
pub(crate) fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

pub fn is_access_file(path: &Parsed) -> bool {
    path.last() == Some(ACCESS_FILE)
}

/// The `Group` directory itself or anything beneath it.
pub fn is_group_file(path: &Parsed) -> bool {
    path.n_elem() >= 1 && path.elem(0) == GROUP_DIR
}

pub fn is_access_control_file(path: &Parsed) -> bool {
    is_access_file(path) || is_group_file(path)
}
