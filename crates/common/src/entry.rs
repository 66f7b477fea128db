//! # Directory entries
//!
//! A [`DirEntry`] is the metadata record for one name in a user's tree.
//! File contents live in an external block store and are referenced by
//! [`DirBlock`] locations; this server never reads them except for the
//! small access-control files it has to interpret.

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

use crate::access::is_access_control_file;
use crate::path::{Parsed, PathName, UserName};

/// Monotonic per-path version number.
pub type Sequence = i64;

/// Put condition: the entry must not already exist.
pub const SEQ_NOT_EXIST: Sequence = -1;
/// Put condition: overwrite whatever is there.
pub const SEQ_IGNORE: Sequence = 0;
/// The first sequence ever assigned.
pub const SEQ_BASE: Sequence = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("unknown packing {0}")]
    UnknownPacking(u8),
    #[error("unknown transport {0}")]
    UnknownTransport(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    Link,
}

/// How the referenced blocks are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Packing {
    #[default]
    Plain,
    /// End-to-end encrypted.
    EE,
    /// Signed but not encrypted.
    EEIntegrity,
}

impl Packing {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Packing::EE)
    }
}

impl TryFrom<u8> for Packing {
    type Error = EntryError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Packing::Plain),
            20 => Ok(Packing::EE),
            21 => Ok(Packing::EEIntegrity),
            other => Err(EntryError::UnknownPacking(other)),
        }
    }
}

impl From<Packing> for u8 {
    fn from(packing: Packing) -> Self {
        match packing {
            Packing::Plain => 1,
            Packing::EE => 20,
            Packing::EEIntegrity => 21,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Transport {
    #[default]
    Unassigned,
    InProcess,
    Remote,
}

impl TryFrom<u8> for Transport {
    type Error = EntryError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Transport::Unassigned),
            1 => Ok(Transport::InProcess),
            2 => Ok(Transport::Remote),
            other => Err(EntryError::UnknownTransport(other)),
        }
    }
}

impl From<Transport> for u8 {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Unassigned => 0,
            Transport::InProcess => 1,
            Transport::Remote => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub transport: Transport,
    pub net_addr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub endpoint: Endpoint,
    pub reference: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirBlock {
    pub location: Location,
    pub offset: i64,
    pub size: i64,
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub packdata: Vec<u8>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: PathName,
    #[serde(default)]
    pub signed_name: PathName,
    pub kind: EntryKind,
    /// Set when the requester may see the entry but not its contents.
    #[serde(default)]
    pub incomplete: bool,
    #[serde(default)]
    pub packing: Packing,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub blocks: Vec<DirBlock>,
    #[serde_as(as = "Base64")]
    #[serde(default)]
    pub packdata: Vec<u8>,
    #[serde(default)]
    pub link: Option<PathName>,
    pub writer: UserName,
    #[serde(default)]
    pub sequence: Sequence,
}

impl DirEntry {
    pub fn directory(name: PathName, writer: UserName) -> Self {
        Self::new(name, EntryKind::Directory, writer)
    }

    pub fn file(name: PathName, writer: UserName, packing: Packing) -> Self {
        let mut entry = Self::new(name, EntryKind::File, writer);
        entry.packing = packing;
        entry
    }

    pub fn link(name: PathName, target: PathName, writer: UserName) -> Self {
        let mut entry = Self::new(name, EntryKind::Link, writer);
        entry.link = Some(target);
        entry
    }

    fn new(name: PathName, kind: EntryKind, writer: UserName) -> Self {
        Self {
            signed_name: name.clone(),
            name,
            kind,
            incomplete: false,
            packing: Packing::default(),
            time: 0,
            blocks: Vec::new(),
            packdata: Vec::new(),
            link: None,
            writer,
            sequence: SEQ_IGNORE,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_link(&self) -> bool {
        self.kind == EntryKind::Link
    }

    pub fn is_regular(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Whether the entry is an Access file or lives under a Group directory.
    /// Unparseable names are never special.
    pub fn is_access_control(&self) -> bool {
        Parsed::parse(&self.name)
            .map(|p| is_access_control_file(&p))
            .unwrap_or(false)
    }

    /// Hides the contents of a regular file from a requester without read
    /// rights. Directories and links carry no contents and are left alone.
    pub fn mark_incomplete(&mut self) {
        if !self.is_regular() {
            return;
        }
        self.incomplete = true;
        self.blocks.clear();
        self.packdata.clear();
    }

    /// Total of the block sizes. `None` when a block claims a negative
    /// size or the total does not fit.
    pub fn size(&self) -> Option<i64> {
        self.blocks.iter().try_fold(0i64, |total, b| {
            if b.size < 0 {
                return None;
            }
            total.checked_add(b.size)
        })
    }
}
