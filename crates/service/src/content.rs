//! Reading file contents out of the block store.
//!
//! The directory server only ever needs the bytes of Access and Group
//! files, which are small and stored unencrypted. Anything declaring more
//! than [`MAX_CONTENT_SIZE`] bytes is refused before a block is fetched.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use common::entry::{DirBlock, DirEntry, Endpoint, Location, Transport};
use common::path::PathName;

/// Upper bound on the contents of an Access or Group file.
pub const MAX_CONTENT_SIZE: i64 = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} has invalid block sizes")]
    BadBlockSize(PathName),
    #[error("{name} declares {size} bytes, more than the {limit} allowed")]
    TooLarge { name: PathName, size: i64, limit: i64 },
    #[error("{0} is not a regular file")]
    NotFile(PathName),
    #[error("{0} is encrypted")]
    Encrypted(PathName),
    #[error("{0} was returned without its contents")]
    Incomplete(PathName),
    #[error("block {0} not found")]
    BlockNotFound(String),
    #[error("block {reference} has {got} bytes, expected {want}")]
    ShortBlock {
        reference: String,
        got: usize,
        want: i64,
    },
    #[error("invalid block store address: {0}")]
    Url(#[from] url::ParseError),
    #[error("block store request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait ContentFetcher: Send + Sync + Debug {
    /// Concatenated contents of every block of `entry`.
    async fn fetch(&self, entry: &DirEntry) -> Result<Vec<u8>, ContentError>;
}

fn check_readable(entry: &DirEntry) -> Result<(), ContentError> {
    if !entry.is_regular() {
        return Err(ContentError::NotFile(entry.name.clone()));
    }
    if entry.packing.is_encrypted() {
        return Err(ContentError::Encrypted(entry.name.clone()));
    }
    if entry.incomplete {
        return Err(ContentError::Incomplete(entry.name.clone()));
    }
    let size = entry
        .size()
        .ok_or_else(|| ContentError::BadBlockSize(entry.name.clone()))?;
    if size > MAX_CONTENT_SIZE {
        return Err(ContentError::TooLarge {
            name: entry.name.clone(),
            size,
            limit: MAX_CONTENT_SIZE,
        });
    }
    Ok(())
}

fn check_size(block: &DirBlock, data: &[u8]) -> Result<(), ContentError> {
    if data.len() as i64 != block.size {
        return Err(ContentError::ShortBlock {
            reference: block.location.reference.clone(),
            got: data.len(),
            want: block.size,
        });
    }
    Ok(())
}

/// Fetches blocks over HTTP from `http://<net_addr>/api/v0/store/<reference>`.
#[derive(Debug, Clone)]
pub struct HttpContentFetcher {
    client: reqwest::Client,
}

impl HttpContentFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn block_url(location: &Location) -> Result<url::Url, url::ParseError> {
        let base = url::Url::parse(&format!("http://{}/", location.endpoint.net_addr))?;
        base.join(&format!("api/v0/store/{}", location.reference))
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, entry: &DirEntry) -> Result<Vec<u8>, ContentError> {
        check_readable(entry)?;

        let mut data = Vec::new();
        for block in &entry.blocks {
            let url = Self::block_url(&block.location)?;
            tracing::debug!(%url, name = %entry.name, "fetching block");
            let response = self.client.get(url).send().await?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(ContentError::BlockNotFound(block.location.reference.clone()));
            }
            let mut response = response.error_for_status()?;

            // the store may send more than the block claims; stop reading at once
            let mut bytes = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                bytes.extend_from_slice(&chunk);
                if bytes.len() as i64 > block.size {
                    break;
                }
            }
            check_size(block, &bytes)?;
            data.extend_from_slice(&bytes);
        }
        Ok(data)
    }
}

/// Block store held in memory. Blocks are keyed by reference only.
#[derive(Debug, Clone, Default)]
pub struct MemoryContent {
    blocks: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` as a single block and returns its location.
    pub fn store(&self, data: &[u8]) -> DirBlock {
        let reference = uuid::Uuid::new_v4().to_string();
        self.blocks.write().insert(reference.clone(), data.to_vec());
        DirBlock {
            location: Location {
                endpoint: Endpoint {
                    transport: Transport::InProcess,
                    net_addr: String::new(),
                },
                reference,
            },
            offset: 0,
            size: data.len() as i64,
            packdata: Vec::new(),
        }
    }

    pub fn remove(&self, reference: &str) {
        self.blocks.write().remove(reference);
    }
}

#[async_trait]
impl ContentFetcher for MemoryContent {
    async fn fetch(&self, entry: &DirEntry) -> Result<Vec<u8>, ContentError> {
        check_readable(entry)?;

        let blocks = self.blocks.read();
        let mut data = Vec::new();
        for block in &entry.blocks {
            let bytes = blocks
                .get(&block.location.reference)
                .ok_or_else(|| ContentError::BlockNotFound(block.location.reference.clone()))?;
            check_size(block, bytes)?;
            data.extend_from_slice(bytes);
        }
        Ok(data)
    }
}
