//! Storage backend abstraction.
//!
//! The indexer only needs three operations from a vendor API: look up one
//! entry, list the children of a folder one page at a time, and obtain a
//! sharable link. Each vendor client implements [`StorageBackend`] so the
//! traversal stays vendor-agnostic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{format_size, DriveFile, DropboxEntry, EntryKind};

/// A file or folder as reported by a vendor listing call, before it is
/// placed in the index.
#[derive(Debug, Clone)]
pub struct ChildEntry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    /// Sharable link, when the listing payload already carried one.
    pub link: Option<String>,
    pub size: Option<u64>,
    pub owner: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
}

impl std::fmt::Display for ChildEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size_str = self
            .size
            .map(format_size)
            .unwrap_or_else(|| "-".to_string());
        let kind = self.mime_type.as_deref().unwrap_or(self.kind.as_str());
        write!(f, "{}\t{}\t{}\t{}", self.id, size_str, kind, self.name)
    }
}

/// One page of a folder listing.
#[derive(Debug)]
pub struct ChildPage {
    pub entries: Vec<ChildEntry>,
    /// Token for the next page, absent on the last page.
    pub next_page_token: Option<String>,
}

/// The two vendor calls the indexer consumes, plus a metadata lookup for
/// the root folder.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch metadata for a single entry by identifier.
    async fn metadata(&self, id: &str) -> Result<ChildEntry>;

    /// List one page of children of a folder. Pass the token from the
    /// previous page to continue; `None` requests the first page.
    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChildPage>;

    /// Retrieve or create a sharable link for an entry.
    async fn share_link(&self, id: &str) -> Result<String>;
}

/// Retry behavior for rate-limited API calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts before giving up.
    pub max_retries: u32,
    /// Cap on a single backoff sleep, in seconds.
    pub max_sleep_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 7,
            max_sleep_secs: 64,
        }
    }
}

/// Send a request, retrying on HTTP 429 with jittered exponential backoff.
/// Any other status is returned as-is.
pub(crate) async fn send_with_retry<F>(policy: RetryPolicy, build: F) -> Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    use rand::Rng;

    for attempt in 0..policy.max_retries {
        let response = build().send().await?;
        if response.status().as_u16() != 429 {
            return Ok(response);
        }

        let max_sleep = 2u64.pow(attempt).min(policy.max_sleep_secs);
        let sleep_secs = rand::thread_rng().gen_range(0.0..=max_sleep as f64);
        tracing::warn!(attempt, sleep_secs, "rate limited, sleeping before retry");
        tokio::time::sleep(std::time::Duration::from_secs_f64(sleep_secs)).await;
    }

    Err(crate::error::IndexError::RateLimited {
        retries: policy.max_retries,
    })
}

impl From<DriveFile> for ChildEntry {
    fn from(file: DriveFile) -> Self {
        let kind = if file.mime_type.as_deref() == Some(crate::drive::FOLDER_MIME_TYPE) {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        let owner = file
            .owners
            .first()
            .and_then(|o| o.display_name.clone());
        ChildEntry {
            id: file.id,
            name: file.name,
            kind,
            link: file.web_view_link,
            size: file.size,
            owner,
            created: file.created_time,
            modified: file.modified_time,
            mime_type: file.mime_type,
        }
    }
}

impl From<DropboxEntry> for ChildEntry {
    fn from(entry: DropboxEntry) -> Self {
        let kind = if entry.tag == "folder" {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
        ChildEntry {
            id: entry.id,
            name: entry.name,
            kind,
            link: None,
            size: entry.size,
            owner: None,
            created: entry.client_modified,
            modified: entry.server_modified,
            mime_type: None,
        }
    }
}
