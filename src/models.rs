//! Domain and API data models.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        }
    }
}

/// One file or folder record produced by the traversal.
///
/// Entries are immutable once constructed; the index holds them in
/// traversal order (a parent always precedes its children).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    /// Slash-joined path from the root folder name down to this entry.
    pub path: String,
    pub kind: EntryKind,
    /// Identifier of the containing folder; `None` only for the root entry.
    pub parent: Option<String>,
    /// Sharable link for this entry.
    pub link: String,
    /// Size in bytes. Folders carry no size.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl Entry {
    /// Size in kilobytes, rounded to two decimals. Folders and entries
    /// without a reported size yield 0.
    pub fn size_kb(&self) -> f64 {
        match (self.kind, self.size) {
            (EntryKind::File, Some(bytes)) => (bytes as f64 / 1024.0 * 100.0).round() / 100.0,
            _ => 0.0,
        }
    }
}

/// The complete set of entries for one run, rooted at a configured folder.
///
/// Deduplicated by identifier; insertion order is traversal order.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<Entry>,
    ids: HashSet<String>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning `false` if its id is already present.
    ///
    /// The parent of a pushed entry must already be in the index, which the
    /// pre-order traversal guarantees.
    pub fn push(&mut self, entry: Entry) -> bool {
        if !self.ids.insert(entry.id.clone()) {
            return false;
        }
        debug_assert!(entry
            .parent
            .as_ref()
            .map_or(true, |p| self.ids.contains(p)));
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// The root entry, when the index is non-empty.
    pub fn root(&self) -> Option<&Entry> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ---------------------------------------------------------------------------
// Google Drive API models
// ---------------------------------------------------------------------------

/// Metadata for a file or folder returned by the Drive API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
    #[serde(default)]
    pub owners: Vec<DriveUser>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

// The Drive API reports size as a decimal string.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveUser {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Response from the files.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account credentials from a JSON key file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// Authorized-user credentials as written by the Google OAuth token cache
/// (`token.json`).
#[derive(Debug, Deserialize)]
pub struct AuthorizedUserCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_uri: Option<String>,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// Dropbox API models
// ---------------------------------------------------------------------------

/// One entry from files/list_folder or files/get_metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct DropboxEntry {
    #[serde(rename = ".tag")]
    pub tag: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub client_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub server_modified: Option<DateTime<Utc>>,
}

/// Response from files/list_folder and files/list_folder/continue.
#[derive(Debug, Deserialize)]
pub struct ListFolderResponse {
    #[serde(default)]
    pub entries: Vec<DropboxEntry>,
    pub cursor: String,
    pub has_more: bool,
}

/// Response from sharing/list_shared_links.
#[derive(Debug, Deserialize)]
pub struct SharedLinkList {
    #[serde(default)]
    pub links: Vec<SharedLink>,
}

/// A shared link, as returned by the sharing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedLink {
    pub url: String,
}

/// Dropbox API error body.
#[derive(Debug, Deserialize)]
pub struct DropboxErrorResponse {
    pub error_summary: String,
}
