//! Dropbox backend.
//!
//! Dropbox exposes listing as an RPC pair (`files/list_folder` plus
//! `files/list_folder/continue`); the cursor doubles as the page token.
//! Unlike Drive, listing payloads carry no link, so every entry goes
//! through the sharing endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::backend::{send_with_retry, ChildEntry, ChildPage, RetryPolicy, StorageBackend};
use crate::error::{IndexError, Result};
use crate::models::{
    DropboxEntry, DropboxErrorResponse, EntryKind, ListFolderResponse, SharedLink, SharedLinkList,
};

/// Base URL for the Dropbox API v2 RPC endpoints.
const DROPBOX_API_BASE: &str = "https://api.dropboxapi.com/2";

/// Page size requested from files/list_folder.
const PAGE_LIMIT: u32 = 1000;

/// Client for the Dropbox API, authenticated with a bearer access token.
pub struct DropboxClient {
    access_token: String,
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl DropboxClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DROPBOX_API_BASE)
    }

    /// Create a client against a non-default API base URL. Used by tests.
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            http: Client::new(),
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn rpc(&self, endpoint: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let response = send_with_retry(self.retry, || {
            self.http
                .post(format!("{}/{}", self.base_url, endpoint))
                .bearer_auth(&self.access_token)
                .json(&body)
        })
        .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_response(response).await);
        }

        Ok(response)
    }

    /// Turn a non-success response into an error, decoding the Dropbox
    /// `error_summary` when possible.
    async fn error_for_response(response: reqwest::Response) -> IndexError {
        let status = response.status().as_u16();
        let error_body = response.text().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_str::<DropboxErrorResponse>(&error_body) {
            // Dropbox reports missing paths as 409 path/not_found.
            if api_error.error_summary.contains("not_found") {
                return IndexError::NotFound(api_error.error_summary);
            }
            return IndexError::from_status(status, api_error.error_summary);
        }
        IndexError::from_status(status, error_body)
    }

    /// The namespace root (`""`) has no metadata of its own.
    fn root_entry() -> ChildEntry {
        ChildEntry {
            id: String::new(),
            name: "Dropbox".to_string(),
            kind: EntryKind::Folder,
            link: None,
            size: None,
            owner: None,
            created: None,
            modified: None,
            mime_type: None,
        }
    }
}

#[async_trait]
impl StorageBackend for DropboxClient {
    async fn metadata(&self, id: &str) -> Result<ChildEntry> {
        if id.is_empty() {
            return Ok(Self::root_entry());
        }

        let response = self
            .rpc("files/get_metadata", json!({ "path": id }))
            .await?;
        let entry: DropboxEntry = response.json().await?;
        Ok(entry.into())
    }

    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChildPage> {
        let response = match page_token {
            Some(cursor) => {
                self.rpc("files/list_folder/continue", json!({ "cursor": cursor }))
                    .await?
            }
            None => {
                self.rpc(
                    "files/list_folder",
                    json!({
                        "path": folder_id,
                        "recursive": false,
                        "limit": PAGE_LIMIT,
                    }),
                )
                .await?
            }
        };

        let list: ListFolderResponse = response.json().await?;
        debug!(folder_id, count = list.entries.len(), "listed one page");

        let next_page_token = list.has_more.then_some(list.cursor);
        Ok(ChildPage {
            entries: list.entries.into_iter().map(Into::into).collect(),
            next_page_token,
        })
    }

    /// Reuse an existing shared link when one exists, otherwise create one.
    async fn share_link(&self, id: &str) -> Result<String> {
        // The sharing endpoints reject the namespace root.
        if id.is_empty() {
            return Ok("https://www.dropbox.com/home".to_string());
        }

        let response = self
            .rpc(
                "sharing/list_shared_links",
                json!({ "path": id, "direct_only": true }),
            )
            .await?;
        let existing: SharedLinkList = response.json().await?;
        if let Some(link) = existing.links.into_iter().next() {
            return Ok(link.url);
        }

        let response = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                json!({ "path": id }),
            )
            .await?;
        let link: SharedLink = response.json().await?;
        Ok(link.url)
    }
}
