//! Google Drive backend.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::auth::Authenticator;
use crate::backend::{send_with_retry, ChildEntry, ChildPage, RetryPolicy, StorageBackend};
use crate::error::{IndexError, Result};
use crate::models::{ApiErrorResponse, DriveFile, DriveFileList};

/// Base URL for Google Drive API v3.
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive assigns to folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Fields requested from files.list.
const LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, size, owners, webViewLink, createdTime, modifiedTime)";

/// Fields requested from files.get.
const FILE_FIELDS: &str =
    "id, name, mimeType, size, owners, webViewLink, createdTime, modifiedTime";

/// Client for the Google Drive API.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl DriveClient {
    pub fn new(auth: Authenticator) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Create a client against a non-default API base URL. Used by tests.
    pub fn with_base_url(auth: Authenticator, base_url: impl Into<String>) -> Self {
        Self {
            auth,
            http: Client::new(),
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Turn a non-success response into an error, decoding the Google error
    /// body when possible.
    async fn error_for_response(response: reqwest::Response) -> IndexError {
        let status = response.status().as_u16();
        let error_body = response.text().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return IndexError::from_status(api_error.error.code, api_error.error.message);
        }
        IndexError::from_status(status, error_body)
    }

    async fn get_file(&self, file_id: &str) -> Result<DriveFile> {
        let token = self.auth.get_access_token().await?;

        let response = send_with_retry(self.retry, || {
            self.http
                .get(format!("{}/files/{}", self.base_url, file_id))
                .bearer_auth(&token)
                .query(&[("supportsAllDrives", "true"), ("fields", FILE_FIELDS)])
        })
        .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_response(response).await);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl StorageBackend for DriveClient {
    async fn metadata(&self, id: &str) -> Result<ChildEntry> {
        Ok(self.get_file(id).await?.into())
    }

    async fn list_children(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<ChildPage> {
        let token = self.auth.get_access_token().await?;
        let query = format!("'{}' in parents and trashed = false", folder_id);

        let response = send_with_retry(self.retry, || {
            let mut request = self
                .http
                .get(format!("{}/files", self.base_url))
                .bearer_auth(&token)
                .query(&[
                    ("q", query.as_str()),
                    ("pageSize", "1000"),
                    ("fields", LIST_FIELDS),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ]);

            if let Some(page_token) = page_token {
                request = request.query(&[("pageToken", page_token)]);
            }

            request
        })
        .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_response(response).await);
        }

        let list: DriveFileList = response.json().await?;
        debug!(folder_id, count = list.files.len(), "listed one page");

        Ok(ChildPage {
            entries: list.files.into_iter().map(Into::into).collect(),
            next_page_token: list.next_page_token,
        })
    }

    /// Drive issues a `webViewLink` for every file and folder; obtaining a
    /// sharable link is just reading it back.
    async fn share_link(&self, id: &str) -> Result<String> {
        let file = self.get_file(id).await?;
        file.web_view_link
            .ok_or_else(|| IndexError::LinkUnavailable(id.to_string()))
    }
}
