//! drive_index - Snapshot indexing of cloud-storage folder trees.
//!
//! This library provides functionality to:
//! - Recursively enumerate the files and folders under a Google Drive or
//!   Dropbox folder
//! - Collect a sharable link for every entry
//! - Serialize the resulting index to a CSV or JSON file
//!
//! # Example
//!
//! ```no_run
//! use drive_index::{Authenticator, DriveClient, Indexer, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_file("credentials.json")?;
//!     let indexer = Indexer::new(Box::new(DriveClient::new(auth)));
//!
//!     let index = indexer.build("folder-id", None).await?;
//!     drive_index::write_index(&index, "folder_index.csv".as_ref(), OutputFormat::Csv)?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod drive;
pub mod dropbox;
pub mod error;
pub mod indexer;
pub mod models;
pub mod output;
pub mod url_parser;

// Re-exports for convenience
pub use auth::Authenticator;
pub use backend::{ChildEntry, ChildPage, RetryPolicy, StorageBackend};
pub use drive::DriveClient;
pub use dropbox::DropboxClient;
pub use error::{IndexError, Result};
pub use indexer::Indexer;
pub use models::{Entry, EntryKind, Index};
pub use output::{default_output_path, write_index, OutputFormat};
pub use url_parser::extract_id;
