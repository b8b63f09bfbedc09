//! drive_index CLI - Index a cloud-storage folder tree with sharable links.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use drive_index::{
    default_output_path, extract_id, write_index, Authenticator, DriveClient, DropboxClient,
    IndexError, Indexer, OutputFormat, StorageBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    Drive,
    Dropbox,
}

/// CLI tool that indexes a cloud-storage folder tree.
#[derive(Parser)]
#[command(name = "drive_index")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cloud-storage provider.
    #[arg(long, value_enum, default_value = "drive")]
    provider: Provider,

    /// Path to Google credentials JSON (service account key or
    /// authorized-user token cache).
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Dropbox access token.
    #[arg(long, env = "DROPBOX_ACCESS_TOKEN", hide_env_values = true)]
    dropbox_token: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a folder tree and write an index file.
    Index {
        /// Root folder URL or ID.
        #[arg(env = "ROOT_FOLDER_ID")]
        root: String,

        /// Display name for the root folder (defaults to the vendor-reported
        /// name); also the first component of every path in the index.
        #[arg(long, env = "ROOT_FOLDER_NAME")]
        name: Option<String>,

        /// Output file path.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// List the immediate children of a folder.
    List {
        /// Folder URL or ID.
        folder: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let backend = build_backend(&cli)?;
    let indexer = Indexer::new(backend);
    let provider = cli.provider;

    match cli.command {
        Commands::Index {
            root,
            name,
            output,
            format,
        } => {
            let root_id = resolve_id(provider, &root)?;

            println!("Processing folder tree. This may take a while for large trees...");

            let index = indexer
                .build(&root_id, name.as_deref())
                .await
                .with_context(|| format!("Failed to index folder: {}", root_id))?;

            let root_name = index
                .root()
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "index".to_string());
            let output_path = output.unwrap_or_else(|| default_output_path(&root_name, format));

            write_index(&index, &output_path, format)
                .with_context(|| format!("Failed to write index to {:?}", output_path))?;

            println!(
                "Process complete. Indexed {} entries under {} to {:?}.",
                index.len(),
                root_name,
                output_path
            );
        }

        Commands::List { folder } => {
            let folder_id = resolve_id(provider, &folder)?;

            let children = indexer
                .list_folder(&folder_id)
                .await
                .with_context(|| format!("Failed to list folder: {}", folder_id))?;

            if children.is_empty() {
                println!("No files found.");
            } else {
                println!("{:<44} {:>10} {:<30} {}", "ID", "SIZE", "TYPE", "NAME");
                println!("{}", "-".repeat(100));
                for child in children {
                    println!("{}", child);
                }
            }
        }
    }

    Ok(())
}

/// Construct the backend selected by `--provider`.
fn build_backend(cli: &Cli) -> Result<Box<dyn StorageBackend>> {
    match cli.provider {
        Provider::Drive => {
            let auth = match &cli.credentials {
                Some(path) => Authenticator::from_file(path)
                    .with_context(|| format!("Failed to load credentials from {:?}", path))?,
                None => {
                    let token = std::env::var("GOOGLE_ACCESS_TOKEN").map_err(|_| {
                        IndexError::MissingCredentials(
                            "pass --credentials or set GOOGLE_ACCESS_TOKEN".to_string(),
                        )
                    })?;
                    Authenticator::from_static_token(token)
                }
            };
            Ok(Box::new(DriveClient::new(auth)))
        }
        Provider::Dropbox => {
            let token = cli.dropbox_token.clone().ok_or_else(|| {
                IndexError::MissingCredentials(
                    "pass --dropbox-token or set DROPBOX_ACCESS_TOKEN".to_string(),
                )
            })?;
            Ok(Box::new(DropboxClient::new(token)))
        }
    }
}

/// Normalize the folder argument for the selected provider.
///
/// Drive accepts share URLs or raw ids; Dropbox takes paths or `id:` values
/// verbatim, with the empty string naming the account root.
fn resolve_id(provider: Provider, input: &str) -> Result<String> {
    match provider {
        Provider::Drive => Ok(extract_id(input)?),
        Provider::Dropbox => Ok(input.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_id_drive_url() {
        let id = resolve_id(
            Provider::Drive,
            "https://drive.google.com/drive/folders/1abc123",
        )
        .unwrap();
        assert_eq!(id, "1abc123");
    }

    #[test]
    fn test_resolve_id_drive_invalid() {
        assert!(resolve_id(Provider::Drive, "not a url or id").is_err());
    }

    #[test]
    fn test_resolve_id_dropbox_verbatim() {
        assert_eq!(
            resolve_id(Provider::Dropbox, "id:a4ayc_80_OEAAAAAAAAAXw").unwrap(),
            "id:a4ayc_80_OEAAAAAAAAAXw"
        );
        assert_eq!(resolve_id(Provider::Dropbox, "/team/reports").unwrap(), "/team/reports");
        assert_eq!(resolve_id(Provider::Dropbox, "").unwrap(), "");
    }
}
