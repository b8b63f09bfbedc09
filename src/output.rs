//! Index serialization to the on-disk artifact.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::models::{Entry, EntryKind, Index};

/// On-disk format of the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Default output location: `indexes/<root_name>_index.<ext>`.
pub fn default_output_path(root_name: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from("indexes").join(format!("{}_index.{}", root_name, format.extension()))
}

/// One CSV row per entry.
#[derive(Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    path: &'a str,
    id: &'a str,
    link: &'a str,
    /// MIME type when the vendor reports one, `file`/`folder` otherwise.
    #[serde(rename = "type")]
    kind: &'a str,
    is_folder: bool,
    size_kb: f64,
    owner: &'a str,
    created_date: String,
    last_modified_date: String,
}

impl<'a> From<&'a Entry> for CsvRow<'a> {
    fn from(entry: &'a Entry) -> Self {
        let date = |d: &Option<chrono::DateTime<chrono::Utc>>| {
            d.map(|d| d.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                .unwrap_or_default()
        };
        CsvRow {
            name: &entry.name,
            path: &entry.path,
            id: &entry.id,
            link: &entry.link,
            kind: entry.mime_type.as_deref().unwrap_or(entry.kind.as_str()),
            is_folder: entry.kind == EntryKind::Folder,
            size_kb: entry.size_kb(),
            owner: entry.owner.as_deref().unwrap_or(""),
            created_date: date(&entry.created),
            last_modified_date: date(&entry.modified),
        }
    }
}

/// Serialize a fully built index to `path`.
///
/// Parent directories are created as needed. Callers only reach this after
/// a successful build, so a failed run leaves no file behind.
pub fn write_index(index: &Index, path: &Path, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    match format {
        OutputFormat::Csv => write_csv(index, path),
        OutputFormat::Json => write_json(index, path),
    }
}

fn write_csv(index: &Index, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in index.entries() {
        writer.serialize(CsvRow::from(entry))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(index: &Index, path: &Path) -> Result<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), index.entries())?;
    Ok(())
}
