//! Directory indexer.
//!
//! Walks a folder tree through a [`StorageBackend`], building a fully
//! materialized [`Index`] with a sharable link on every entry. The walk is
//! sequential and depth-first; a parent entry is always pushed before its
//! children. The root folder itself is the first entry, with no parent.

use async_recursion::async_recursion;
use tracing::{debug, info};

use crate::backend::{ChildEntry, StorageBackend};
use crate::error::Result;
use crate::models::{Entry, EntryKind, Index};

/// Builds an index of one folder tree.
pub struct Indexer {
    backend: Box<dyn StorageBackend>,
}

impl Indexer {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Enumerate every descendant of `root_id` into an index.
    ///
    /// `root_name` overrides the vendor-reported name of the root folder,
    /// which also becomes the first component of every entry's path.
    ///
    /// Any API failure aborts the build; no partial index is returned.
    pub async fn build(&self, root_id: &str, root_name: Option<&str>) -> Result<Index> {
        let root = self.backend.metadata(root_id).await?;
        let name = root_name.unwrap_or(&root.name).to_string();
        let link = match root.link.clone() {
            Some(link) => link,
            None => self.backend.share_link(&root.id).await?,
        };

        let mut index = Index::new();
        index.push(Entry {
            id: root.id.clone(),
            name: name.clone(),
            path: name.clone(),
            kind: root.kind,
            parent: None,
            link,
            size: root.size,
            owner: root.owner,
            created: root.created,
            modified: root.modified,
            mime_type: root.mime_type,
        });

        self.walk(&root.id, &name, &mut index).await?;
        info!(entries = index.len(), "index built");
        Ok(index)
    }

    /// Collect all children of a folder, following page tokens until
    /// exhausted.
    pub async fn list_folder(&self, folder_id: &str) -> Result<Vec<ChildEntry>> {
        let mut children = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .backend
                .list_children(folder_id, page_token.as_deref())
                .await?;
            children.extend(page.entries);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(children)
    }

    #[async_recursion]
    async fn walk(&self, folder_id: &str, parent_path: &str, index: &mut Index) -> Result<()> {
        debug!(folder_id, "walking folder");
        let children = self.list_folder(folder_id).await?;

        for child in children {
            let path = format!("{}/{}", parent_path, child.name);
            let link = match child.link.clone() {
                Some(link) => link,
                None => self.backend.share_link(&child.id).await?,
            };

            let id = child.id.clone();
            let kind = child.kind;
            let pushed = index.push(Entry {
                id: child.id,
                name: child.name,
                path: path.clone(),
                kind,
                parent: Some(folder_id.to_string()),
                link,
                size: child.size,
                owner: child.owner,
                created: child.created,
                modified: child.modified,
                mime_type: child.mime_type,
            });

            // A repeated id (duplicated across pages, or a folder reachable
            // twice) is recorded once and never descended into again.
            if pushed && kind == EntryKind::Folder {
                self.walk(&id, &path, index).await?;
            }
        }

        Ok(())
    }
}
