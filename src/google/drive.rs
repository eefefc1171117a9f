//! Google Drive API client
//!
//! Folder listing and free-form file search via `files.list`.

use crate::config::google::FOLDER_MIME_TYPE;
use crate::error::Result;
use crate::google::services::ServiceClient;
use crate::google::types::FileList;

/// Maximum number of folders returned by a folder listing
pub const FOLDER_PAGE_SIZE: u32 = 100;

/// Drive v3 client
pub struct DriveService {
    client: ServiceClient,
}

impl DriveService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    /// Run `files.list` with a search predicate and field mask
    pub async fn list_files(&self, q: &str, fields: &str, page_size: Option<u32>) -> Result<FileList> {
        let mut query = vec![("q", q.to_string()), ("fields", fields.to_string())];
        if let Some(size) = page_size {
            query.push(("pageSize", size.to_string()));
        }

        self.client.get_json("files.list", "files", &query).await
    }

    /// Immediate, non-trashed child folders of `parent_id`
    pub async fn list_folders(&self, parent_id: &str) -> Result<FileList> {
        self.list_files(
            &folder_query(parent_id),
            "files(id, name, webViewLink)",
            Some(FOLDER_PAGE_SIZE),
        )
        .await
    }

    /// Search with a caller-supplied Drive query, passed through verbatim
    pub async fn search(&self, query: &str) -> Result<FileList> {
        self.list_files(query, "files(id, name, mimeType)", None).await
    }
}

/// Drive query selecting the folders directly under `parent_id`
pub fn folder_query(parent_id: &str) -> String {
    format!(
        "'{}' in parents and mimeType='{}' and trashed=false",
        parent_id, FOLDER_MIME_TYPE
    )
}
