//! Google Drive API v3 Client

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{GoogleClient, Pagination};
use super::service::{DriveFile, DriveService, ShareRole, FOLDER_MIME_TYPE};
use crate::common::ApiResult;
use crate::sanitize::sanitize_drive_query_text;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const FILE_FIELDS: &str = "id, name, mimeType, modifiedTime, parents, webViewLink";

const FILES_PAGINATION: Pagination = Pagination {
    items_field: "files",
    size_param: "pageSize",
    max_page_size: 1000,
};

pub struct DriveApi {
    client: GoogleClient,
}

super::google_api_wrapper!(DriveApi);

fn file_from_value(value: Value) -> ApiResult<DriveFile> {
    Ok(serde_json::from_value(value)?)
}

/// Drive query selecting a folder by exact name under `parent`
fn folder_query(name: &str, parent: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and '{}' in parents and trashed = false",
        sanitize_drive_query_text(name),
        FOLDER_MIME_TYPE,
        sanitize_drive_query_text(parent),
    )
}

#[async_trait]
impl DriveService for DriveApi {
    async fn list_files(&self, query: &str, limit: Option<usize>) -> ApiResult<Vec<DriveFile>> {
        info!("Listing Drive files");

        let params = vec![
            ("q", query.to_string()),
            ("fields", format!("nextPageToken, files({})", FILE_FIELDS)),
            ("spaces", "drive".to_string()),
        ];
        let url = format!("{}/files", DRIVE_API_BASE);
        let files = self
            .client
            .get_paginated(&url, &params, FILES_PAGINATION, limit)
            .await?
            .into_iter()
            .map(file_from_value)
            .collect::<ApiResult<Vec<_>>>()?;

        debug!("Retrieved {} files", files.len());
        Ok(files)
    }

    async fn find_folder(&self, name: &str, parent: &str) -> ApiResult<Option<DriveFile>> {
        let folders = self.list_files(&folder_query(name, parent), Some(1)).await?;
        Ok(folders.into_iter().next())
    }

    async fn create_folder(&self, name: &str, parent: &str) -> ApiResult<DriveFile> {
        info!("Creating Drive folder: {}", name);

        let body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent],
        });
        let url = format!("{}/files", DRIVE_API_BASE);
        let created = self
            .client
            .post(&url, &[("fields", FILE_FIELDS.to_string())], &body)
            .await?;
        file_from_value(created)
    }

    async fn move_file(&self, file_id: &str, new_parent: &str, old_parents: &[String]) -> ApiResult<()> {
        debug!("Moving file {} to {}", file_id, new_parent);

        let mut params = vec![("addParents", new_parent.to_string())];
        if !old_parents.is_empty() {
            params.push(("removeParents", old_parents.join(",")));
        }
        let url = format!("{}/files/{}", DRIVE_API_BASE, file_id);
        self.client.patch(&url, &params, &json!({})).await?;
        Ok(())
    }

    async fn trash_file(&self, file_id: &str) -> ApiResult<()> {
        debug!("Trashing file: {}", file_id);

        let url = format!("{}/files/{}", DRIVE_API_BASE, file_id);
        self.client
            .patch(&url, &[], &json!({ "trashed": true }))
            .await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        debug!("Deleting file: {}", file_id);

        let url = format!("{}/files/{}", DRIVE_API_BASE, file_id);
        self.client.delete(&url).await?;
        Ok(())
    }

    async fn share_file(&self, file_id: &str, email: &str, role: ShareRole) -> ApiResult<()> {
        info!("Sharing file {} as {}", file_id, role);

        let body = json!({
            "type": "user",
            "role": role.as_str(),
            "emailAddress": email,
        });
        let url = format!("{}/files/{}/permissions", DRIVE_API_BASE, file_id);
        self.client
            .post(&url, &[("sendNotificationEmail", "true".to_string())], &body)
            .await?;
        Ok(())
    }
}
