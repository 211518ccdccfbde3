//! Remote service seams
//!
//! The bulk orchestrator and the governed operations talk to Drive and Gmail
//! only through these traits. [`DriveApi`](super::DriveApi) and
//! [`GmailApi`](super::GmailApi) are the real implementations; tests plug in
//! in-memory fakes.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::ApiResult;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailLabel {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub label_type: Option<String>,
}

/// Permission granted when sharing a Drive file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    Reader,
    Commenter,
    Writer,
}

impl ShareRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareRole::Reader => "reader",
            ShareRole::Commenter => "commenter",
            ShareRole::Writer => "writer",
        }
    }
}

impl fmt::Display for ShareRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" | "viewer" => Ok(ShareRole::Reader),
            "commenter" => Ok(ShareRole::Commenter),
            "writer" | "editor" => Ok(ShareRole::Writer),
            other => Err(format!("unknown share role: {}", other)),
        }
    }
}

#[async_trait]
pub trait DriveService: Send + Sync {
    /// Files matching a Drive query expression, in listing order.
    /// `limit: None` pages through everything.
    async fn list_files(&self, query: &str, limit: Option<usize>) -> ApiResult<Vec<DriveFile>>;

    /// A non-trashed folder called `name` directly under `parent`
    async fn find_folder(&self, name: &str, parent: &str) -> ApiResult<Option<DriveFile>>;

    async fn create_folder(&self, name: &str, parent: &str) -> ApiResult<DriveFile>;

    /// Re-parent `file_id` under `new_parent`, detaching `old_parents`
    async fn move_file(&self, file_id: &str, new_parent: &str, old_parents: &[String]) -> ApiResult<()>;

    async fn trash_file(&self, file_id: &str) -> ApiResult<()>;

    /// Permanent delete, bypassing the trash
    async fn delete_file(&self, file_id: &str) -> ApiResult<()>;

    async fn share_file(&self, file_id: &str, email: &str, role: ShareRole) -> ApiResult<()>;
}

#[async_trait]
pub trait GmailService: Send + Sync {
    async fn list_messages(
        &self,
        query: Option<&str>,
        label_ids: &[String],
        limit: Option<usize>,
    ) -> ApiResult<Vec<MailMessage>>;

    /// Permanent delete
    async fn delete_message(&self, id: &str) -> ApiResult<()>;

    async fn trash_message(&self, id: &str) -> ApiResult<()>;

    async fn list_labels(&self) -> ApiResult<Vec<MailLabel>>;

    async fn create_label(&self, name: &str) -> ApiResult<MailLabel>;

    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> ApiResult<()>;
}
