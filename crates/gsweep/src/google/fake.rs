//! In-memory Drive and Gmail used by tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::service::{
    DriveFile, DriveService, GmailService, MailLabel, MailMessage, ShareRole, FOLDER_MIME_TYPE,
};
use crate::common::{ApiError, ApiResult};

pub fn file(id: &str, mime_type: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: format!("{}.bin", id),
        mime_type: mime_type.to_string(),
        modified_time: None,
        parents: vec!["root".to_string()],
        web_view_link: None,
    }
}

#[derive(Default)]
pub struct FakeDrive {
    pub files: Vec<DriveFile>,
    /// Ids whose mutations fail with a 500
    pub failing: HashSet<String>,
    pub list_error: Option<ApiError>,
    pub calls: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<String>>,
    folders: Mutex<Vec<DriveFile>>,
    next_id: AtomicUsize,
}

impl FakeDrive {
    pub fn with_files(files: Vec<DriveFile>) -> Self {
        Self {
            files,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn failing_listing(mut self, err: ApiError) -> Self {
        self.list_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, call: String, id: &str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(id) {
            Err(ApiError::http(500, format!("backend error for {}", id)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DriveService for FakeDrive {
    async fn list_files(&self, query: &str, limit: Option<usize>) -> ApiResult<Vec<DriveFile>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        let mut files = self.files.clone();
        files.truncate(limit.unwrap_or(usize::MAX));
        Ok(files)
    }

    async fn find_folder(&self, name: &str, _parent: &str) -> ApiResult<Option<DriveFile>> {
        self.calls.lock().unwrap().push(format!("find_folder:{}", name));
        Ok(self
            .folders
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.name == name)
            .cloned())
    }

    async fn create_folder(&self, name: &str, parent: &str) -> ApiResult<DriveFile> {
        self.calls.lock().unwrap().push(format!("create_folder:{}", name));
        let folder = DriveFile {
            id: format!("folder{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            modified_time: None,
            parents: vec![parent.to_string()],
            web_view_link: None,
        };
        self.folders.lock().unwrap().push(folder.clone());
        Ok(folder)
    }

    async fn move_file(&self, file_id: &str, new_parent: &str, _old_parents: &[String]) -> ApiResult<()> {
        self.record(format!("move:{}->{}", file_id, new_parent), file_id)
    }

    async fn trash_file(&self, file_id: &str) -> ApiResult<()> {
        self.record(format!("trash:{}", file_id), file_id)
    }

    async fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        self.record(format!("delete:{}", file_id), file_id)
    }

    async fn share_file(&self, file_id: &str, email: &str, role: ShareRole) -> ApiResult<()> {
        self.record(format!("share:{}:{}:{}", file_id, email, role), file_id)
    }
}

pub fn message(id: &str) -> MailMessage {
    MailMessage {
        id: id.to_string(),
        thread_id: None,
        label_ids: Vec::new(),
    }
}

#[derive(Default)]
pub struct FakeGmail {
    pub messages: Vec<MailMessage>,
    pub failing: HashSet<String>,
    pub list_error: Option<ApiError>,
    pub calls: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<(Option<String>, Vec<String>)>>,
    labels: Mutex<Vec<MailLabel>>,
}

impl FakeGmail {
    pub fn with_messages(messages: Vec<MailMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.labels.lock().unwrap().push(MailLabel {
            id: id.to_string(),
            name: name.to_string(),
            label_type: Some("user".to_string()),
        });
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn failing_listing(mut self, err: ApiError) -> Self {
        self.list_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String, id: &str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(id) {
            Err(ApiError::http(500, format!("backend error for {}", id)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GmailService for FakeGmail {
    async fn list_messages(
        &self,
        query: Option<&str>,
        label_ids: &[String],
        limit: Option<usize>,
    ) -> ApiResult<Vec<MailMessage>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.map(String::from), label_ids.to_vec()));
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        let mut messages = self.messages.clone();
        messages.truncate(limit.unwrap_or(usize::MAX));
        Ok(messages)
    }

    async fn delete_message(&self, id: &str) -> ApiResult<()> {
        self.record(format!("delete:{}", id), id)
    }

    async fn trash_message(&self, id: &str) -> ApiResult<()> {
        self.record(format!("trash:{}", id), id)
    }

    async fn list_labels(&self) -> ApiResult<Vec<MailLabel>> {
        Ok(self.labels.lock().unwrap().clone())
    }

    async fn create_label(&self, name: &str) -> ApiResult<MailLabel> {
        self.calls.lock().unwrap().push(format!("create_label:{}", name));
        let mut labels = self.labels.lock().unwrap();
        let label = MailLabel {
            id: format!("Label_{}", labels.len() + 1),
            name: name.to_string(),
            label_type: Some("user".to_string()),
        };
        labels.push(label.clone());
        Ok(label)
    }

    async fn modify_labels(&self, id: &str, add: &[String], _remove: &[String]) -> ApiResult<()> {
        self.record(format!("modify:{}:+{}", id, add.join(",")), id)
    }
}
