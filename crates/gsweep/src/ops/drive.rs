use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::info;

use super::{check_selection, checked_email};
use crate::bulk::{self, run_sequential, BulkResult};
use crate::common::{ApiError, ApiResult};
use crate::google::{DriveFile, DriveService, ShareRole};
use crate::rate_limit::Limiters;
use crate::sanitize::{
    clamp_numeric_input, sanitize_drive_query_text, sanitize_file_name, sanitize_resource_id,
};
use crate::translate::{Translator, UserFacingError};

/// Results returned by one search
pub const SEARCH_LIMIT: usize = 100;
/// Used when the day count typed by the user is not a number
pub const DEFAULT_CLEANUP_DAYS: i64 = 365;

/// Drive query for a user search; blank input lists everything not trashed.
pub fn search_query(raw: &str) -> String {
    let text = sanitize_drive_query_text(raw);
    if text.is_empty() {
        "trashed = false".to_string()
    } else {
        format!("name contains '{}' and trashed = false", text)
    }
}

fn checked_file_id(id: &str) -> ApiResult<String> {
    sanitize_resource_id(id).ok_or_else(|| ApiError::validation("Invalid file id."))
}

pub struct DriveOps {
    drive: Arc<dyn DriveService>,
    limiters: Arc<Limiters>,
    translator: Translator,
}

impl DriveOps {
    pub fn new(drive: Arc<dyn DriveService>, limiters: Arc<Limiters>, translator: Translator) -> Self {
        Self {
            drive,
            limiters,
            translator,
        }
    }

    pub async fn search_files(&self, raw: &str) -> Result<Vec<DriveFile>, UserFacingError> {
        self.try_search_files(raw)
            .await
            .map_err(|e| self.translator.user_error(e, "Search"))
    }

    async fn try_search_files(&self, raw: &str) -> ApiResult<Vec<DriveFile>> {
        self.limiters.drive.check("search")?;
        self.drive
            .list_files(&search_query(raw), Some(SEARCH_LIMIT))
            .await
    }

    /// Grant `email` access to a file. Mistyped domains are refused with a
    /// suggestion before anything is sent.
    pub async fn share_file(
        &self,
        file_id: &str,
        email: &str,
        role: ShareRole,
    ) -> Result<(), UserFacingError> {
        self.try_share_file(file_id, email, role)
            .await
            .map_err(|e| self.translator.user_error(e, "Share"))
    }

    async fn try_share_file(&self, file_id: &str, email: &str, role: ShareRole) -> ApiResult<()> {
        let email = checked_email(email)?;
        let file_id = checked_file_id(file_id)?;
        self.limiters.drive.check("share")?;

        info!(role = %role, "Sharing file");
        self.drive.share_file(&file_id, &email, role).await
    }

    /// Trash (or with `permanent`, delete) the selected files one at a time.
    pub async fn delete_files(
        &self,
        ids: &[String],
        permanent: bool,
    ) -> Result<BulkResult, UserFacingError> {
        self.try_delete_files(ids, permanent)
            .await
            .map_err(|e| self.translator.user_error(e, "Delete files"))
    }

    async fn try_delete_files(&self, ids: &[String], permanent: bool) -> ApiResult<BulkResult> {
        check_selection(ids.len())?;
        let ids = ids
            .iter()
            .map(|id| checked_file_id(id))
            .collect::<ApiResult<Vec<_>>>()?;

        let drive = self.drive.as_ref();
        let result = run_sequential(ids, &self.limiters.drive, "delete", None, |id| async move {
            if permanent {
                drive.delete_file(&id).await
            } else {
                drive.trash_file(&id).await
            }
        })
        .await;
        Ok(result)
    }

    /// Create a folder in My Drive
    pub async fn create_folder(&self, name: &str) -> Result<DriveFile, UserFacingError> {
        self.try_create_folder(name)
            .await
            .map_err(|e| self.translator.user_error(e, "Create folder"))
    }

    async fn try_create_folder(&self, name: &str) -> ApiResult<DriveFile> {
        let name = sanitize_file_name(name);
        self.limiters.drive.check("create_folder")?;
        self.drive.create_folder(&name, "root").await
    }

    pub async fn organize_by_type(
        &self,
        cancel: Option<&AtomicBool>,
    ) -> Result<BulkResult, UserFacingError> {
        bulk::organize_by_type(self.drive.as_ref(), &self.limiters, cancel)
            .await
            .map_err(|e| self.translator.user_error(e.into(), "Organize"))
    }

    /// `days` is raw user input; it is clamped to 1..=3650.
    pub async fn delete_older_than(
        &self,
        days: &str,
        cancel: Option<&AtomicBool>,
    ) -> Result<BulkResult, UserFacingError> {
        let days = clamp_numeric_input(
            days,
            bulk::cleanup::MIN_DAYS,
            bulk::cleanup::MAX_DAYS,
            DEFAULT_CLEANUP_DAYS,
        );
        bulk::delete_older_than(self.drive.as_ref(), &self.limiters, days, cancel)
            .await
            .map_err(|e| self.translator.user_error(e.into(), "Cleanup"))
    }
}
