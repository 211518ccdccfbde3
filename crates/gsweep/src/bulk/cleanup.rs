//! Delete-older-than: move files not modified in N days to the trash.

use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::info;

use super::{admit_run, check_size, run_sequential, BulkError, BulkResult, CANDIDATE_FETCH_LIMIT};
use crate::google::{DriveService, FOLDER_MIME_TYPE};
use crate::rate_limit::Limiters;

pub const MIN_DAYS: i64 = 1;
pub const MAX_DAYS: i64 = 3650;

/// Drive query for files owned by the user and last modified before
/// `now - days` (clamped to 1..=3650). Folders are excluded: trashing one
/// would take newer files inside it along.
pub fn cleanup_query(days: i64, now: DateTime<Utc>) -> String {
    let days = days.clamp(MIN_DAYS, MAX_DAYS);
    let cutoff = now - Duration::days(days);
    format!(
        "modifiedTime < '{}' and 'me' in owners and mimeType != '{}' and trashed = false",
        cutoff.to_rfc3339_opts(SecondsFormat::Secs, true),
        FOLDER_MIME_TYPE
    )
}

pub async fn delete_older_than(
    drive: &dyn DriveService,
    limiters: &Limiters,
    days: i64,
    cancel: Option<&AtomicBool>,
) -> Result<BulkResult, BulkError> {
    admit_run(limiters)?;
    info!(days, "Starting delete-older-than run");

    let query = cleanup_query(days, Utc::now());
    limiters.drive.acquire("list").await;
    let files = drive
        .list_files(&query, Some(CANDIDATE_FETCH_LIMIT))
        .await
        .map_err(BulkError::Fetch)?;
    check_size(files.len())?;

    let ids = files.into_iter().map(|f| f.id).collect();
    let result = run_sequential(ids, &limiters.drive, "delete", cancel, |id| async move {
        drive.trash_file(&id).await
    })
    .await;

    info!(
        succeeded = result.succeeded,
        failed = result.failed,
        total = result.total,
        "Delete-older-than run finished"
    );
    Ok(result)
}
