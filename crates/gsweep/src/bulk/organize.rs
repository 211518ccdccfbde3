//! Auto-organize: sort loose files in My Drive into per-type folders.
//!
//! Files are classified by MIME type into four fixed categories. Batches of
//! [`ORGANIZE_BATCH_SIZE`] are moved concurrently; batches run in order. The
//! destination folder for a category is looked up (or created) the first time
//! any item in the run needs it, and reused after that.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    admit_run, check_size, is_cancelled, log_item_failure, BulkError, BulkResult,
    CANDIDATE_FETCH_LIMIT, ORGANIZE_BATCH_SIZE,
};
use crate::common::ApiResult;
use crate::google::{DriveFile, DriveService, FOLDER_MIME_TYPE};
use crate::rate_limit::Limiters;

const ROOT: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Documents,
    Spreadsheets,
    Images,
    Videos,
}

impl Category {
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Spreadsheets => "Spreadsheets",
            Category::Images => "Images",
            Category::Videos => "Videos",
        }
    }
}

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.google-apps.document",
    "application/rtf",
    "text/plain",
];

const SPREADSHEET_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.google-apps.spreadsheet",
    "text/csv",
];

const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
    "image/heic",
];

const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
    "video/x-matroska",
    "video/mpeg",
];

pub fn classify(mime_type: &str) -> Option<Category> {
    let mime = mime_type.trim().to_ascii_lowercase();
    let mime = mime.as_str();
    if DOCUMENT_TYPES.contains(&mime) {
        Some(Category::Documents)
    } else if SPREADSHEET_TYPES.contains(&mime) {
        Some(Category::Spreadsheets)
    } else if IMAGE_TYPES.contains(&mime) {
        Some(Category::Images)
    } else if VIDEO_TYPES.contains(&mime) {
        Some(Category::Videos)
    } else {
        None
    }
}

fn root_files_query() -> String {
    format!(
        "'{}' in parents and mimeType != '{}' and trashed = false",
        ROOT, FOLDER_MIME_TYPE
    )
}

/// Folder ids resolved so far in this run
type FolderCache = Mutex<HashMap<Category, String>>;

/// Find or create the folder for `category`. The cache lock is held across
/// the remote calls so concurrent items never create the same folder twice.
async fn folder_for(
    drive: &dyn DriveService,
    folders: &FolderCache,
    category: Category,
) -> ApiResult<String> {
    let mut cache = folders.lock().await;
    if let Some(id) = cache.get(&category) {
        return Ok(id.clone());
    }

    let name = category.folder_name();
    let folder = match drive.find_folder(name, ROOT).await? {
        Some(existing) => existing,
        None => {
            info!(folder = name, "Creating category folder");
            drive.create_folder(name, ROOT).await?
        }
    };
    cache.insert(category, folder.id.clone());
    Ok(folder.id)
}

async fn organize_one(
    drive: &dyn DriveService,
    limiters: &Limiters,
    folders: &FolderCache,
    file: &DriveFile,
    category: Category,
) -> ApiResult<()> {
    let folder_id = folder_for(drive, folders, category).await?;
    limiters.drive.acquire("move").await;
    drive.move_file(&file.id, &folder_id, &file.parents).await
}

pub async fn organize_by_type(
    drive: &dyn DriveService,
    limiters: &Limiters,
    cancel: Option<&AtomicBool>,
) -> Result<BulkResult, BulkError> {
    admit_run(limiters)?;
    info!("Starting organize-by-type run");

    limiters.drive.acquire("list").await;
    let files = drive
        .list_files(&root_files_query(), Some(CANDIDATE_FETCH_LIMIT))
        .await
        .map_err(BulkError::Fetch)?;
    check_size(files.len())?;

    let candidates = files.len();
    let matched: Vec<(DriveFile, Category)> = files
        .into_iter()
        .filter_map(|f| classify(&f.mime_type).map(|c| (f, c)))
        .collect();

    let mut result = BulkResult {
        total: matched.len(),
        skipped: candidates - matched.len(),
        ..Default::default()
    };
    debug!(matched = result.total, unmatched = result.skipped, "Classified files");

    let folders = FolderCache::default();
    for (index, batch) in matched.chunks(ORGANIZE_BATCH_SIZE).enumerate() {
        if is_cancelled(cancel) {
            result.cancelled = true;
            result.skipped += matched.len() - index * ORGANIZE_BATCH_SIZE;
            info!(batch = index, "Organize run cancelled");
            break;
        }

        let outcomes = join_all(
            batch
                .iter()
                .map(|(file, category)| organize_one(drive, limiters, &folders, file, *category)),
        )
        .await;

        for ((file, _), outcome) in batch.iter().zip(outcomes) {
            match outcome {
                Ok(()) => result.succeeded += 1,
                Err(e) => {
                    log_item_failure(&file.id, &e);
                    result.failed += 1;
                }
            }
        }
    }

    info!(
        succeeded = result.succeeded,
        failed = result.failed,
        skipped = result.skipped,
        "Organize run finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::fake::{file, FakeDrive};
    use std::sync::Arc;

    #[test]
    fn classifies_known_types() {
        assert_eq!(classify("application/pdf"), Some(Category::Documents));
        assert_eq!(classify("text/csv"), Some(Category::Spreadsheets));
        assert_eq!(classify("IMAGE/PNG"), Some(Category::Images));
        assert_eq!(classify("video/mp4"), Some(Category::Videos));
        assert_eq!(classify("application/zip"), None);
        assert_eq!(classify(FOLDER_MIME_TYPE), None);
    }

    fn mixed_files() -> Vec<DriveFile> {
        vec![
            file("d1", "application/pdf"),
            file("d2", "application/vnd.google-apps.document"),
            file("z1", "application/zip"),
            file("s1", "text/csv"),
            file("i1", "image/jpeg"),
            file("d3", "text/plain"),
            file("i2", "image/png"),
            file("v1", "video/mp4"),
            file("z2", "application/octet-stream"),
            file("s2", "application/vnd.ms-excel"),
            file("i3", "image/gif"),
            file("i4", "image/webp"),
        ]
    }

    #[tokio::test]
    async fn creates_each_folder_once_and_moves_matched_files() {
        let drive = FakeDrive::with_files(mixed_files());
        let limiters = Limiters::new();

        let result = organize_by_type(&drive, &limiters, None).await.unwrap();

        assert_eq!(result.total, 10);
        assert_eq!(result.succeeded, 10);
        assert_eq!(result.failed, 0);
        assert_eq!(result.skipped, 2);

        for name in ["Documents", "Spreadsheets", "Images", "Videos"] {
            assert_eq!(drive.calls_starting_with(&format!("create_folder:{}", name)), 1);
        }
        assert_eq!(drive.calls_starting_with("move:"), 10);
        assert_eq!(drive.calls_starting_with("move:z"), 0);
    }

    #[tokio::test]
    async fn query_targets_loose_root_files() {
        let drive = FakeDrive::with_files(vec![file("d1", "application/pdf")]);
        organize_by_type(&drive, &Limiters::new(), None).await.unwrap();

        let queries = drive.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].starts_with("'root' in parents"));
        assert!(queries[0].contains("trashed = false"));
    }

    #[tokio::test]
    async fn failed_move_is_counted() {
        let drive = FakeDrive::with_files(mixed_files()).failing_on("i2");

        let result = organize_by_type(&drive, &Limiters::new(), None).await.unwrap();

        assert_eq!(result.succeeded, 9);
        assert_eq!(result.failed, 1);
    }

    #[tokio::test]
    async fn cancelled_before_first_batch_moves_nothing() {
        let drive = FakeDrive::with_files(mixed_files());
        let cancel = Arc::new(AtomicBool::new(true));

        let result = organize_by_type(&drive, &Limiters::new(), Some(&*cancel))
            .await
            .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.succeeded, 0);
        assert_eq!(result.skipped, 12);
        assert_eq!(drive.calls_starting_with("move:"), 0);
    }

    #[tokio::test]
    async fn only_unclassified_files_is_an_empty_run() {
        let drive = FakeDrive::with_files(vec![file("z1", "application/zip")]);

        let result = organize_by_type(&drive, &Limiters::new(), None).await.unwrap();

        assert_eq!(result.total, 0);
        assert_eq!(result.skipped, 1);
        assert!(drive.calls().is_empty());
    }
}
