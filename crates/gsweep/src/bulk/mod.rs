//! Bulk Operation Orchestrator
//!
//! Runs a destructive or multi-step operation over a remote item set:
//!
//! 1. pass the bulk limiter (3 runs per minute)
//! 2. fetch the candidate set with one paced listing call, stopping one item
//!    past [`MAX_BULK_ITEMS`]
//! 3. reject the whole run if it is empty or larger than [`MAX_BULK_ITEMS`]
//! 4. process items, counting per-item failures instead of raising them
//!
//! Only step 1-3 failures are returned as errors. Once processing starts a
//! run always ends with a [`BulkResult`].
//!
//! Per-item failures are logged by kind and status only. The full error goes
//! to the `gsweep::dev` target, which hosts enable in development mode.

pub mod cleanup;
pub mod organize;
pub mod spam;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::common::{ApiError, ApiResult};
use crate::rate_limit::{Limiters, RateLimiter};

pub use cleanup::{cleanup_query, delete_older_than};
pub use organize::{classify, organize_by_type, Category};
pub use spam::purge_spam;

/// Largest candidate set a single run may touch
pub const MAX_BULK_ITEMS: usize = 1000;
/// Items moved concurrently per organize batch
pub const ORGANIZE_BATCH_SIZE: usize = 10;

const BULK_KEY: &str = "bulk";

/// Listings stop here, so an oversized set is rejected without paging
/// through all of it
pub(crate) const CANDIDATE_FETCH_LIMIT: usize = MAX_BULK_ITEMS + 1;

/// Outcome of a run that got past the pre-checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkResult {
    /// Items the run set out to process
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Candidates left alone (unclassified files, or not reached before cancel)
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Debug, Error)]
pub enum BulkError {
    #[error("This operation would affect at least {count} items, which exceeds the limit of {limit}. Please narrow your selection.")]
    TooManyItems { count: usize, limit: usize },

    #[error("No items found to process.")]
    NothingToDo,

    #[error("Too many bulk operations. Please wait a minute before starting another.")]
    RateLimited(#[source] ApiError),

    #[error("Could not load the items to process: {0}")]
    Fetch(#[source] ApiError),
}

impl From<BulkError> for ApiError {
    fn from(err: BulkError) -> Self {
        match err {
            BulkError::RateLimited(e) | BulkError::Fetch(e) => e,
            other => ApiError::validation(other.to_string()),
        }
    }
}

/// Pass the per-minute bulk admission check
pub(crate) fn admit_run(limiters: &Limiters) -> Result<(), BulkError> {
    limiters.bulk.check(BULK_KEY).map_err(BulkError::RateLimited)
}

/// Pre-check on the candidate count
pub fn check_size(count: usize) -> Result<(), BulkError> {
    if count > MAX_BULK_ITEMS {
        warn!(count, limit = MAX_BULK_ITEMS, "Bulk run rejected: too many items");
        return Err(BulkError::TooManyItems {
            count,
            limit: MAX_BULK_ITEMS,
        });
    }
    if count == 0 {
        return Err(BulkError::NothingToDo);
    }
    Ok(())
}

pub(crate) fn log_item_failure(item: &str, err: &ApiError) {
    warn!(item, kind = %err.kind, status = ?err.status, "Bulk item failed");
    debug!(target: "gsweep::dev", item, error = %err, "Bulk item failure detail");
}

pub(crate) fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
}

/// Process `ids` one at a time in listing order, waiting on `limiter` for
/// each item. Failures are logged and counted.
pub(crate) async fn run_sequential<F, Fut>(
    ids: Vec<String>,
    limiter: &RateLimiter,
    key: &str,
    cancel: Option<&AtomicBool>,
    mut op: F,
) -> BulkResult
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ApiResult<()>>,
{
    let mut result = BulkResult {
        total: ids.len(),
        ..Default::default()
    };

    for (done, id) in ids.into_iter().enumerate() {
        if is_cancelled(cancel) {
            result.cancelled = true;
            result.skipped = result.total - done;
            info!(processed = done, "Bulk run cancelled");
            break;
        }

        limiter.acquire(key).await;
        match op(id.clone()).await {
            Ok(()) => result.succeeded += 1,
            Err(e) => {
                log_item_failure(&id, &e);
                result.failed += 1;
            }
        }
    }

    debug!(
        succeeded = result.succeeded,
        failed = result.failed,
        "Sequential bulk run finished"
    );
    result
}
