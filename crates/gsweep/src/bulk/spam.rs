//! Spam purge: permanently delete everything under the SPAM label.

use std::sync::atomic::AtomicBool;

use tracing::info;

use super::{admit_run, check_size, run_sequential, BulkError, BulkResult, CANDIDATE_FETCH_LIMIT};
use crate::google::GmailService;
use crate::rate_limit::Limiters;

const SPAM_LABEL: &str = "SPAM";

pub async fn purge_spam(
    gmail: &dyn GmailService,
    limiters: &Limiters,
    cancel: Option<&AtomicBool>,
) -> Result<BulkResult, BulkError> {
    admit_run(limiters)?;
    info!("Starting spam purge");

    limiters.gmail.acquire("list").await;
    let messages = gmail
        .list_messages(None, &[SPAM_LABEL.to_string()], Some(CANDIDATE_FETCH_LIMIT))
        .await
        .map_err(BulkError::Fetch)?;
    check_size(messages.len())?;

    let ids = messages.into_iter().map(|m| m.id).collect();
    let result = run_sequential(ids, &limiters.gmail, "delete", cancel, |id| async move {
        gmail.delete_message(&id).await
    })
    .await;

    info!(
        succeeded = result.succeeded,
        failed = result.failed,
        total = result.total,
        "Spam purge finished"
    );
    Ok(result)
}
