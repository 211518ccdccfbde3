use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::info;

use super::check_selection;
use crate::bulk::{self, run_sequential, BulkResult};
use crate::common::{ApiError, ApiResult};
use crate::google::{GmailService, MailLabel, MailMessage};
use crate::rate_limit::Limiters;
use crate::sanitize::{sanitize_gmail_query_text, sanitize_opaque_id};
use crate::translate::{Translator, UserFacingError};

pub const SEARCH_LIMIT: usize = 100;
/// Gmail's own cap on label names
pub const MAX_LABEL_NAME_LEN: usize = 225;

fn checked_message_ids(ids: &[String]) -> ApiResult<Vec<String>> {
    check_selection(ids.len())?;
    ids.iter()
        .map(|id| sanitize_opaque_id(id).ok_or_else(|| ApiError::validation("Invalid message id.")))
        .collect()
}

fn checked_label_name(name: &str) -> ApiResult<String> {
    let name: String = name.trim().chars().filter(|c| !c.is_control()).collect();
    if name.is_empty() {
        return Err(ApiError::validation("Please enter a label name."));
    }
    if name.chars().count() > MAX_LABEL_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Label names can be at most {} characters.",
            MAX_LABEL_NAME_LEN
        )));
    }
    Ok(name)
}

pub struct GmailOps {
    gmail: Arc<dyn GmailService>,
    limiters: Arc<Limiters>,
    translator: Translator,
}

impl GmailOps {
    pub fn new(gmail: Arc<dyn GmailService>, limiters: Arc<Limiters>, translator: Translator) -> Self {
        Self {
            gmail,
            limiters,
            translator,
        }
    }

    pub async fn search_messages(&self, raw: &str) -> Result<Vec<MailMessage>, UserFacingError> {
        self.try_search_messages(raw)
            .await
            .map_err(|e| self.translator.user_error(e, "Search"))
    }

    /// Blank input lists the most recent messages. Input that sanitizes down
    /// to nothing is rejected rather than widened to an unfiltered listing.
    async fn try_search_messages(&self, raw: &str) -> ApiResult<Vec<MailMessage>> {
        let query = sanitize_gmail_query_text(raw);
        if query.is_empty() && !raw.trim().is_empty() {
            return Err(ApiError::validation("Please enter search terms using letters or numbers."));
        }
        self.limiters.gmail.check("search")?;
        let query = (!query.is_empty()).then_some(query);
        self.gmail
            .list_messages(query.as_deref(), &[], Some(SEARCH_LIMIT))
            .await
    }

    /// Apply `label_name` to the messages, creating the label if the mailbox
    /// does not have one by that name (case-insensitive).
    pub async fn label_messages(
        &self,
        ids: &[String],
        label_name: &str,
    ) -> Result<BulkResult, UserFacingError> {
        self.try_label_messages(ids, label_name)
            .await
            .map_err(|e| self.translator.user_error(e, "Label"))
    }

    async fn try_label_messages(&self, ids: &[String], label_name: &str) -> ApiResult<BulkResult> {
        let name = checked_label_name(label_name)?;
        let ids = checked_message_ids(ids)?;
        let label = self.find_or_create_label(&name).await?;

        let gmail = self.gmail.as_ref();
        let add = vec![label.id];
        let add = &add;
        Ok(
            run_sequential(ids, &self.limiters.gmail, "modify", None, |id| async move {
                gmail.modify_labels(&id, add, &[]).await
            })
            .await,
        )
    }

    async fn find_or_create_label(&self, name: &str) -> ApiResult<MailLabel> {
        self.limiters.gmail.check("labels")?;
        let existing = self
            .gmail
            .list_labels()
            .await?
            .into_iter()
            .find(|l| l.name.eq_ignore_ascii_case(name));
        if let Some(label) = existing {
            return Ok(label);
        }

        info!("Creating label");
        self.limiters.gmail.acquire("labels").await;
        self.gmail.create_label(name).await
    }

    /// Move messages to the trash one at a time
    pub async fn trash_messages(&self, ids: &[String]) -> Result<BulkResult, UserFacingError> {
        self.try_trash_messages(ids)
            .await
            .map_err(|e| self.translator.user_error(e, "Trash"))
    }

    async fn try_trash_messages(&self, ids: &[String]) -> ApiResult<BulkResult> {
        let ids = checked_message_ids(ids)?;
        let gmail = self.gmail.as_ref();
        Ok(
            run_sequential(ids, &self.limiters.gmail, "trash", None, |id| async move {
                gmail.trash_message(&id).await
            })
            .await,
        )
    }

    pub async fn purge_spam(&self, cancel: Option<&AtomicBool>) -> Result<BulkResult, UserFacingError> {
        bulk::purge_spam(self.gmail.as_ref(), &self.limiters, cancel)
            .await
            .map_err(|e| self.translator.user_error(e.into(), "Spam purge"))
    }
}
