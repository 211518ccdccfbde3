//! Gmail API v1 Client
//!
//! Provides methods for interacting with Gmail API:
//! - List/search messages
//! - Trash or permanently delete messages
//! - List, create and apply labels

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::client::{extract_array, GoogleClient, Pagination};
use super::service::{GmailService, MailLabel, MailMessage};
use crate::common::ApiResult;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

const MESSAGES_PAGINATION: Pagination = Pagination {
    items_field: "messages",
    size_param: "maxResults",
    max_page_size: 500,
};

pub struct GmailApi {
    client: GoogleClient,
}

super::google_api_wrapper!(GmailApi);

/// Query parameters for a message listing
fn list_params(query: Option<&str>, label_ids: &[String]) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        params.push(("q", q.to_string()));
    }
    for label in label_ids {
        params.push(("labelIds", label.clone()));
    }
    // SPAM and TRASH are excluded from listings unless asked for
    if label_ids.iter().any(|l| l == "SPAM" || l == "TRASH") {
        params.push(("includeSpamTrash", "true".to_string()));
    }
    params
}

fn modify_body(add: &[String], remove: &[String]) -> Value {
    let mut body = json!({});
    if !add.is_empty() {
        body["addLabelIds"] = json!(add);
    }
    if !remove.is_empty() {
        body["removeLabelIds"] = json!(remove);
    }
    body
}

#[async_trait]
impl GmailService for GmailApi {
    async fn list_messages(
        &self,
        query: Option<&str>,
        label_ids: &[String],
        limit: Option<usize>,
    ) -> ApiResult<Vec<MailMessage>> {
        info!("Listing Gmail messages");

        let url = format!("{}/users/me/messages", GMAIL_API_BASE);
        let messages = self
            .client
            .get_paginated(&url, &list_params(query, label_ids), MESSAGES_PAGINATION, limit)
            .await?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<MailMessage>, _>>()?;

        debug!("Retrieved {} messages", messages.len());
        Ok(messages)
    }

    async fn delete_message(&self, id: &str) -> ApiResult<()> {
        debug!("Deleting message: {}", id);

        let url = format!("{}/users/me/messages/{}", GMAIL_API_BASE, id);
        self.client.delete(&url).await?;
        Ok(())
    }

    async fn trash_message(&self, id: &str) -> ApiResult<()> {
        debug!("Trashing message: {}", id);

        let url = format!("{}/users/me/messages/{}/trash", GMAIL_API_BASE, id);
        self.client.post(&url, &[], &json!({})).await?;
        Ok(())
    }

    async fn list_labels(&self) -> ApiResult<Vec<MailLabel>> {
        info!("Listing Gmail labels");

        let url = format!("{}/users/me/labels", GMAIL_API_BASE);
        let response = self.client.get(&url, &[]).await?;
        let labels = extract_array(&response, "labels")
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<MailLabel>, _>>()?;

        debug!("Retrieved {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> ApiResult<MailLabel> {
        info!("Creating Gmail label: {}", name);

        let body = json!({
            "name": name,
            "labelListVisibility": "labelShow",
            "messageListVisibility": "show",
        });
        let url = format!("{}/users/me/labels", GMAIL_API_BASE);
        let created = self.client.post(&url, &[], &body).await?;
        Ok(serde_json::from_value(created)?)
    }

    async fn modify_labels(&self, id: &str, add: &[String], remove: &[String]) -> ApiResult<()> {
        debug!("Modifying labels for message: {}", id);

        let url = format!("{}/users/me/messages/{}/modify", GMAIL_API_BASE, id);
        self.client.post(&url, &[], &modify_body(add, remove)).await?;
        Ok(())
    }
}
