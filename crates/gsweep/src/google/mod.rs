//! Google API Client Module
//!
//! Authenticated wire clients for Drive and Gmail, and the service traits the
//! rest of the crate programs against.

pub mod client;
pub mod drive;
pub mod gmail;
pub mod service;

#[cfg(test)]
pub(crate) mod fake;

pub use client::GoogleClient;
pub use drive::DriveApi;
pub use gmail::GmailApi;
pub use service::{
    DriveFile, DriveService, GmailService, MailLabel, MailMessage, ShareRole, FOLDER_MIME_TYPE,
};

/// Macro to implement the standard Google API wrapper constructor pattern.
/// Each API struct wraps a `GoogleClient` and provides `new(access_token)`.
macro_rules! google_api_wrapper {
    ($name:ident) => {
        impl $name {
            /// Create a new API client with an OAuth access token
            pub fn new(access_token: crate::auth::AccessToken) -> crate::common::ApiResult<Self> {
                let client = crate::google::client::GoogleClient::new(access_token)?;
                Ok(Self { client })
            }
        }
    };
}

pub(crate) use google_api_wrapper;
