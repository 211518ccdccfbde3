//! gsweep: request governance and bulk cleanup for Google Drive and Gmail.
//!
//! Every user-initiated call goes through the same layers: input sanitizing,
//! per-family rate limits, CSRF-protected sign-in, and error translation into
//! a fixed set of user-facing sentences. Bulk runs (organize, cleanup, spam
//! purge) add a hard size cap and partial-failure accounting on top.

pub mod auth;
pub mod bootstrap;
pub mod bulk;
pub mod common;
pub mod config;
pub mod google;
pub mod ops;
pub mod rate_limit;
pub mod sanitize;
pub mod translate;

pub use bulk::{BulkError, BulkResult, MAX_BULK_ITEMS};
pub use common::{ApiError, ApiResult, ErrorKind};
pub use config::Config;
pub use rate_limit::{Limiters, RateLimiter};
pub use translate::{Translator, UserFacingError};
