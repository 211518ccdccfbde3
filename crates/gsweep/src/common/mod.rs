//! Common Utilities
//!
//! Shared error type, time source, HTTP client construction and paths.

pub mod clock;
pub mod error;
pub mod http;
pub mod paths;
pub mod result;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ApiError, ErrorKind};
pub use http::{create_http_client, create_http_client_with_timeout};
pub use paths::{config_path, gsweep_dir};
pub use result::ApiResult;
