//! Request and response types shared by the HTTP handlers

pub mod error;
pub mod json;
pub mod query;

pub use error::{ApiError, ApiErrorDetail, ApiErrorResponse, ApiErrorType};
pub use json::{domain_check, validation_failure, Json, ValidatedJson};
pub use query::{double_option, Query};
