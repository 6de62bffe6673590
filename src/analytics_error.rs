//! Failure taxonomy for the analytics operations.
//!
//! Nothing in here ever reaches a caller of the public `compute_*` functions:
//! each variant is logged and then replaced by the operation's zero value.
//! A product id with no matching product is not an error at all; lookups
//! report it as `Ok(None)`.

use thiserror::Error;

use crate::app_response::AppResponse;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Malformed caller input: non-positive limit, unparseable date.
    #[error("validation failure: {0}")]
    Validation(String),

    /// The order or product source could not be read.
    #[error("data access failure: {0}")]
    DataAccess(#[from] AppResponse),
}

impl AnalyticsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AnalyticsError::Validation(msg.into())
    }
}
