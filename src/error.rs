use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::utils::error_response;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Any fault raised while the store executes a query.
    #[error("{0}")]
    Query(#[from] mongodb::error::Error),

    /// Query fault reported by a store that is not backed by MongoDB.
    #[error("{0}")]
    QueryMessage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &self.to_string())
    }
}
