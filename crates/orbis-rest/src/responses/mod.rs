//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orbis_core::{ErrorResponse, OrbisError, Page, PageMeta};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Response messages.
pub mod messages {
    pub const GET_DATA_COUNTRY: &str = "Get data country success.";
    pub const GET_DATA_COUNTRIES: &str = "Get data countries success.";
    pub const GET_DATA_STATES: &str = "Get data states success.";
    pub const GET_DATA_CITIES: &str = "Get data cities success.";
    pub const CACHE_INVALIDATED: &str = "Cache invalidated.";
}

/// Standard API response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub pagination: Option<Pagination>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Creates a 200 response without pagination.
    pub fn ok(data: T, message: &str) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            data,
            pagination: None,
            message: message.to_string(),
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Creates a 200 response for one page of a listing.
    pub fn page(page: Page<T>, message: &str) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            pagination: Some(Pagination::from(&page.meta)),
            data: page.data,
            message: message.to_string(),
        }
    }
}

/// Pagination block of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: u64,
    pub total_page: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl From<&PageMeta> for Pagination {
    fn from(meta: &PageMeta) -> Self {
        Self {
            page: meta.page,
            limit: meta.limit,
            total: meta.total,
            total_page: meta.pages,
            has_previous_page: meta.has_previous(),
            has_next_page: meta.has_next(),
        }
    }
}

/// Application error type for Axum.
///
/// Carries the request path so the error body can echo it.
#[derive(Debug)]
pub struct AppError {
    pub error: OrbisError,
    pub path: String,
}

impl AppError {
    /// Wraps an error without a path.
    pub fn new(error: OrbisError) -> Self {
        Self {
            error,
            path: String::new(),
        }
    }

    /// Sets the request path reported in the body.
    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

impl From<OrbisError> for AppError {
    fn from(error: OrbisError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(path = %self.path, error = %self.error, "Request failed");
        } else {
            warn!(path = %self.path, error = %self.error, "Request rejected");
        }

        let body = ErrorResponse::from_error(&self.error).with_path(self.path);
        (status, Json(body)).into_response()
    }
}

/// Result type for Axum handlers.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Maps an error to an [`AppError`] reporting `path`.
pub fn at_path(path: &str) -> impl FnOnce(OrbisError) -> AppError + '_ {
    move |error| AppError::new(error).at(path)
}
