use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::ShopError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] JsonRejection),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(#[from] PathRejection),

    #[error("Invalid query string: {0}")]
    InvalidQuery(#[from] QueryRejection),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Admin access required")]
    Forbidden,

    /// Renders `{error, message, slug}` so storefronts can show which slug missed.
    #[error("Product not found")]
    ProductSlugNotFound(String),

    #[error(transparent)]
    Shop(#[from] ShopError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::MalformedPayload(_)
            | Self::InvalidQuery(_)
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidPath(e) => e.status(),
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ProductSlugNotFound(_) => StatusCode::NOT_FOUND,
            Self::Shop(e) => match e {
                ShopError::ProductNotFound
                | ShopError::CategoryNotFound
                | ShopError::OrderNotFound
                | ShopError::UserNotFound
                | ShopError::PageNotFound
                | ShopError::ShopForNotFound
                | ShopError::MetalRateNotFound
                | ShopError::RecordNotFound => StatusCode::NOT_FOUND,
                ShopError::AlreadyInWishlist | ShopError::DuplicateSlug | ShopError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                ShopError::EmptyOrder
                | ShopError::UnknownReference
                | ShopError::ProductUnavailable(_)
                | ShopError::UnknownStatus(_) => StatusCode::BAD_REQUEST,
                ShopError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = match &self {
            Self::ProductSlugNotFound(slug) => json!({ "error": message, "message": message, "slug": slug }),
            _ => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
