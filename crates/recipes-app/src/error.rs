use axum::{
    extract::multipart::MultipartError,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use recipes_store::ImageError;
use serde::Serialize;
use tracing::{error, warn};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("No recipe exists with ID {0}")]
    RecipeNotFound(i64),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("No file provided")]
    NoFile,
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ImageError),
    #[error("Upload failed")]
    UploadFailed,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body returned to API clients
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    fn new(error: &'static str, message: impl Into<Option<String>>) -> Self {
        ErrorBody {
            error,
            message: message.into(),
        }
    }
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Validation failed", msg),
            ),
            ApiError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid request", msg),
            ),
            ApiError::RecipeNotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("Recipe not found", format!("No recipe exists with ID {id}")),
            ),
            ApiError::ResourceNotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorBody::new("Not found", msg))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new("Conflict", msg)),
            ApiError::NoFile => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("No file provided", None),
            ),
            ApiError::InvalidImage(e) => {
                warn!("Rejected image: {e}");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Invalid image", ImageError::policy_message()),
                )
            }
            ApiError::UploadFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Upload failed", None),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Unauthorized", None),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::new("Forbidden", None)),
            ApiError::Internal(msg) => {
                error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error", None),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<recipes_dal::Error> for ApiError {
    fn from(value: recipes_dal::Error) -> Self {
        use recipes_dal::Error;
        match value {
            Error::RecipeNotFound(id) => ApiError::RecipeNotFound(id),
            Error::RecordNotFound(what) => ApiError::ResourceNotFound(what),
            e @ Error::FailedUpdate { .. } => ApiError::Conflict(e.to_string()),
            Error::InvalidOrderByField(field) => {
                ApiError::InvalidRequest(format!("Invalid order by field: {field}"))
            }
            Error::InvalidCredentials => ApiError::Unauthorized,
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        ApiError::InvalidRequest(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dal_error_mapping() {
        let err: ApiError = recipes_dal::Error::RecipeNotFound(7).into();
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Recipe not found");
        assert_eq!(body.message.as_deref(), Some("No recipe exists with ID 7"));

        let err: ApiError = recipes_dal::Error::FailedUpdate { id: 1, version: 2 }.into();
        assert_eq!(err.status_and_body().0, StatusCode::CONFLICT);
    }

    #[test]
    fn test_image_errors() {
        let (status, body) = ApiError::from(ImageError::Empty).status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Invalid image");
        assert_eq!(
            body.message.as_deref(),
            Some("Invalid image file. Allowed types: .jpg, .jpeg, .png, .gif, .webp. Max size: 5MB")
        );

        let (status, body) = ApiError::NoFile.status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.is_none());

        let (status, _) = ApiError::UploadFailed.status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
