//! Maps [`DomainError`] onto HTTP responses.
//!
//! Body shape: `{"error": {"code": "not_found", "message": "..."}}`.
//! Internal details are logged and replaced with a generic message.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use domains::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// Malformed request the extractors could not reject themselves
    BadRequest(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl ApiError {
    /// Folds an extractor rejection into the error envelope by its status.
    fn rejected(status: StatusCode, text: String) -> Self {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => Self::Domain(DomainError::PayloadTooLarge(text)),
            StatusCode::UNPROCESSABLE_ENTITY => Self::Domain(DomainError::Validation(text)),
            _ => Self::BadRequest(text),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::rejected(err.status(), err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Domain(err) => match err {
                DomainError::NotFound(..) => (StatusCode::NOT_FOUND, "not_found"),
                DomainError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation"),
                DomainError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
                DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
                DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                DomainError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
                DomainError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Domain(DomainError::Internal(detail)) => {
                error!(error = %detail, "internal error");
                "Something went wrong. Please try again.".into()
            }
            Self::Domain(DomainError::NotFound(entity, id)) => {
                format!("{entity} not found with ID {id}")
            }
            Self::Domain(
                DomainError::Validation(msg)
                | DomainError::Unauthorized(msg)
                | DomainError::Forbidden(msg)
                | DomainError::Conflict(msg)
                | DomainError::PayloadTooLarge(msg),
            ) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.message(),
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: DomainError) -> (StatusCode, serde_json::Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::not_found("story", "x"), StatusCode::NOT_FOUND),
            (DomainError::Validation("Title is required".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::Unauthorized("sign in required".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("not yours".into()), StatusCode::FORBIDDEN),
            (DomainError::Conflict("taken".into()), StatusCode::CONFLICT),
            (DomainError::PayloadTooLarge("big".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (DomainError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(render(err).await.0, expected);
        }
    }

    #[tokio::test]
    async fn body_carries_code_and_message() {
        let (_, body) = render(DomainError::Conflict("This email is already registered".into())).await;
        assert_eq!(body["error"]["code"], "conflict");
        assert_eq!(body["error"]["message"], "This email is already registered");
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (_, body) = render(DomainError::Internal("connection refused at 10.0.0.5".into())).await;
        assert_eq!(body["error"]["code"], "internal");
        assert!(!body.to_string().contains("10.0.0.5"));
    }
}
