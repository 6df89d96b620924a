use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::core::StoreError;

pub type ApiResult<T> = Result<T, ApiProblem>;

const VALIDATION_TYPE: &str = "/problems/validation";
const STORAGE_TYPE: &str = "/problems/storage";
const KEYS_EXHAUSTED_TYPE: &str = "/problems/keys-exhausted";
const REQUEST_BODY_TYPE: &str = "/problems/request-body";

/// JSON body extractor whose rejections render as problem documents.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiProblem))]
pub struct ApiJson<T>(pub T);

#[derive(Debug)]
pub struct ApiProblem {
    status: StatusCode,
    title: &'static str,
    detail: String,
    kind: &'static str,
    correlation_id: String,
}

impl ApiProblem {
    pub fn from_service(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(detail) => Self::new(
                StatusCode::BAD_REQUEST,
                "Validation failed",
                VALIDATION_TYPE,
                detail,
            ),
            ServiceError::Storage(StoreError::KeysExhausted) => Self::new(
                StatusCode::CONFLICT,
                "Identifier space exhausted",
                KEYS_EXHAUSTED_TYPE,
                StoreError::KeysExhausted.to_string(),
            ),
            ServiceError::Storage(err) => {
                let problem = Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error",
                    STORAGE_TYPE,
                    err.to_string(),
                );
                error!(
                    correlation_id = %problem.correlation_id,
                    error = %err,
                    "employee storage failure"
                );
                problem
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn new(
        status: StatusCode,
        title: &'static str,
        kind: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            title,
            detail: detail.into(),
            kind,
            correlation_id: Uuid::new_v4().to_string(),
        }
    }
}

impl From<ServiceError> for ApiProblem {
    fn from(error: ServiceError) -> Self {
        Self::from_service(error)
    }
}

impl From<JsonRejection> for ApiProblem {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            rejection.status(),
            "Malformed request body",
            REQUEST_BODY_TYPE,
            rejection.body_text(),
        )
    }
}

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    kind: String,
    title: String,
    status: u16,
    detail: String,
    correlation_id: String,
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let payload = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            correlation_id: self.correlation_id,
        };

        let mut response = (self.status, Json(payload)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );

        response
    }
}
