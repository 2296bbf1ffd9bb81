use crate::error::{validation_error, DutyResult, Error, ErrorCategory};
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

/// JSON body of every failed API call
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorCategory,
    pub message: String,
}

impl ErrorCategory {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCategory::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCategory::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Error {
    /// Message shown to the caller in the configured locale
    pub fn localized_message(&self) -> String {
        match self {
            Error::Unauthorized => t!("errors.unauthorized").to_string(),
            Error::Validation { field, message } => {
                t!("errors.validation", field = field, detail = message).to_string()
            }
            Error::NotFound { entity, .. } => t!("errors.not_found", entity = entity).to_string(),
            Error::Conflict(detail) => t!("errors.conflict", detail = detail).to_string(),
            Error::DutyResolution(_) => t!("errors.duty").to_string(),
            _ => t!("errors.internal").to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let category = self.category();
        if category == ErrorCategory::InternalError {
            error!("Request failed: {:?}", self);
        } else {
            debug!("Request rejected: {}", self);
        }

        let body = ErrorBody {
            error: category,
            message: self.localized_message(),
        };
        (category.status(), Json(body)).into_response()
    }
}

/// Unwrap a JSON body, reporting malformed input as a validation failure
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> DutyResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| validation_error("body", &rejection.body_text()))
}

/// Unwrap a urlencoded form body
pub fn form_body<T>(payload: Result<Form<T>, FormRejection>) -> DutyResult<T> {
    payload
        .map(|Form(value)| value)
        .map_err(|rejection| validation_error("body", &rejection.body_text()))
}

/// Unwrap query string parameters
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> DutyResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| validation_error("query", &rejection.body_text()))
}

/// Unwrap an `{id}` path segment
pub fn path_id(id: Result<Path<Uuid>, PathRejection>) -> DutyResult<Uuid> {
    id.map(|Path(id)| id)
        .map_err(|_| validation_error("id", "is not a valid identifier"))
}
