use application::{ApplicationError, FieldViolation};
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ViolationsBody {
    errors: Vec<FieldViolation>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    error: String,
}

#[derive(Debug)]
enum ErrorBody {
    /// `{"errors": [...]}`
    Violations(Vec<FieldViolation>),
    /// `{"error": "..."}`
    Message(String),
    /// 纯文本
    Text(&'static str),
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody::Message(message.into()),
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody::Message(message.into()),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Validation(violations) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody::Violations(violations),
            },
            ApplicationError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                body: ErrorBody::Text("User not found"),
            },
            ApplicationError::NoFieldsToUpdate => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody::Text("No fields to update"),
            },
            // 存储层的错误信息原样返回
            ApplicationError::Repository(err) => Self::internal_server_error(err.to_string()),
            ApplicationError::Password(err) => Self::internal_server_error(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Rejected request body");
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "Rejected request path");
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.body {
            ErrorBody::Violations(errors) => {
                (self.status, Json(ViolationsBody { errors })).into_response()
            }
            ErrorBody::Message(error) => (self.status, Json(MessageBody { error })).into_response(),
            ErrorBody::Text(text) => (self.status, text).into_response(),
        }
    }
}
