use domain::{RepositoryError, UserId};
use serde::Serialize;
use thiserror::Error;

use crate::password::PasswordHasherError;

/// 单条字段级校验失败信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("no fields to update")]
    NoFieldsToUpdate,
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
}
