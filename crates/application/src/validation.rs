//! 请求校验规则。
//!
//! 创建和更新共用同一套字段规则；更新时缺省的字段不参与校验，
//! 且邮箱不再要求非空（空串仍会因格式不合法被拒绝）。
//! 校验会收集每一条被违反的规则，而不是遇到第一条就返回。

use std::{borrow::Cow, fmt};

use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

use crate::error::FieldViolation;

const FIELD_ORDER: [&str; 3] = ["username", "email", "password"];

#[derive(Clone, Default)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &self.email, true);
        check_password(&mut errors, &self.password);
        into_result(errors)
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(username) = &self.username {
            check_username(&mut errors, username);
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email, false);
        }
        if let Some(password) = &self.password {
            check_password(&mut errors, password);
        }
        into_result(errors)
    }
}

// 明文密码不进日志
impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn check_username(errors: &mut ValidationErrors, value: &str) {
    if !value.validate_length(Some(3), None, None) {
        reject(errors, "username", "length", "Username must be at least 3 characters long");
    }
    if !value.validate_length(None, Some(20), None) {
        reject(errors, "username", "length", "Username cannot be longer than 20 characters");
    }
    if contains_whitespace(value) {
        reject(errors, "username", "whitespace", "Username cannot contain whitespace");
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str, required: bool) {
    if required && !value.validate_length(Some(1), None, None) {
        reject(errors, "email", "length", "Email is required");
    }
    if !value.validate_length(None, Some(255), None) {
        reject(errors, "email", "length", "Email cannot be longer than 255 characters");
    }
    if contains_whitespace(value) {
        reject(errors, "email", "whitespace", "Email cannot contain whitespace");
    }
    if !value.validate_email() || !has_top_level_domain(value) {
        reject(errors, "email", "email", "Email must be valid");
    }
}

fn check_password(errors: &mut ValidationErrors, value: &str) {
    if !value.validate_length(Some(8), None, None) {
        reject(errors, "password", "length", "Password must be at least 8 characters long");
    }
    if !value.validate_length(None, Some(50), None) {
        reject(errors, "password", "length", "Password cannot be longer than 50 characters");
    }
}

fn contains_whitespace(value: &str) -> bool {
    value.chars().any(char::is_whitespace)
}

/// 域名部分必须带顶级域，`user@localhost` 不被接受。
fn has_top_level_domain(value: &str) -> bool {
    value
        .rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .is_some_and(|(host, tld)| !host.is_empty() && tld.chars().count() >= 2)
}

fn reject(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: &'static str,
) {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    errors.add(field, error);
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// 把 validator 的错误展开成有序的字段错误列表。
pub fn collect_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| {
        let name: &str = field.as_ref();
        FIELD_ORDER
            .iter()
            .position(|known| *known == name)
            .unwrap_or(FIELD_ORDER.len())
    });

    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();
            errors.iter().map(move |error| FieldViolation {
                field: field.clone(),
                message: error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string()),
            })
        })
        .collect()
}
