use chrono::{DateTime, Utc};
use domain::{User, UserSummary};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// 仅在显式开启时返回哈希
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDto {
    pub fn from_user(user: User, expose_password_hash: bool) -> Self {
        Self {
            id: user.id.into(),
            username: user.username,
            email: user.email,
            password: expose_password_hash.then(|| user.password.into_inner()),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummaryDto {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<UserSummary> for UserSummaryDto {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id.into(),
            username: summary.username,
            email: summary.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{PasswordHash, UserId};

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::from(3),
            username: "carol".into(),
            email: "carol@example.com".into(),
            password: PasswordHash::new("$2b$10$digest").unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn password_hash_is_omitted_by_default() {
        let json = serde_json::to_value(UserDto::from_user(user(), false)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "carol");
    }

    #[test]
    fn password_hash_is_returned_when_exposed() {
        let json = serde_json::to_value(UserDto::from_user(user(), true)).unwrap();
        assert_eq!(json["password"], "$2b$10$digest");
    }
}
