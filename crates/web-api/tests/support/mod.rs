use std::sync::{Arc, Mutex};

use application::{UserRepository, UserService, UserServiceDependencies};
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use domain::{NewUserRecord, RepositoryError, User, UserId, UserPatch, UserSummary};
use http_body_util::BodyExt;
use infrastructure::BcryptPasswordHasher;
use serde_json::Value;
use tower::ServiceExt;
use web_api::{router, AppState};

#[derive(Default)]
struct Table {
    rows: Vec<User>,
    last_id: i64,
}

/// 行为接近 `users` 表的内存仓储：自增主键、用户名唯一约束、按插入顺序返回。
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<Table>,
    failure: Option<String>,
}

impl InMemoryUserRepository {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        match &self.failure {
            Some(message) => Err(RepositoryError::storage(message.clone())),
            None => Ok(()),
        }
    }
}

fn unique_violation() -> RepositoryError {
    RepositoryError::storage(
        "error returned from database: duplicate key value violates unique constraint \"users_username_key\"",
    )
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUserRecord) -> Result<User, RepositoryError> {
        self.check()?;
        let mut table = self.table.lock().unwrap();
        if table.rows.iter().any(|row| row.username == user.username) {
            return Err(unique_violation());
        }
        table.last_id += 1;
        let now = Utc::now();
        let stored = User {
            id: UserId::from(table.last_id),
            username: user.username,
            email: user.email,
            password: user.password,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<UserSummary>, RepositoryError> {
        self.check()?;
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().map(UserSummary::from).collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        let table = self.table.lock().unwrap();
        Ok(table.rows.iter().find(|row| row.id == id).cloned())
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        let mut table = self.table.lock().unwrap();
        if let Some(username) = &patch.username {
            if table
                .rows
                .iter()
                .any(|row| row.id != id && &row.username == username)
            {
                return Err(unique_violation());
            }
        }
        Ok(table.rows.iter_mut().find(|row| row.id == id).map(|row| {
            patch.apply_to(row, Utc::now());
            row.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut table = self.table.lock().unwrap();
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);
        Ok(table.rows.len() != before)
    }
}

pub fn build_router(repository: InMemoryUserRepository, expose_password_hash: bool) -> Router {
    let user_service = UserService::new(UserServiceDependencies {
        user_repository: Arc::new(repository),
        // 最低工作因子，测试里只关心哈希是否发生
        password_hasher: Arc::new(BcryptPasswordHasher::new(Some(4))),
    });
    router(AppState::new(Arc::new(user_service), expose_password_hash))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("utf-8 body")
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.into_body().collect().await.unwrap().to_bytes();

    TestResponse {
        status,
        content_type,
        body,
    }
}
