use application::UserRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    NewUserRecord, PasswordHash, RepositoryError, User, UserId, UserPatch, UserSummary,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};

const USER_COLUMNS: &str = "id, username, email, password, created_at, updated_at";

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let password = PasswordHash::new(value.password)
            .map_err(|err| RepositoryError::storage(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            username: value.username,
            email: value.email,
            password,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserSummaryRecord {
    id: i64,
    username: String,
    email: String,
}

impl From<UserSummaryRecord> for UserSummary {
    fn from(value: UserSummaryRecord) -> Self {
        Self {
            id: UserId::from(value.id),
            username: value.username,
            email: value.email,
        }
    }
}

/// 构建只更新补丁中出现的列的 UPDATE 语句。
///
/// 所有值都通过 `push_bind` 绑定为占位符，SQL 文本中不会出现任何用户输入。
fn build_update_statement(id: UserId, patch: &UserPatch) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE users SET ");
    let mut assignments = builder.separated(", ");
    if let Some(username) = &patch.username {
        assignments
            .push("username = ")
            .push_bind_unseparated(username.as_str());
    }
    if let Some(email) = &patch.email {
        assignments
            .push("email = ")
            .push_bind_unseparated(email.as_str());
    }
    if let Some(password) = &patch.password {
        assignments
            .push("password = ")
            .push_bind_unseparated(password.as_str());
    }
    assignments.push("updated_at = CURRENT_TIMESTAMP");

    builder
        .push(" WHERE id = ")
        .push_bind(i64::from(id))
        .push(" RETURNING ")
        .push(USER_COLUMNS);
    builder
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: NewUserRecord) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn list(&self) -> Result<Vec<UserSummary>, RepositoryError> {
        let records =
            sqlx::query_as::<_, UserSummaryRecord>("SELECT id, username, email FROM users")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(UserSummary::from).collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, email, password, created_at, updated_at FROM users WHERE id = $1"#,
        )
        .bind(i64::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, RepositoryError> {
        let mut statement = build_update_statement(id, &patch);
        tracing::debug!(user_id = %id, sql = statement.sql(), "executing user update");
        let record = statement
            .build_query_as::<UserRecord>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(i64::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
