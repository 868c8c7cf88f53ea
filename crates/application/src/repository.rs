use async_trait::async_trait;
use domain::{NewUserRecord, RepositoryError, User, UserId, UserPatch, UserSummary};

/// `users` 表的持久化接口。
///
/// 所有方法都是单次尝试，不做重试；并发更新同一行时以最后一次写入为准。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUserRecord) -> Result<User, RepositoryError>;
    async fn list(&self) -> Result<Vec<UserSummary>, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    /// 没有匹配行时返回 `Ok(None)`。
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<Option<User>, RepositoryError>;
    /// 返回是否真的删除了一行。
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
}
