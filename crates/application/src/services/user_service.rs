use std::sync::Arc;

use domain::{NewUserRecord, User, UserId, UserPatch, UserSummary};
use tracing::instrument;
use validator::Validate;

use crate::{
    error::ApplicationError,
    password::PasswordHasher,
    repository::UserRepository,
    validation::{collect_violations, CreateUserRequest, UpdateUserRequest},
};

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
}

/// 用户增删改查用例。
///
/// 每个操作都在自己的 tracing span 中执行，span 带有操作名和用户 ID，
/// 失败时记录的日志因此总能定位到具体请求。
pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    #[instrument(name = "create_user", skip_all, fields(username = %request.username))]
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, ApplicationError> {
        validate(&request)?;

        let password = self.deps.password_hasher.hash(&request.password).await?;
        let user = self
            .deps
            .user_repository
            .insert(NewUserRecord {
                username: request.username,
                email: request.email,
                password,
            })
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Error creating user"))?;

        tracing::info!(user_id = %user.id, username = %user.username, "New user created");
        Ok(user)
    }

    #[instrument(name = "list_users", skip_all)]
    pub async fn list(&self) -> Result<Vec<UserSummary>, ApplicationError> {
        let users = self
            .deps
            .user_repository
            .list()
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Error retrieving users"))?;

        tracing::info!(count = users.len(), "All users retrieved");
        Ok(users)
    }

    #[instrument(name = "get_user", skip(self))]
    pub async fn get(&self, id: UserId) -> Result<User, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(id)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Error retrieving user"))?
            .ok_or_else(|| {
                tracing::warn!("User not found");
                ApplicationError::NotFound(id)
            })?;

        tracing::info!(username = %user.username, "User retrieved");
        Ok(user)
    }

    #[instrument(name = "update_user", skip(self, request))]
    pub async fn update(
        &self,
        id: UserId,
        request: UpdateUserRequest,
    ) -> Result<User, ApplicationError> {
        validate(&request)?;
        if request.is_empty() {
            tracing::warn!("No fields to update");
            return Err(ApplicationError::NoFieldsToUpdate);
        }

        let password = match request.password {
            Some(plaintext) => Some(self.deps.password_hasher.hash(&plaintext).await?),
            None => None,
        };
        let patch = UserPatch {
            username: request.username,
            email: request.email,
            password,
        };

        let user = self
            .deps
            .user_repository
            .update(id, patch)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Error updating user"))?
            .ok_or_else(|| {
                tracing::warn!("User not found");
                ApplicationError::NotFound(id)
            })?;

        tracing::info!(username = %user.username, "User updated");
        Ok(user)
    }

    /// 删除不检查行是否存在，重复删除同样成功。
    #[instrument(name = "delete_user", skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<(), ApplicationError> {
        let existed = self
            .deps
            .user_repository
            .delete(id)
            .await
            .inspect_err(|err| tracing::error!(error = %err, "Error deleting user"))?;

        tracing::info!(existed, "User deleted");
        Ok(())
    }
}

fn validate(request: &impl Validate) -> Result<(), ApplicationError> {
    request.validate().map_err(|errors| {
        let violations = collect_violations(&errors);
        tracing::warn!(violations = violations.len(), "Request failed validation");
        ApplicationError::Validation(violations)
    })
}
