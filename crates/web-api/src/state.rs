use std::sync::Arc;

use application::UserService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    /// 响应中是否包含密码哈希
    pub expose_password_hash: bool,
}

impl AppState {
    pub fn new(user_service: Arc<UserService>, expose_password_hash: bool) -> Self {
        Self {
            user_service,
            expose_password_hash,
        }
    }
}
