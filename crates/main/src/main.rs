//! 用户 API 入口
//!
//! 加载配置、连接 PostgreSQL、按需执行迁移，然后启动 Axum 服务。

use std::sync::Arc;

use application::{PasswordHasher, UserRepository, UserService, UserServiceDependencies};
use config::ApiConfig;
use infrastructure::{create_pg_pool, BcryptPasswordHasher, PgUserRepository, MIGRATOR};
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load()?;
    bootstrap::init_tracing(&config.log);

    tracing::info!(database = config.database.redacted_url(), "连接数据库");
    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    if config.database.run_migrations {
        MIGRATOR.run(&pg_pool).await?;
    }

    let user_repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pg_pool));
    let password_hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(Some(config.security.bcrypt_cost)));

    let user_service = UserService::new(UserServiceDependencies {
        user_repository,
        password_hasher,
    });
    let state = AppState::new(
        Arc::new(user_service),
        config.security.expose_password_hash,
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;

    tracing::info!(port = config.server.port, "Server running on port {}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(bootstrap::shutdown_signal())
        .await?;

    Ok(())
}
