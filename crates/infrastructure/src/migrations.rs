use sqlx::migrate::Migrator;

/// 嵌入的数据库迁移，路径相对于本 crate。
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
