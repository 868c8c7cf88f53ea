//! 基础设施层实现。
//!
//! 提供 PostgreSQL 仓储、bcrypt 密码哈希等适配器，实现应用层定义的接口。

pub mod migrations;
pub mod password;
pub mod repository;

pub use migrations::MIGRATOR;
pub use password::{BcryptPasswordHasher, DEFAULT_BCRYPT_COST};
pub use repository::{create_pg_pool, PgUserRepository};
