//! 应用层实现。
//!
//! 这里提供围绕用户模型的用例服务，处理输入校验、密码哈希，
//! 以及对外部适配器（例如仓储、哈希算法）的抽象。

pub mod dto;
pub mod error;
pub mod password;
pub mod repository;
pub mod services;
pub mod validation;

pub use dto::{UserDto, UserSummaryDto};
pub use error::{ApplicationError, FieldViolation};
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::UserRepository;
pub use services::{UserService, UserServiceDependencies};
pub use validation::{CreateUserRequest, UpdateUserRequest};
