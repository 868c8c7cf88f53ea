//! 用户管理核心领域模型
//!
//! 包含用户实体、值对象以及仓储层使用的错误类型。

pub mod errors;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use user::*;
pub use value_objects::*;
