//! # Rotation Testing Utils
//!
//! 轮询服务各 crate 共用的测试工具：
//!
//! - **Mock 仓储**: `DealerRepository` / `LeadRepository` 的内存实现，支持故障注入
//! - **Mock 通知器**: 记录调用，可配置失败或延迟
//! - **测试数据构建器**: 经销商注册信息和线索表单
//! - **SQLite 测试库**: 已执行迁移的内存数据库
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! rotation-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust,ignore
//! use rotation_testing_utils::{MockDealerRepository, DealerBuilder};
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
