//! 配置管理
//!
//! 配置按以下顺序加载，后者覆盖前者：
//!
//! 1. 内置默认值
//! 2. TOML 配置文件
//! 3. 环境变量（前缀 `ROTATION_`，层级分隔符 `__`，例如
//!    `ROTATION_DATABASE__URL`）
//!
//! 每个配置段都提供 `validate()`，加载完成后统一校验。

pub mod models;

pub use models::*;
