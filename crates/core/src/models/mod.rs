//! # 数据模型
//!
//! 线索轮询系统的核心数据结构：经销商池中的经销商、线索提交记录以及
//! 转发给经销商的线索摘要。
//!
//! ## 经销商可用性流转
//!
//! ```text
//! available=true ──claim──▶ available=false ──reset──▶ available=true
//! ```
//!
//! 一个轮询周期内每个经销商最多被领取一次；只有周期重置才能把
//! `available` 恢复为 `true`。
//!
//! ## 线索投递状态流转
//!
//! ```text
//! PENDING ──▶ DELIVERED
//!    │
//!    └──────▶ DELIVERY_FAILED
//! ```
//!
//! `DELIVERED` 和 `DELIVERY_FAILED` 都是终态。
//!
//! ## 数据库映射
//!
//! ### dealers 表
//! - `id` - 经销商标识
//! - `pool_position` - 轮询顺序（唯一）
//! - `available` - 本周期是否仍可领取
//! - `contact_channel` - 通知地址
//!
//! ### lead_submissions 表
//! - `id` - 主键
//! - `assigned_dealer_id` - 被分配的经销商
//! - `delivery_status` - 投递状态
//! - `created_at` - 创建时间

pub mod dealer;
pub mod lead;

pub use dealer::*;
pub use lead::*;
