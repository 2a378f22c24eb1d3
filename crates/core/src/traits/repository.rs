//! 数据仓储层接口定义
//!
//! 此模块定义了经销商池和线索记录的持久化抽象：
//! - 经销商池仓储接口 (DealerRepository)
//! - 线索提交仓储接口 (LeadRepository)
//!
//! ## 并发约束
//!
//! `available` 列是整个系统唯一被争用的共享可变状态，只能通过
//! [`DealerRepository::try_claim`]、[`DealerRepository::reset_if_exhausted`]
//! 和 [`DealerRepository::reset_all_available`] 这几个原子原语修改。
//! 每个修改在调用返回之前都已持久化。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use rotation_core::traits::DealerRepository;
//!
//! async fn claim_first(repo: &dyn DealerRepository) -> RotationResult<Option<Dealer>> {
//!     for dealer in repo.list_dealers().await? {
//!         if dealer.available && repo.try_claim(&dealer.id).await? {
//!             return Ok(Some(dealer));
//!         }
//!     }
//!     Ok(None)
//! }
//! ```

use async_trait::async_trait;

use crate::{
    models::{DeliveryStatus, Dealer, LeadSubmission, NewDealer, NewLeadSubmission},
    RotationResult,
};

/// 经销商池仓储接口
#[async_trait]
pub trait DealerRepository: Send + Sync {
    /// 按 `pool_position` 升序（相同位置按 `id`）返回全部经销商
    async fn list_dealers(&self) -> RotationResult<Vec<Dealer>>;

    /// 根据ID获取经销商
    async fn get_by_id(&self, dealer_id: &str) -> RotationResult<Option<Dealer>>;

    /// 注册新经销商，追加到轮询顺序末尾
    ///
    /// # 错误
    ///
    /// * `DealerAlreadyExists` - 经销商ID已存在
    async fn register(&self, dealer: &NewDealer) -> RotationResult<Dealer>;

    /// 移除经销商
    ///
    /// # 错误
    ///
    /// * `DealerNotFound` - 经销商ID不存在
    async fn remove(&self, dealer_id: &str) -> RotationResult<()>;

    /// 直接设置可用标记
    ///
    /// # 错误
    ///
    /// * `DealerNotFound` - 经销商ID不存在
    async fn set_available(&self, dealer_id: &str, available: bool) -> RotationResult<()>;

    /// 比较并设置：仅当经销商仍然可用时将其标记为不可用
    ///
    /// 返回 `true` 表示本次调用赢得了领取，`false` 表示已被其他调用者领取
    /// 或经销商不存在。
    async fn try_claim(&self, dealer_id: &str) -> RotationResult<bool>;

    /// 在一个原子操作中将所有经销商设为可用，返回状态发生变化的数量
    async fn reset_all_available(&self) -> RotationResult<u64>;

    /// 仅当当前没有任何可用经销商时才原子地重置整个池
    ///
    /// 检查与写入在同一个原子操作中完成，迟到的重置不会把新周期里
    /// 已被领取的经销商重新置为可用。返回被重置的数量，另一个调用者已经
    /// 完成重置时返回 0。
    async fn reset_if_exhausted(&self) -> RotationResult<u64>;
}

/// 线索提交仓储接口
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// 创建状态为 `PENDING` 的线索记录
    async fn create(&self, lead: &NewLeadSubmission) -> RotationResult<LeadSubmission>;

    /// 根据ID获取线索记录
    async fn get_by_id(&self, id: i64) -> RotationResult<Option<LeadSubmission>>;

    /// 更新投递状态，仅当记录仍处于 `PENDING` 时生效
    ///
    /// 返回 `false` 表示记录已处于终态，未做任何修改。
    ///
    /// # 错误
    ///
    /// * `LeadNotFound` - 记录不存在
    async fn update_delivery_status(
        &self,
        id: i64,
        status: DeliveryStatus,
        delivery_error: Option<&str>,
    ) -> RotationResult<bool>;

    /// 查询某个经销商最近收到的线索
    async fn list_by_dealer(&self, dealer_id: &str, limit: i64)
        -> RotationResult<Vec<LeadSubmission>>;
}
