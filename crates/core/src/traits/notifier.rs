use async_trait::async_trait;
use thiserror::Error;

use crate::models::LeadSummary;

/// 通知经销商失败的原因，与轮询错误严格区分
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("通知通道不可用: {0}")]
    Transport(String),

    #[error("通知被拒绝 (状态码 {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("通知超时")]
    Timeout,

    #[error("无效的联系方式: {0}")]
    InvalidChannel(String),
}

/// 经销商通知接口，屏蔽具体通道（邮件、即时消息等）
#[async_trait]
pub trait DealerNotifier: Send + Sync {
    /// 将线索转发到经销商的联系通道
    async fn notify_dealer(
        &self,
        contact_channel: &str,
        lead: &LeadSummary,
    ) -> Result<(), NotifyError>;

    fn name(&self) -> &str;
}
