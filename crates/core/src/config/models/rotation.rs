use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 轮询分配配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// 单次领取最多尝试比较并设置的次数
    pub claim_max_attempts: u32,
    /// 退避基础间隔（毫秒）
    pub backoff_base_ms: u64,
    /// 退避最大间隔（毫秒）
    pub backoff_max_ms: u64,
    /// 退避随机抖动范围（0.0-1.0）
    pub backoff_jitter_factor: f64,
    /// 周期重置失败后的最大尝试次数
    pub reset_max_attempts: u32,
    /// 公共表单提交的默认截止时间（秒）
    pub submit_timeout_seconds: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            claim_max_attempts: 8,
            backoff_base_ms: 5,
            backoff_max_ms: 200,
            backoff_jitter_factor: 0.2,
            reset_max_attempts: 5,
            submit_timeout_seconds: 15,
        }
    }
}

impl RotationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.claim_max_attempts == 0 {
            return Err(anyhow::anyhow!("领取尝试次数必须大于0"));
        }

        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(anyhow::anyhow!("退避基础间隔不能大于最大间隔"));
        }

        if !(0.0..=1.0).contains(&self.backoff_jitter_factor) {
            return Err(anyhow::anyhow!("退避抖动系数必须在0.0到1.0之间"));
        }

        if self.reset_max_attempts == 0 {
            return Err(anyhow::anyhow!("重置尝试次数必须大于0"));
        }

        if self.submit_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("提交截止时间必须大于0"));
        }

        Ok(())
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_seconds)
    }
}
