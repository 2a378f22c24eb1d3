use std::time::Duration;

use rotation_core::config::RotationConfig;

/// 指数退避策略，用于领取冲突和重置失败后的等待
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// 基础间隔（毫秒）
    pub base_ms: u64,
    /// 最大间隔（毫秒）
    pub max_ms: u64,
    /// 指数退避倍数
    pub multiplier: f64,
    /// 随机抖动范围（0.0-1.0）
    pub jitter_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RotationConfig::default())
    }
}

impl BackoffPolicy {
    pub fn from_config(config: &RotationConfig) -> Self {
        Self {
            base_ms: config.backoff_base_ms,
            max_ms: config.backoff_max_ms,
            multiplier: 2.0,
            jitter_factor: config.backoff_jitter_factor,
        }
    }

    /// 第 `attempt` 次失败（从1开始）之后的等待时间
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_ms as f64;
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let capped = (base * self.multiplier.powi(exponent)).min(self.max_ms as f64);

        // 抖动打散同时冲突的请求，结果不超过上限也不为负
        let jitter = capped * self.jitter_factor * (rand::random::<f64>() - 0.5) * 2.0;
        let millis = (capped + jitter).clamp(0.0, self.max_ms as f64);

        Duration::from_micros((millis * 1000.0) as u64)
    }
}
