//! 轮询相关的 Prometheus 指标
//!
//! 指标通过 `metrics` 门面记录，由二进制中安装的导出器渲染。

use metrics::counter;
use rotation_core::models::DeliveryStatus;

pub const CLAIMS_TOTAL: &str = "lead_rotation_claims_total";
pub const CLAIM_CONFLICTS_TOTAL: &str = "lead_rotation_claim_conflicts_total";
pub const RESETS_TOTAL: &str = "lead_rotation_resets_total";
pub const DELIVERIES_TOTAL: &str = "lead_rotation_deliveries_total";

/// 每次记录时才解析计数器，记录器在组件创建之后安装也能生效
#[derive(Debug, Clone, Default)]
pub struct RotationMetrics;

impl RotationMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_claim(&self) {
        counter!(CLAIMS_TOTAL).increment(1);
    }

    pub fn record_claim_conflict(&self) {
        counter!(CLAIM_CONFLICTS_TOTAL).increment(1);
    }

    pub fn record_reset(&self) {
        counter!(RESETS_TOTAL).increment(1);
    }

    pub fn record_delivery(&self, status: DeliveryStatus) {
        counter!(DELIVERIES_TOTAL, "status" => status.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_counters_bind_to_recorder_installed_after_creation() {
        let metrics = RotationMetrics::new();

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            metrics.record_claim();
            metrics.record_claim_conflict();
            metrics.record_reset();
            metrics.record_delivery(DeliveryStatus::Delivered);
        });

        let rendered = handle.render();
        for name in [CLAIMS_TOTAL, CLAIM_CONFLICTS_TOTAL, RESETS_TOTAL] {
            assert!(rendered.contains(&format!("{name} 1")), "missing {name}");
        }
        assert!(rendered.contains("lead_rotation_deliveries_total{status=\"DELIVERED\"} 1"));
    }
}
