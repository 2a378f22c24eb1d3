//! Shared database mapping utilities
//!
//! Row-to-model helpers shared by the PostgreSQL and SQLite repositories.

use rotation_core::{DeliveryStatus, RotationError, RotationResult};

/// Helper functions for parsing database fields across different database types
pub struct MappingHelpers;

impl MappingHelpers {
    pub fn parse_delivery_status(value: &str) -> RotationResult<DeliveryStatus> {
        value
            .parse()
            .map_err(|e: String| RotationError::Serialization(format!("解析投递状态失败: {e}")))
    }

    /// 唯一约束冲突单独识别，其他数据库错误原样返回
    pub fn is_unique_violation(error: &sqlx::Error) -> bool {
        matches!(error, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
    }

    /// 非 `PENDING` 的目标状态无法由投递结果写入
    pub fn ensure_delivery_transition(status: DeliveryStatus) -> RotationResult<()> {
        if DeliveryStatus::Pending.can_transition_to(status) {
            Ok(())
        } else {
            Err(RotationError::Internal(format!(
                "无效的投递状态转换: PENDING -> {status}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delivery_status() {
        assert_eq!(
            MappingHelpers::parse_delivery_status("DELIVERED").unwrap(),
            DeliveryStatus::Delivered
        );
        assert!(matches!(
            MappingHelpers::parse_delivery_status("LOST"),
            Err(RotationError::Serialization(_))
        ));
    }

    #[test]
    fn test_pending_is_not_a_delivery_outcome() {
        assert!(MappingHelpers::ensure_delivery_transition(DeliveryStatus::Delivered).is_ok());
        assert!(MappingHelpers::ensure_delivery_transition(DeliveryStatus::Pending).is_err());
    }
}
