use thiserror::Error;

/// 线索轮询错误类型定义
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("经销商未找到: {id}")]
    DealerNotFound { id: String },

    #[error("线索提交记录未找到: {id}")]
    LeadNotFound { id: i64 },

    #[error("经销商池为空，没有可分配的经销商")]
    PoolEmpty,

    #[error("争用激烈，{attempts} 次尝试后仍未能领取经销商")]
    Contended { attempts: u32 },

    #[error("线索投递失败: {0}")]
    DeliveryFailed(String),

    #[error("轮询周期重置失败 (尝试 {attempts} 次): {message}")]
    ResetFailed { attempts: u32, message: String },

    #[error("无效的线索表单: {0}")]
    InvalidLead(String),

    #[error("请求已超过截止时间")]
    DeadlineExceeded,

    #[error("经销商已存在: {id}")]
    DealerAlreadyExists { id: String },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl RotationError {
    /// 调用方是否可以带退避地重试整个请求
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RotationError::Contended { .. } | RotationError::Database(_)
        )
    }

    /// 是否属于影响轮询公平性的错误，这类错误绝不能产生已分配的线索记录
    pub fn is_rotation_failure(&self) -> bool {
        matches!(
            self,
            RotationError::PoolEmpty
                | RotationError::Contended { .. }
                | RotationError::ResetFailed { .. }
        )
    }

    /// 稳定的错误代码，供API响应和日志使用
    pub fn code(&self) -> &'static str {
        match self {
            RotationError::Database(_) => "DATABASE_ERROR",
            RotationError::DealerNotFound { .. } => "DEALER_NOT_FOUND",
            RotationError::LeadNotFound { .. } => "LEAD_NOT_FOUND",
            RotationError::PoolEmpty => "POOL_EMPTY",
            RotationError::Contended { .. } => "CONTENDED",
            RotationError::DeliveryFailed(_) => "DELIVERY_FAILED",
            RotationError::ResetFailed { .. } => "RESET_FAILED",
            RotationError::InvalidLead(_) => "INVALID_LEAD",
            RotationError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            RotationError::DealerAlreadyExists { .. } => "DEALER_ALREADY_EXISTS",
            RotationError::Configuration(_) => "CONFIGURATION_ERROR",
            RotationError::Serialization(_) => "SERIALIZATION_ERROR",
            RotationError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(RotationError::Contended { attempts: 5 }.is_retryable());
        assert!(RotationError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!RotationError::PoolEmpty.is_retryable());
        assert!(!RotationError::DealerNotFound {
            id: "d-1".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_rotation_failures() {
        assert!(RotationError::PoolEmpty.is_rotation_failure());
        assert!(RotationError::ResetFailed {
            attempts: 3,
            message: "disk full".to_string()
        }
        .is_rotation_failure());
        assert!(!RotationError::DeliveryFailed("smtp down".to_string()).is_rotation_failure());
    }

    #[test]
    fn test_error_display() {
        let err = RotationError::Contended { attempts: 4 };
        assert!(err.to_string().contains('4'));
        assert_eq!(err.code(), "CONTENDED");
    }
}
