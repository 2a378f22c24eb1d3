//! 经销商通知通道
//!
//! 根据 [`NotifierConfig`] 创建具体的 [`DealerNotifier`] 实现：
//!
//! ```text
//! kind = "log"      -> LogNotifier      (只记录日志)
//! kind = "webhook"  -> WebhookNotifier  (JSON POST 到外部投递服务)
//! ```

pub mod log_notifier;
pub mod webhook_notifier;

use std::sync::Arc;

use rotation_core::{
    config::{NotifierConfig, NotifierKind},
    traits::DealerNotifier,
    RotationError, RotationResult,
};

pub use log_notifier::LogNotifier;
pub use webhook_notifier::WebhookNotifier;

pub fn create_notifier(config: &NotifierConfig) -> RotationResult<Arc<dyn DealerNotifier>> {
    match config.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierKind::Webhook => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                RotationError::Configuration("webhook通知必须配置webhook_url".to_string())
            })?;
            let notifier = WebhookNotifier::new(
                url,
                config.auth_token.clone(),
                std::time::Duration::from_secs(config.timeout_seconds),
            )?;
            Ok(Arc::new(notifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_log_notifier() {
        let notifier = create_notifier(&NotifierConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[test]
    fn test_webhook_without_url_is_rejected() {
        let config = NotifierConfig {
            kind: NotifierKind::Webhook,
            ..NotifierConfig::default()
        };
        assert!(matches!(
            create_notifier(&config),
            Err(RotationError::Configuration(_))
        ));
    }
}
