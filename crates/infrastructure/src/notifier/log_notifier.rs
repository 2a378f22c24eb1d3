use async_trait::async_trait;
use rotation_core::{
    models::LeadSummary,
    traits::{DealerNotifier, NotifyError},
};
use tracing::info;

/// 开发环境使用的通知器，线索内容只写入日志
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DealerNotifier for LogNotifier {
    async fn notify_dealer(
        &self,
        contact_channel: &str,
        lead: &LeadSummary,
    ) -> Result<(), NotifyError> {
        if contact_channel.trim().is_empty() {
            return Err(NotifyError::InvalidChannel(contact_channel.to_string()));
        }

        info!(
            submission_id = lead.submission_id,
            contact_channel = contact_channel,
            "线索已转发给经销商: {} <{}>",
            lead.full_name,
            lead.email
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary() -> LeadSummary {
        LeadSummary {
            submission_id: 1,
            full_name: "Avi Mizrahi".to_string(),
            id_number: "111111111".to_string(),
            email: "avi@example.com".to_string(),
            phone: "052-1111111".to_string(),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_log_notifier_accepts_channel() {
        let notifier = LogNotifier::new();
        assert!(notifier
            .notify_dealer("dealer@example.com", &summary())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_rejects_empty_channel() {
        let notifier = LogNotifier::new();
        let result = notifier.notify_dealer("  ", &summary()).await;
        assert!(matches!(result, Err(NotifyError::InvalidChannel(_))));
    }
}
