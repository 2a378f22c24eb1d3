use std::time::Duration;

use async_trait::async_trait;
use rotation_core::{
    models::LeadSummary,
    traits::{DealerNotifier, NotifyError},
    RotationError, RotationResult,
};
use serde::Serialize;
use tracing::{debug, warn};

/// 投递服务接收的请求体
#[derive(Debug, Serialize)]
struct LeadDeliveryPayload<'a> {
    contact_channel: &'a str,
    lead: &'a LeadSummary,
}

/// 通过 HTTP webhook 把线索交给外部投递服务（邮件、短信网关等）
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    auth_token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: String, auth_token: Option<String>, timeout: Duration) -> RotationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RotationError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            url,
            auth_token,
        })
    }
}

#[async_trait]
impl DealerNotifier for WebhookNotifier {
    async fn notify_dealer(
        &self,
        contact_channel: &str,
        lead: &LeadSummary,
    ) -> Result<(), NotifyError> {
        if contact_channel.trim().is_empty() {
            return Err(NotifyError::InvalidChannel(contact_channel.to_string()));
        }

        let mut request = self.client.post(&self.url).json(&LeadDeliveryPayload {
            contact_channel,
            lead,
        });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Timeout
            } else {
                NotifyError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                "投递服务拒绝线索 {}: {} {}",
                lead.submission_id, status, message
            );
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!("线索 {} 已通过webhook投递", lead.submission_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    fn summary() -> LeadSummary {
        LeadSummary {
            submission_id: 42,
            full_name: "Yael Katz".to_string(),
            id_number: "222222222".to_string(),
            email: "yael@example.com".to_string(),
            phone: "054-2222222".to_string(),
            submitted_at: Utc::now(),
        }
    }

    async fn spawn_server(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/deliver",
                post(
                    move |State(received): State<Received>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        received.lock().unwrap().push((auth, body));
                        status
                    },
                ),
            )
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/deliver"), received)
    }

    #[tokio::test]
    async fn test_webhook_posts_lead_with_bearer_token() {
        let (url, received) = spawn_server(StatusCode::OK).await;
        let notifier =
            WebhookNotifier::new(url, Some("secret".to_string()), Duration::from_secs(5)).unwrap();

        notifier
            .notify_dealer("dealer@example.com", &summary())
            .await
            .unwrap();

        let calls = received.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.as_deref(), Some("Bearer secret"));
        assert_eq!(calls[0].1["contact_channel"], "dealer@example.com");
        assert_eq!(calls[0].1["lead"]["submission_id"], 42);
    }

    #[tokio::test]
    async fn test_webhook_maps_error_status_to_rejected() {
        let (url, _) = spawn_server(StatusCode::SERVICE_UNAVAILABLE).await;
        let notifier = WebhookNotifier::new(url, None, Duration::from_secs(5)).unwrap();

        let result = notifier.notify_dealer("dealer@example.com", &summary()).await;
        assert!(matches!(
            result,
            Err(NotifyError::Rejected { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_webhook_unreachable_is_transport_error() {
        let notifier = WebhookNotifier::new(
            "http://127.0.0.1:1/deliver".to_string(),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let result = notifier.notify_dealer("dealer@example.com", &summary()).await;
        assert!(matches!(
            result,
            Err(NotifyError::Transport(_)) | Err(NotifyError::Timeout)
        ));
    }
}
