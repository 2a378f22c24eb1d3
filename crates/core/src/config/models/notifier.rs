use serde::{Deserialize, Serialize};

/// 通知通道类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    /// 只写日志，用于开发环境
    Log,
    /// 以JSON POST到外部投递服务
    Webhook,
}

/// 经销商通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub webhook_url: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            webhook_url: None,
            auth_token: None,
            timeout_seconds: 10,
        }
    }
}

impl NotifierConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kind == NotifierKind::Webhook {
            match self.webhook_url.as_deref() {
                None | Some("") => {
                    return Err(anyhow::anyhow!("webhook通知必须配置webhook_url"));
                }
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(anyhow::anyhow!("webhook_url必须是HTTP(S)地址: {url}"));
                }
                _ => {}
            }
        }

        if self.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("通知超时时间必须大于0"));
        }

        Ok(())
    }
}
