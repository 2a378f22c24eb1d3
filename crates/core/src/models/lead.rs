use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 线索投递状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeliveryStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[serde(rename = "DELIVERY_FAILED")]
    DeliveryFailed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::DeliveryFailed => "DELIVERY_FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }

    /// 只允许 PENDING → DELIVERED / DELIVERY_FAILED
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (DeliveryStatus::Pending, DeliveryStatus::Delivered)
                | (DeliveryStatus::Pending, DeliveryStatus::DeliveryFailed)
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(DeliveryStatus::Pending),
            "DELIVERED" => Ok(DeliveryStatus::Delivered),
            "DELIVERY_FAILED" => Ok(DeliveryStatus::DeliveryFailed),
            _ => Err(format!("Invalid delivery status: {s}")),
        }
    }
}

/// 客户注册表单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadForm {
    pub full_name: String,
    pub id_number: String,
    pub email: String,
    pub phone: String,
    pub agreement_accepted: bool,
}

impl LeadForm {
    /// 返回缺失的字段名（只检查是否填写，不校验内容）
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.full_name.trim().is_empty() {
            missing.push("full_name");
        }
        if self.id_number.trim().is_empty() {
            missing.push("id_number");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if !self.agreement_accepted {
            missing.push("agreement_accepted");
        }
        missing
    }
}

/// 待持久化的线索提交记录，领取经销商成功之后才会创建
#[derive(Debug, Clone)]
pub struct NewLeadSubmission {
    pub form: LeadForm,
    pub assigned_dealer_id: String,
    pub assigned_at: DateTime<Utc>,
}

/// 线索提交记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadSubmission {
    pub id: i64,
    pub full_name: String,
    pub id_number: String,
    pub email: String,
    pub phone: String,
    pub agreement_accepted: bool,
    pub assigned_dealer_id: String,
    pub assigned_at: DateTime<Utc>,
    pub delivery_status: DeliveryStatus,
    pub delivery_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadSubmission {
    pub fn summary(&self) -> LeadSummary {
        LeadSummary {
            submission_id: self.id,
            full_name: self.full_name.clone(),
            id_number: self.id_number.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            submitted_at: self.created_at,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.delivery_status == DeliveryStatus::Delivered
    }
}

/// 转发给经销商的线索摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadSummary {
    pub submission_id: i64,
    pub full_name: String,
    pub id_number: String,
    pub email: String,
    pub phone: String,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> LeadForm {
        LeadForm {
            full_name: "Dana Levi".to_string(),
            id_number: "123456789".to_string(),
            email: "dana@example.com".to_string(),
            phone: "+972500000000".to_string(),
            agreement_accepted: true,
        }
    }

    #[test]
    fn test_complete_form_has_no_missing_fields() {
        assert!(form().missing_fields().is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut f = form();
        f.email = "   ".to_string();
        f.agreement_accepted = false;
        assert_eq!(f.missing_fields(), vec!["email", "agreement_accepted"]);
    }

    #[test]
    fn test_delivery_status_transitions() {
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Delivered));
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::DeliveryFailed));
        assert!(!DeliveryStatus::Delivered.can_transition_to(DeliveryStatus::DeliveryFailed));
        assert!(!DeliveryStatus::DeliveryFailed.can_transition_to(DeliveryStatus::Delivered));
        assert!(!DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Pending));
        assert!(DeliveryStatus::Delivered.is_terminal());
        assert!(!DeliveryStatus::Pending.is_terminal());
    }

    #[test]
    fn test_delivery_status_parsing() {
        assert_eq!(
            "DELIVERY_FAILED".parse::<DeliveryStatus>().unwrap(),
            DeliveryStatus::DeliveryFailed
        );
        assert!("UNKNOWN".parse::<DeliveryStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::Pending).unwrap(),
            "\"PENDING\""
        );
    }
}
