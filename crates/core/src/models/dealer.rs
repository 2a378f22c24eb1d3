use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 经销商（销售代理），轮询池中的一个成员
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dealer {
    pub id: String,
    pub display_name: String,
    pub contact_channel: String,
    pub avatar_ref: Option<String>,
    /// 本轮询周期内是否仍可领取线索
    pub available: bool,
    /// 轮询顺序，注册时分配一次，之后不再变更
    pub pool_position: i64,
    pub created_at: DateTime<Utc>,
}

/// 经销商注册请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDealer {
    pub id: String,
    pub display_name: String,
    pub contact_channel: String,
    pub avatar_ref: Option<String>,
}

impl Dealer {
    /// 根据注册信息创建经销商，新经销商默认可领取
    pub fn new(registration: NewDealer, pool_position: i64) -> Self {
        Self {
            id: registration.id,
            display_name: registration.display_name,
            contact_channel: registration.contact_channel,
            avatar_ref: registration.avatar_ref,
            available: true,
            pool_position,
            created_at: Utc::now(),
        }
    }

    /// 轮询排序键：先按位置，位置相同时按原始ID
    pub fn rotation_key(&self) -> (i64, &str) {
        (self.pool_position, self.id.as_str())
    }
}

/// 当前轮询进度快照，仅用于展示，可能已经过期
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotationProgress {
    pub total: usize,
    pub available: usize,
    pub claimed: usize,
    /// 下一次领取会选中的经销商（无竞争情况下）
    pub next_dealer_id: Option<String>,
    pub exhausted: bool,
}

impl RotationProgress {
    pub fn from_dealers(dealers: &[Dealer]) -> Self {
        let available = dealers.iter().filter(|d| d.available).count();
        let next_dealer_id = dealers
            .iter()
            .filter(|d| d.available)
            .min_by(|a, b| a.rotation_key().cmp(&b.rotation_key()))
            .map(|d| d.id.clone());

        Self {
            total: dealers.len(),
            available,
            claimed: dealers.len() - available,
            next_dealer_id,
            exhausted: !dealers.is_empty() && available == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dealer(id: &str, position: i64, available: bool) -> Dealer {
        let mut dealer = Dealer::new(
            NewDealer {
                id: id.to_string(),
                display_name: format!("Dealer {id}"),
                contact_channel: format!("{id}@example.com"),
                avatar_ref: None,
            },
            position,
        );
        dealer.available = available;
        dealer
    }

    #[test]
    fn test_new_dealer_is_available() {
        let d = dealer("a", 0, true);
        assert!(d.available);
        assert_eq!(d.pool_position, 0);
    }

    #[test]
    fn test_progress_picks_lowest_available_position() {
        let dealers = vec![dealer("c", 2, true), dealer("a", 0, false), dealer("b", 1, true)];
        let progress = RotationProgress::from_dealers(&dealers);

        assert_eq!(progress.total, 3);
        assert_eq!(progress.available, 2);
        assert_eq!(progress.claimed, 1);
        assert_eq!(progress.next_dealer_id.as_deref(), Some("b"));
        assert!(!progress.exhausted);
    }

    #[test]
    fn test_progress_exhausted_pool() {
        let dealers = vec![dealer("a", 0, false), dealer("b", 1, false)];
        let progress = RotationProgress::from_dealers(&dealers);

        assert!(progress.exhausted);
        assert!(progress.next_dealer_id.is_none());
    }

    #[test]
    fn test_progress_empty_pool_is_not_exhausted() {
        let progress = RotationProgress::from_dealers(&[]);
        assert_eq!(progress.total, 0);
        assert!(!progress.exhausted);
    }
}
