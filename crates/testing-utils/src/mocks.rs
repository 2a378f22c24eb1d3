//! Mock implementations for the repository and notifier traits
//!
//! 内存实现，语义与 SQL 仓储一致（比较并设置、条件重置），
//! 另外提供故障注入用于测试重试和错误路径。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rotation_core::{
    models::{Dealer, DeliveryStatus, LeadSubmission, LeadSummary, NewDealer, NewLeadSubmission},
    traits::{DealerNotifier, DealerRepository, LeadRepository, NotifyError},
    RotationError, RotationResult,
};

#[derive(Debug, Default)]
struct DealerFaults {
    lost_claims: u32,
    failing_resets: u32,
    ignored_resets: u32,
    claim_delay: Option<Duration>,
}

/// Mock implementation of DealerRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockDealerRepository {
    dealers: Arc<Mutex<Vec<Dealer>>>,
    faults: Arc<Mutex<DealerFaults>>,
    claim_attempts: Arc<AtomicU32>,
    reset_writes: Arc<AtomicU32>,
}

impl MockDealerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dealers(dealers: Vec<NewDealer>) -> Self {
        let repo = Self::new();
        {
            let mut pool = repo.dealers.lock().unwrap();
            for (position, dealer) in dealers.into_iter().enumerate() {
                pool.push(Dealer::new(dealer, position as i64));
            }
        }
        repo
    }

    /// 直接写入经销商，绕过位置分配（用于构造异常数据）
    pub fn insert_raw(&self, dealer: Dealer) {
        self.dealers.lock().unwrap().push(dealer);
    }

    /// 接下来 `n` 次领取假装输掉竞争
    pub fn lose_next_claims(&self, n: u32) {
        self.faults.lock().unwrap().lost_claims = n;
    }

    /// 接下来 `n` 次条件重置返回数据库错误
    pub fn fail_next_resets(&self, n: u32) {
        self.faults.lock().unwrap().failing_resets = n;
    }

    /// 接下来 `n` 次重置报告成功但没有写入
    pub fn ignore_next_resets(&self, n: u32) {
        self.faults.lock().unwrap().ignored_resets = n;
    }

    pub fn set_claim_delay(&self, delay: Duration) {
        self.faults.lock().unwrap().claim_delay = Some(delay);
    }

    pub fn claim_attempts(&self) -> u32 {
        self.claim_attempts.load(Ordering::SeqCst)
    }

    /// 实际生效（写入了至少一行）的重置次数
    pub fn reset_writes(&self) -> u32 {
        self.reset_writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Dealer> {
        let mut dealers = self.dealers.lock().unwrap().clone();
        dealers.sort_by(|a, b| a.rotation_key().cmp(&b.rotation_key()));
        dealers
    }

    pub fn available_ids(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter(|d| d.available)
            .map(|d| d.id)
            .collect()
    }

    fn injected_failure() -> RotationError {
        RotationError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl DealerRepository for MockDealerRepository {
    async fn list_dealers(&self) -> RotationResult<Vec<Dealer>> {
        Ok(self.snapshot())
    }

    async fn get_by_id(&self, dealer_id: &str) -> RotationResult<Option<Dealer>> {
        let dealers = self.dealers.lock().unwrap();
        Ok(dealers.iter().find(|d| d.id == dealer_id).cloned())
    }

    async fn register(&self, dealer: &NewDealer) -> RotationResult<Dealer> {
        let mut dealers = self.dealers.lock().unwrap();
        if dealers.iter().any(|d| d.id == dealer.id) {
            return Err(RotationError::DealerAlreadyExists {
                id: dealer.id.clone(),
            });
        }

        let position = dealers
            .iter()
            .map(|d| d.pool_position)
            .max()
            .map_or(0, |max| max + 1);
        let created = Dealer::new(dealer.clone(), position);
        dealers.push(created.clone());
        Ok(created)
    }

    async fn remove(&self, dealer_id: &str) -> RotationResult<()> {
        let mut dealers = self.dealers.lock().unwrap();
        let before = dealers.len();
        dealers.retain(|d| d.id != dealer_id);
        if dealers.len() == before {
            return Err(RotationError::DealerNotFound {
                id: dealer_id.to_string(),
            });
        }
        Ok(())
    }

    async fn set_available(&self, dealer_id: &str, available: bool) -> RotationResult<()> {
        let mut dealers = self.dealers.lock().unwrap();
        let dealer = dealers
            .iter_mut()
            .find(|d| d.id == dealer_id)
            .ok_or_else(|| RotationError::DealerNotFound {
                id: dealer_id.to_string(),
            })?;
        dealer.available = available;
        Ok(())
    }

    async fn try_claim(&self, dealer_id: &str) -> RotationResult<bool> {
        self.claim_attempts.fetch_add(1, Ordering::SeqCst);

        let delay = self.faults.lock().unwrap().claim_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut faults = self.faults.lock().unwrap();
            if faults.lost_claims > 0 {
                faults.lost_claims -= 1;
                return Ok(false);
            }
        }

        let mut dealers = self.dealers.lock().unwrap();
        match dealers.iter_mut().find(|d| d.id == dealer_id) {
            Some(dealer) if dealer.available => {
                dealer.available = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_all_available(&self) -> RotationResult<u64> {
        {
            let mut faults = self.faults.lock().unwrap();
            if faults.failing_resets > 0 {
                faults.failing_resets -= 1;
                return Err(Self::injected_failure());
            }
            if faults.ignored_resets > 0 {
                faults.ignored_resets -= 1;
                return Ok(0);
            }
        }

        let mut dealers = self.dealers.lock().unwrap();
        let mut count = 0;
        for dealer in dealers.iter_mut().filter(|d| !d.available) {
            dealer.available = true;
            count += 1;
        }
        if count > 0 {
            self.reset_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(count)
    }

    async fn reset_if_exhausted(&self) -> RotationResult<u64> {
        {
            let mut faults = self.faults.lock().unwrap();
            if faults.failing_resets > 0 {
                faults.failing_resets -= 1;
                return Err(Self::injected_failure());
            }
            if faults.ignored_resets > 0 {
                faults.ignored_resets -= 1;
                return Ok(0);
            }
        }

        // 判断和写入在同一把锁内，对应 SQL 中的单条条件更新
        let mut dealers = self.dealers.lock().unwrap();
        if dealers.iter().any(|d| d.available) {
            return Ok(0);
        }
        let count = dealers.len() as u64;
        for dealer in dealers.iter_mut() {
            dealer.available = true;
        }
        if count > 0 {
            self.reset_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(count)
    }
}

/// Mock implementation of LeadRepository for testing
#[derive(Debug, Clone)]
pub struct MockLeadRepository {
    leads: Arc<Mutex<HashMap<i64, LeadSubmission>>>,
    next_id: Arc<Mutex<i64>>,
    fail_create: Arc<AtomicBool>,
    fail_status_updates: Arc<AtomicBool>,
}

impl MockLeadRepository {
    pub fn new() -> Self {
        Self {
            leads: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            fail_create: Arc::new(AtomicBool::new(false)),
            fail_status_updates: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_status_updates(&self, fail: bool) {
        self.fail_status_updates.store(fail, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.leads.lock().unwrap().len()
    }

    pub fn get_all(&self) -> Vec<LeadSubmission> {
        let mut leads: Vec<_> = self.leads.lock().unwrap().values().cloned().collect();
        leads.sort_by_key(|l| l.id);
        leads
    }
}

impl Default for MockLeadRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadRepository for MockLeadRepository {
    async fn create(&self, lead: &NewLeadSubmission) -> RotationResult<LeadSubmission> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RotationError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut leads = self.leads.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();
        let now = Utc::now();

        let created = LeadSubmission {
            id: *next_id,
            full_name: lead.form.full_name.clone(),
            id_number: lead.form.id_number.clone(),
            email: lead.form.email.clone(),
            phone: lead.form.phone.clone(),
            agreement_accepted: lead.form.agreement_accepted,
            assigned_dealer_id: lead.assigned_dealer_id.clone(),
            assigned_at: lead.assigned_at,
            delivery_status: DeliveryStatus::Pending,
            delivery_error: None,
            created_at: now,
            updated_at: now,
        };
        *next_id += 1;

        leads.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> RotationResult<Option<LeadSubmission>> {
        Ok(self.leads.lock().unwrap().get(&id).cloned())
    }

    async fn update_delivery_status(
        &self,
        id: i64,
        status: DeliveryStatus,
        delivery_error: Option<&str>,
    ) -> RotationResult<bool> {
        if self.fail_status_updates.load(Ordering::SeqCst) {
            return Err(RotationError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .get_mut(&id)
            .ok_or(RotationError::LeadNotFound { id })?;

        if !lead.delivery_status.can_transition_to(status) {
            return Ok(false);
        }
        lead.delivery_status = status;
        lead.delivery_error = delivery_error.map(str::to_string);
        lead.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_by_dealer(
        &self,
        dealer_id: &str,
        limit: i64,
    ) -> RotationResult<Vec<LeadSubmission>> {
        let mut leads: Vec<_> = self
            .leads
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.assigned_dealer_id == dealer_id)
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.id.cmp(&a.id));
        leads.truncate(limit.max(0) as usize);
        Ok(leads)
    }
}

/// 通知器行为
#[derive(Debug, Clone)]
pub enum NotifierBehavior {
    Succeed,
    Reject { status: u16, message: String },
    Delay(Duration),
}

/// Mock implementation of DealerNotifier that records every call
#[derive(Debug, Clone)]
pub struct MockNotifier {
    behavior: Arc<Mutex<NotifierBehavior>>,
    calls: Arc<Mutex<Vec<(String, LeadSummary)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::with_behavior(NotifierBehavior::Succeed)
    }

    pub fn failing() -> Self {
        Self::with_behavior(NotifierBehavior::Reject {
            status: 503,
            message: "mailbox unavailable".to_string(),
        })
    }

    pub fn with_behavior(behavior: NotifierBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_behavior(&self, behavior: NotifierBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<(String, LeadSummary)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DealerNotifier for MockNotifier {
    async fn notify_dealer(
        &self,
        contact_channel: &str,
        lead: &LeadSummary,
    ) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap()
            .push((contact_channel.to_string(), lead.clone()));

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            NotifierBehavior::Succeed => Ok(()),
            NotifierBehavior::Reject { status, message } => {
                Err(NotifyError::Rejected { status, message })
            }
            NotifierBehavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
