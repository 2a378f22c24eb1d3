use std::sync::Arc;

use chrono::Utc;
use rotation_core::{
    models::{Dealer, DeliveryStatus, LeadForm, LeadSubmission, NewLeadSubmission},
    traits::{DealerNotifier, LeadRepository},
    RotationError, RotationResult,
};
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::assignment::AssignmentEngine;
use crate::metrics::RotationMetrics;

/// 线索提交协调器
///
/// 处理流程：
/// 1. 校验表单字段是否填写完整
/// 2. 通过 [`AssignmentEngine`] 领取经销商，失败时不会创建任何记录
/// 3. 以 `PENDING` 状态持久化线索
/// 4. 通知经销商并记录投递结果，投递失败不会撤销领取
pub struct LeadSubmissionCoordinator {
    engine: Arc<AssignmentEngine>,
    lead_repo: Arc<dyn LeadRepository>,
    notifier: Arc<dyn DealerNotifier>,
    metrics: RotationMetrics,
}

impl LeadSubmissionCoordinator {
    pub fn new(
        engine: Arc<AssignmentEngine>,
        lead_repo: Arc<dyn LeadRepository>,
        notifier: Arc<dyn DealerNotifier>,
    ) -> Self {
        Self {
            engine,
            lead_repo,
            notifier,
            metrics: RotationMetrics::new(),
        }
    }

    pub fn engine(&self) -> &Arc<AssignmentEngine> {
        &self.engine
    }

    /// 提交线索，返回的记录包含最终的投递状态
    #[instrument(skip(self, form))]
    pub async fn submit_lead(
        &self,
        form: LeadForm,
        deadline: Option<Instant>,
    ) -> RotationResult<LeadSubmission> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            return Err(RotationError::InvalidLead(format!(
                "缺少必填字段: {}",
                missing.join(", ")
            )));
        }

        let dealer = match deadline {
            Some(deadline) => self.engine.claim_next_dealer_before(deadline).await?,
            None => self.engine.claim_next_dealer().await?,
        };

        let new_lead = NewLeadSubmission {
            form,
            assigned_dealer_id: dealer.id.clone(),
            assigned_at: Utc::now(),
        };

        let mut submission = match self.lead_repo.create(&new_lead).await {
            Ok(submission) => submission,
            Err(e) => {
                // 经销商已被领取，领取不回滚，日志中保留补录所需的全部字段
                error!(
                    dealer_id = %dealer.id,
                    full_name = %new_lead.form.full_name,
                    id_number = %new_lead.form.id_number,
                    email = %new_lead.form.email,
                    phone = %new_lead.form.phone,
                    assigned_at = %new_lead.assigned_at,
                    error = %e,
                    "线索持久化失败，经销商已被领取，需要人工补录"
                );
                return Err(e);
            }
        };

        let (status, delivery_error) = self.deliver(&dealer, &submission, deadline).await;

        match self
            .lead_repo
            .update_delivery_status(submission.id, status, delivery_error.as_deref())
            .await
        {
            Ok(true) => {
                submission.delivery_status = status;
                submission.delivery_error = delivery_error;
            }
            Ok(false) => {
                warn!(submission_id = submission.id, "线索投递状态已被写入，保留原状态");
                if let Ok(Some(current)) = self.lead_repo.get_by_id(submission.id).await {
                    submission = current;
                }
            }
            Err(e) => {
                error!(
                    submission_id = submission.id,
                    dealer_id = %dealer.id,
                    status = %status,
                    error = %e,
                    "更新线索投递状态失败，记录保持 PENDING"
                );
            }
        }

        self.metrics.record_delivery(status);
        info!(
            submission_id = submission.id,
            dealer_id = %dealer.id,
            delivery_status = %submission.delivery_status,
            "线索提交完成"
        );

        Ok(submission)
    }

    /// 通知经销商，返回应写入的投递状态
    async fn deliver(
        &self,
        dealer: &Dealer,
        submission: &LeadSubmission,
        deadline: Option<Instant>,
    ) -> (DeliveryStatus, Option<String>) {
        let summary = submission.summary();
        let notify = self.notifier.notify_dealer(&dealer.contact_channel, &summary);

        let outcome = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, notify).await {
                Ok(result) => result.map_err(|e| RotationError::DeliveryFailed(e.to_string())),
                Err(_) => Err(RotationError::DeadlineExceeded),
            },
            None => notify
                .await
                .map_err(|e| RotationError::DeliveryFailed(e.to_string())),
        };

        match outcome {
            Ok(()) => (DeliveryStatus::Delivered, None),
            Err(e) => {
                warn!(
                    submission_id = submission.id,
                    dealer_id = %dealer.id,
                    notifier = self.notifier.name(),
                    error = %e,
                    "线索通知经销商失败"
                );
                (DeliveryStatus::DeliveryFailed, Some(e.to_string()))
            }
        }
    }

    /// 查询线索提交记录
    pub async fn get_submission(&self, id: i64) -> RotationResult<LeadSubmission> {
        self.lead_repo
            .get_by_id(id)
            .await?
            .ok_or(RotationError::LeadNotFound { id })
    }

    /// 某个经销商最近分配到的线索
    pub async fn dealer_submissions(
        &self,
        dealer_id: &str,
        limit: i64,
    ) -> RotationResult<Vec<LeadSubmission>> {
        self.lead_repo.list_by_dealer(dealer_id, limit).await
    }
}
