use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use rotation_core::models::{DeliveryStatus, LeadForm};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use validator::Validate;

use crate::{
    error::ApiResult,
    response::{created, success},
    routes::AppState,
};

/// 公共注册表单提交的内容
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitLeadRequest {
    #[validate(length(max = 200, message = "姓名长度不能超过200个字符"))]
    pub full_name: String,
    #[validate(length(max = 32, message = "证件号长度不能超过32个字符"))]
    pub id_number: String,
    #[validate(length(max = 254, message = "邮箱长度不能超过254个字符"))]
    pub email: String,
    #[validate(length(max = 32, message = "电话长度不能超过32个字符"))]
    pub phone: String,
    #[serde(default)]
    pub agreement_accepted: bool,
}

impl From<SubmitLeadRequest> for LeadForm {
    fn from(request: SubmitLeadRequest) -> Self {
        LeadForm {
            full_name: request.full_name.trim().to_string(),
            id_number: request.id_number.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            agreement_accepted: request.agreement_accepted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitLeadResponse {
    pub submission_id: i64,
    pub assigned_dealer_display_name: String,
    pub delivery_status: DeliveryStatus,
}

/// 提交线索
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(request): Json<SubmitLeadRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let deadline = Instant::now() + state.submit_timeout;
    let submission = state
        .coordinator
        .submit_lead(request.into(), Some(deadline))
        .await?;

    // 经销商可能已被并发移除，此时退回显示ID
    let display_name = match state
        .dealer_repo
        .get_by_id(&submission.assigned_dealer_id)
        .await
    {
        Ok(Some(dealer)) => dealer.display_name,
        _ => submission.assigned_dealer_id.clone(),
    };

    Ok(created(SubmitLeadResponse {
        submission_id: submission.id,
        assigned_dealer_display_name: display_name,
        delivery_status: submission.delivery_status,
    }))
}

/// 查询线索提交记录
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let submission = state.coordinator.get_submission(id).await?;
    Ok(success(submission))
}
