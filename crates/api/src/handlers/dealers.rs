use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use rotation_core::models::NewDealer;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::{
    error::ApiResult,
    response::{created, no_content, success},
    routes::AppState,
    validation::{clamp_limit, validate_dealer_id},
};

/// 经销商注册请求
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterDealerRequest {
    #[validate(
        length(min = 1, max = 64, message = "经销商ID长度必须在1-64个字符之间"),
        custom(function = "validate_dealer_id")
    )]
    pub id: String,
    #[validate(length(min = 1, max = 200, message = "显示名称长度必须在1-200个字符之间"))]
    pub display_name: String,
    #[validate(length(min = 1, max = 320, message = "联系方式不能为空"))]
    pub contact_channel: String,
    pub avatar_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DealerLeadsQuery {
    pub limit: Option<i64>,
}

/// 经销商列表（状态/调试视图）
pub async fn list_dealers(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let dealers = state.dealer_repo.list_dealers().await?;
    Ok(success(dealers))
}

/// 注册经销商，追加到轮询末尾
pub async fn register_dealer(
    State(state): State<AppState>,
    Json(request): Json<RegisterDealerRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let dealer = state
        .dealer_repo
        .register(&NewDealer {
            id: request.id,
            display_name: request.display_name,
            contact_channel: request.contact_channel,
            avatar_ref: request.avatar_ref,
        })
        .await?;

    info!(
        dealer_id = %dealer.id,
        pool_position = dealer.pool_position,
        "经销商已注册"
    );
    Ok(created(dealer))
}

/// 移除经销商
pub async fn remove_dealer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.dealer_repo.remove(&id).await?;
    info!(dealer_id = %id, "经销商已移除");
    Ok(no_content())
}

/// 经销商最近分配到的线索
pub async fn dealer_leads(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DealerLeadsQuery>,
) -> ApiResult<impl IntoResponse> {
    if state.dealer_repo.get_by_id(&id).await?.is_none() {
        return Err(rotation_core::RotationError::DealerNotFound { id }.into());
    }

    let leads = state
        .coordinator
        .dealer_submissions(&id, clamp_limit(query.limit))
        .await?;
    Ok(success(leads))
}
