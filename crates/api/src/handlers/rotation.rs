use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::ApiResult, response::ApiResponse, routes::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    /// 为 true 时无条件重置全部经销商
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub reset_count: u64,
    pub forced: bool,
}

/// 当前轮询进度
pub async fn get_progress(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let progress = state.engine.progress().await?;
    Ok(ApiResponse::success(progress))
}

/// 手动重置轮询周期
pub async fn reset_rotation(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> ApiResult<impl IntoResponse> {
    let controller = state.engine.reset_controller();
    let reset_count = if query.force {
        controller.force_reset().await?
    } else {
        controller.reset_cycle().await?
    };

    info!(reset_count, forced = query.force, "手动重置轮询周期");
    let message = if reset_count == 0 {
        "无需重置".to_string()
    } else {
        format!("已重置 {reset_count} 个经销商")
    };

    Ok(ApiResponse::success_with_message(
        ResetResponse {
            reset_count,
            forced: query.force,
        },
        message,
    ))
}
