use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rotation_core::traits::DealerRepository;
use rotation_dispatcher::{AssignmentEngine, LeadSubmissionCoordinator};

use crate::handlers::{
    dealers::{dealer_leads, list_dealers, register_dealer, remove_dealer},
    health::health_check,
    leads::{get_lead, submit_lead},
    metrics::render_metrics,
    rotation::{get_progress, reset_rotation},
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<LeadSubmissionCoordinator>,
    pub engine: Arc<AssignmentEngine>,
    pub dealer_repo: Arc<dyn DealerRepository>,
    /// 单次线索提交的截止时间
    pub submit_timeout: Duration,
    pub metrics_handle: Option<PrometheusHandle>,
    pub metrics_endpoint: String,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    let metrics_endpoint = state.metrics_endpoint.clone();

    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        .route(&metrics_endpoint, get(render_metrics))
        // 线索
        .route("/api/leads", post(submit_lead))
        .route("/api/leads/{id}", get(get_lead))
        // 经销商管理
        .route("/api/dealers", get(list_dealers).post(register_dealer))
        .route("/api/dealers/{id}", axum::routing::delete(remove_dealer))
        .route("/api/dealers/{id}/leads", get(dealer_leads))
        // 轮询状态
        .route("/api/rotation/progress", get(get_progress))
        .route("/api/rotation/reset", post(reset_rotation))
        .with_state(state)
}
