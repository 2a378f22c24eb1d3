use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::routes::AppState;

/// 存活检查，同时通过读取经销商池探测数据库
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, database, dealers) = match state.dealer_repo.list_dealers().await {
        Ok(dealers) => (StatusCode::OK, "up", Some(dealers.len())),
        Err(e) => {
            warn!(error = %e, "健康检查数据库探测失败");
            (StatusCode::SERVICE_UNAVAILABLE, "down", None)
        }
    };

    (
        status,
        Json(json!({
            "status": if status.is_success() { "ok" } else { "degraded" },
            "database": database,
            "dealers": dealers,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "lead-rotation",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
