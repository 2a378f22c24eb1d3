//! # Rotation API
//!
//! 线索轮询服务的 REST API，基于 Axum 构建。
//!
//! ## API 端点
//!
//! ### 线索
//! - `POST /api/leads` - 提交客户线索，按轮询顺序分配经销商
//! - `GET /api/leads/{id}` - 查询线索投递状态
//!
//! ### 经销商
//! - `GET /api/dealers` - 经销商列表（按轮询位置排序）
//! - `POST /api/dealers` - 注册经销商
//! - `DELETE /api/dealers/{id}` - 移除经销商
//! - `GET /api/dealers/{id}/leads` - 经销商最近分配到的线索
//!
//! ### 轮询
//! - `GET /api/rotation/progress` - 当前轮询进度
//! - `POST /api/rotation/reset` - 手动重置轮询周期
//!
//! ### 运维
//! - `GET /health` - 健康检查
//! - `GET /metrics` - Prometheus 指标
//!
//! ## 错误响应
//!
//! ```json
//! {
//!   "success": false,
//!   "error": {
//!     "code": "POOL_EMPTY",
//!     "status": 503,
//!     "message": "当前没有可分配的经销商",
//!     "suggestions": ["..."]
//!   }
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod validation;

use axum::{http::HeaderValue, Router};
use rotation_core::config::ApiConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState};

/// 创建带中间件的完整应用
pub fn create_app(state: AppState, config: &ApiConfig) -> Router {
    let mut app = create_routes(state).layer(TraceLayer::new_for_http());

    // 线索提交的截止时间由处理器控制，外层不能丢弃进行中的领取
    if config.cors_enabled {
        app = app.layer(cors_layer(&config.cors_origins));
    }

    app
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("忽略无效的CORS来源: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}
