use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use rotation_core::RotationError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("轮询服务错误: {0}")]
    Rotation(#[from] RotationError),

    #[error("验证错误: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("未找到资源")]
    NotFound,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

struct ErrorBody {
    status: StatusCode,
    code: &'static str,
    message: String,
    suggestions: Vec<String>,
}

impl ApiError {
    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Rotation(err) => rotation_error_body(err),
            ApiError::Validation(errors) => {
                let details: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .map(|(field, errors)| {
                        let messages: Vec<String> = errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            })
                            .collect();
                        format!("{}: {}", field, messages.join(", "))
                    })
                    .collect();

                ErrorBody {
                    status: StatusCode::BAD_REQUEST,
                    code: "VALIDATION_ERROR",
                    message: format!("请求参数验证失败: {}", details.join("; ")),
                    suggestions: vec!["请检查请求参数是否符合要求".to_string()],
                }
            }
            ApiError::BadRequest(msg) => ErrorBody {
                status: StatusCode::BAD_REQUEST,
                code: "BAD_REQUEST",
                message: format!("请求参数错误: {msg}"),
                suggestions: vec![
                    "请检查请求格式和参数".to_string(),
                    "确保Content-Type正确设置".to_string(),
                ],
            },
            ApiError::NotFound => ErrorBody {
                status: StatusCode::NOT_FOUND,
                code: "NOT_FOUND",
                message: "请求的资源不存在".to_string(),
                suggestions: vec!["请检查请求URL是否正确".to_string()],
            },
            ApiError::Internal(msg) => ErrorBody {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_ERROR",
                message: "系统内部错误".to_string(),
                suggestions: vec![
                    "系统遇到内部错误，请稍后重试".to_string(),
                    format!("错误详情: {msg}"),
                ],
            },
        }
    }
}

fn rotation_error_body(err: &RotationError) -> ErrorBody {
    let (status, message, suggestions) = match err {
        RotationError::DealerNotFound { id } => (
            StatusCode::NOT_FOUND,
            format!("经销商 {id} 不存在"),
            vec!["使用 GET /api/dealers 查看所有经销商".to_string()],
        ),
        RotationError::LeadNotFound { id } => (
            StatusCode::NOT_FOUND,
            format!("线索提交记录 {id} 不存在"),
            vec!["请检查提交编号是否正确".to_string()],
        ),
        RotationError::PoolEmpty => (
            StatusCode::SERVICE_UNAVAILABLE,
            "当前没有可分配的经销商".to_string(),
            vec![
                "请稍后重试".to_string(),
                "管理员可通过 POST /api/dealers 注册经销商".to_string(),
            ],
        ),
        RotationError::Contended { attempts } => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("提交量过大，{attempts} 次尝试后仍未完成分配"),
            vec!["请稍后重试".to_string()],
        ),
        RotationError::ResetFailed { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "轮询周期重置失败".to_string(),
            vec![
                "请联系系统管理员".to_string(),
                "管理员可通过 POST /api/rotation/reset?force=true 手动重置".to_string(),
            ],
        ),
        RotationError::InvalidLead(msg) => (
            StatusCode::BAD_REQUEST,
            msg.clone(),
            vec!["请填写所有必填字段并同意条款".to_string()],
        ),
        RotationError::DeadlineExceeded => (
            StatusCode::GATEWAY_TIMEOUT,
            "请求处理超时".to_string(),
            vec!["请稍后重试".to_string()],
        ),
        RotationError::DealerAlreadyExists { id } => (
            StatusCode::CONFLICT,
            format!("经销商 {id} 已存在"),
            vec!["请使用其他经销商ID".to_string()],
        ),
        RotationError::DeliveryFailed(msg) => (
            StatusCode::BAD_GATEWAY,
            format!("线索投递失败: {msg}"),
            vec!["线索已记录，请稍后查询投递状态".to_string()],
        ),
        RotationError::Database(_)
        | RotationError::Configuration(_)
        | RotationError::Serialization(_)
        | RotationError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "系统内部错误".to_string(),
            vec![
                "系统遇到内部错误，请稍后重试".to_string(),
                "查看 GET /health 检查系统状态".to_string(),
            ],
        ),
    };

    ErrorBody {
        status,
        code: err.code(),
        message,
        suggestions,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();

        if body.status.is_server_error() {
            error!(code = body.code, error = %self, "请求处理失败");
        }

        let json = Json(json!({
            "success": false,
            "error": {
                "code": body.code,
                "status": body.status.as_u16(),
                "message": body.message,
                "suggestions": body.suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        let retryable = matches!(&self, ApiError::Rotation(e) if e.is_retryable());
        if retryable && body.status == StatusCode::SERVICE_UNAVAILABLE {
            (body.status, [(header::RETRY_AFTER, "1")], json).into_response()
        } else {
            (body.status, json).into_response()
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
