//! 核心错误处理模块

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// 返回给客户端的统一内部错误消息
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 核心错误类型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// 字段校验失败
    #[error("{message}")]
    Validation { field: String, message: String },
    /// 请求体无法解析
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// 库存调整后会变成负数
    #[error("Insufficient stock: available {available}, requested change {requested}")]
    InsufficientStock { available: i64, requested: i64 },
    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },
    /// 内部细节只写日志，不返回给客户端
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn product_not_found(id: &str) -> Self {
        CoreError::NotFound(format!("Product {} not found", id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::Validation { .. }
            | CoreError::BadRequest(_)
            | CoreError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "VALIDATION_ERROR",
            CoreError::BadRequest(_) => "BAD_REQUEST",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::RateLimited { .. } => "RATE_LIMITED",
            CoreError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// 错误响应结构
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub code: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            field: None,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let (user_message, field) = match &self {
            CoreError::Internal(detail) => {
                error!("内部错误: {}", detail);
                (INTERNAL_ERROR_MESSAGE.to_string(), None)
            }
            CoreError::Validation { field, message } => (message.clone(), Some(field.clone())),
            other => (other.to_string(), None),
        };

        let mut body = ErrorResponse::new(status, kind, user_message);
        body.field = field;

        let mut response = (status, Json(body)).into_response();
        if let CoreError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<JsonRejection> for CoreError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("请求体解析失败: {}", rejection.body_text());
        CoreError::BadRequest("Request body must be a JSON object".to_string())
    }
}

/// 锁中毒统一视为内部错误
impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        CoreError::Internal(format!("lock poisoned: {}", err))
    }
}
