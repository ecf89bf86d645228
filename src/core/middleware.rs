//! 核心中间件模块

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::{any::Any, sync::Arc, time::Instant};
use tracing::{error, info};

use super::{
    error::{ErrorResponse, INTERNAL_ERROR_MESSAGE},
    metrics::ServiceMetrics,
};

/// 未匹配任何路由时的端点标签
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// 请求日志与指标中间件
pub async fn request_logging_middleware(
    State(metrics): State<Arc<ServiceMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    metrics.record_request(method.as_str(), &endpoint, status.as_u16(), duration);

    info!(
        "{} {} - {} - {}ms - User-Agent: {:?}",
        method,
        uri,
        status,
        duration.as_millis(),
        user_agent
    );

    response
}

/// 处理器 panic 时返回通用 500，不暴露内部信息
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("请求处理发生 panic: {}", detail);

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (
        status,
        Json(ErrorResponse::new(
            status,
            "INTERNAL_SERVER_ERROR",
            INTERNAL_ERROR_MESSAGE,
        )),
    )
        .into_response()
}

/// 未知路由
pub async fn not_found_fallback() -> Response {
    let status = StatusCode::NOT_FOUND;
    (
        status,
        Json(ErrorResponse::new(status, "NOT_FOUND", "Endpoint not found")),
    )
        .into_response()
}
