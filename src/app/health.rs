//! 健康检查与指标处理器

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use super::state::AppState;
use crate::core::error::CoreError;

pub const SERVICE_NAME: &str = "product-service";

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub products: usize,
    /// 当前未过期的限流窗口数
    pub active_rate_limit_entries: usize,
}

/// 健康检查
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthStatus>, CoreError> {
    Ok(Json(HealthStatus {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        products: state.product_service.product_count()?,
        active_rate_limit_entries: state.rate_limiter.active_windows(),
    }))
}

/// Prometheus 指标
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, CoreError> {
    let body = state
        .metrics
        .render(state.product_service.product_count()?);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
