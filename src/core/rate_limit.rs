//! 按端点、按客户端地址的固定窗口限流

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing::warn;

use super::{error::CoreError, metrics::ServiceMetrics};
use crate::config::RateLimitConfig;

/// 拿不到对端地址时使用的客户端键
pub const UNKNOWN_CLIENT: &str = "unknown";

/// 受限流保护的端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListProducts,
    GetProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    AdjustStock,
}

impl Endpoint {
    /// 根据请求方法和路由模板识别端点，HEAD 与 GET 共用同一个端点
    pub fn classify(method: &Method, route: &str) -> Option<Self> {
        let method = if *method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };
        match (method.as_str(), route) {
            ("GET", "/products") => Some(Endpoint::ListProducts),
            ("POST", "/products") => Some(Endpoint::CreateProduct),
            ("GET", "/products/:id") => Some(Endpoint::GetProduct),
            ("PUT", "/products/:id") => Some(Endpoint::UpdateProduct),
            ("DELETE", "/products/:id") => Some(Endpoint::DeleteProduct),
            ("PATCH", "/products/:id/stock") => Some(Endpoint::AdjustStock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::ListProducts => "list_products",
            Endpoint::GetProduct => "get_product",
            Endpoint::CreateProduct => "create_product",
            Endpoint::UpdateProduct => "update_product",
            Endpoint::DeleteProduct => "delete_product",
            Endpoint::AdjustStock => "adjust_stock",
        }
    }
}

impl RateLimitConfig {
    /// 端点在每个窗口内允许的请求数
    pub fn limit_for(&self, endpoint: Endpoint) -> u32 {
        match endpoint {
            Endpoint::ListProducts => self.list_products,
            Endpoint::GetProduct => self.get_product,
            Endpoint::CreateProduct => self.create_product,
            Endpoint::UpdateProduct => self.update_product,
            Endpoint::DeleteProduct => self.delete_product,
            Endpoint::AdjustStock => self.adjust_stock,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// 固定窗口限流器
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<(Endpoint, String), Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// 记录一次请求，超限时返回 `CoreError::RateLimited`
    pub fn check(&self, endpoint: Endpoint, client: &str) -> Result<(), CoreError> {
        self.check_at(endpoint, client, Instant::now())
    }

    pub fn check_at(&self, endpoint: Endpoint, client: &str, now: Instant) -> Result<(), CoreError> {
        if !self.config.enabled {
            return Ok(());
        }

        let window = self.window();
        let limit = self.config.limit_for(endpoint);
        let mut windows = self.windows.lock()?;

        // 清理过期的记录
        windows.retain(|_, w| now.saturating_duration_since(w.started) < window);

        let entry = windows
            .entry((endpoint, client.to_string()))
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if entry.count >= limit {
            let remaining = window.saturating_sub(now.saturating_duration_since(entry.started));
            // 向上取整，至少 1 秒
            let retry_after_secs = (remaining.as_millis().div_ceil(1000) as u64).max(1);
            return Err(CoreError::RateLimited { retry_after_secs });
        }

        entry.count += 1;
        Ok(())
    }

    /// 当前活跃的窗口数
    pub fn active_windows(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

/// 限流中间件，需通过 `route_layer` 挂载以便拿到 `MatchedPath`
pub async fn rate_limiting_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    State(metrics): State<Arc<ServiceMetrics>>,
    req: Request,
    next: Next,
) -> Result<Response, CoreError> {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| Endpoint::classify(req.method(), path.as_str()));

    if let Some(endpoint) = endpoint {
        let client = client_key(&req);
        if let Err(err) = limiter.check(endpoint, &client) {
            warn!("客户端 {} 触发限流: {}", client, endpoint.as_str());
            metrics.record_rate_limited(endpoint.as_str());
            return Err(err);
        }
    }

    Ok(next.run(req).await)
}

fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
