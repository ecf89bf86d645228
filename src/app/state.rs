//! 应用状态

use axum::extract::FromRef;
use std::sync::Arc;

use super::product::{model::sample_products, service::ProductService, store::ProductStore};
use crate::config::ServiceConfig;
use crate::core::{metrics::ServiceMetrics, rate_limit::RateLimiter};
use crate::infrastructure::memory_store::InMemoryProductStore;

#[derive(Clone)]
pub struct AppState {
    pub product_service: ProductService,
    pub metrics: Arc<ServiceMetrics>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// 使用给定的存储构建状态
    pub fn new(config: &ServiceConfig, store: Arc<dyn ProductStore>) -> Self {
        Self {
            product_service: ProductService::new(store),
            metrics: Arc::new(ServiceMetrics::new()),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limits.clone())),
        }
    }

    /// 使用内存存储构建状态，按配置决定是否载入示例产品
    pub fn in_memory(config: &ServiceConfig) -> Self {
        let products = if config.catalog.seed_sample_data {
            sample_products()
        } else {
            Vec::new()
        };
        Self::new(
            config,
            Arc::new(InMemoryProductStore::with_products(products)),
        )
    }
}

impl FromRef<AppState> for Arc<ServiceMetrics> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.metrics)
    }
}

impl FromRef<AppState> for Arc<RateLimiter> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.rate_limiter)
    }
}
