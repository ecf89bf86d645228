//! 路由表与中间件栈

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::{
    health::{health_check, metrics},
    product::handler::{
        adjust_stock, create_product, delete_product, get_product, list_products, update_product,
    },
    state::AppState,
};
use crate::config::ServiceConfig;
use crate::core::{
    middleware::{handle_panic, not_found_fallback, request_logging_middleware},
    rate_limit::rate_limiting_middleware,
};

pub fn build_router(state: AppState, config: &ServiceConfig) -> Router {
    // 只有产品端点受限流保护
    let products = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/stock", patch(adjust_stock))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limiting_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .merge(products)
        .fallback(not_found_fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.http.timeout_seconds,
        )))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
