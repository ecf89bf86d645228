//! # 产品目录服务
//!
//! 基于 Axum 的产品 CRUD 微服务：
//! - 内存产品存储（可替换的 `ProductStore` 接口）
//! - 列表过滤、库存调整
//! - 按端点、按客户端地址的限流
//! - `/health` 与 Prometheus `/metrics`

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;
pub mod router;

pub use app::state::AppState;
pub use config::{load_config, ServiceConfig};
pub use router::build_router;
