use product_service::{
    build_router, infrastructure::logger::Logger, load_config, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    Logger::init(&config.logging);

    let state = AppState::in_memory(&config);
    info!(
        "产品目录已就绪，共 {} 个产品",
        state.product_service.product_count()?
    );

    let app = build_router(state, &config);

    let address = config.listen_address();
    let listener = TcpListener::bind(&address).await?;

    info!("🚀 产品服务运行在 http://{}", address);
    info!("📖 API 端点:");
    info!("   GET    /health              - 健康检查");
    info!("   GET    /metrics             - Prometheus 指标");
    info!("   GET    /products            - 产品列表 (category, min_price, max_price)");
    info!("   POST   /products            - 创建产品");
    info!("   GET    /products/:id        - 获取产品");
    info!("   PUT    /products/:id        - 更新产品");
    info!("   DELETE /products/:id        - 删除产品");
    info!("   PATCH  /products/:id/stock  - 调整库存");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("产品服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("收到退出信号，正在关闭...");
    }
}
