use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use docket_recon::api::{self, AppState};
use docket_recon::{AppConfig, CsvDirSink, CsvStore, RecordStore};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 打开分区目录
    let dir = config.store.dir.clone();
    let store = tokio::task::spawn_blocking(move || CsvStore::open(CsvDirSink::new(dir)?)).await??;
    info!("Record store opened at {}", store.sink().dir().display());
    let store: Arc<dyn RecordStore> = Arc::new(store);

    // 供应商清单目录
    std::fs::create_dir_all(&config.supplier.dir)?;
    info!("Supplier sheets are read from {}", config.supplier.dir.display());

    let cors = CorsLayer::new()
        .allow_origin(config.server.cors_origin.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = api::router(AppState::new(store, &config)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(config.server.body_limit_mb * 1024 * 1024)),
    );

    // 启动服务器
    let addr = config.bind_addr();
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /save-excel              - save OCR rows as a partition");
    info!("  POST /api/match/reconcile     - reconcile uploaded dockets");
    info!("  POST /upload-supplier-excel   - merge supplier manifest");
    info!("  POST /api/search              - exact reference lookup");
    info!("  POST /api/rows/{{add,update,delete}}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
