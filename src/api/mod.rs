pub mod handlers;

use crate::config::AppConfig;
use crate::db::RecordStore;
use crate::service::{IngestService, MatchingEngine, RowMutator, SearchIndex, SupplierMergeEngine};
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

pub use handlers::*;

/// 共享状态：所有服务共用同一个存储
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub matcher: Arc<MatchingEngine>,
    pub merger: Arc<SupplierMergeEngine>,
    pub search: Arc<SearchIndex>,
    pub mutator: Arc<RowMutator>,
    pub store_dir: PathBuf,
    pub supplier_dir: PathBuf,
    pub supplier_header_row: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self {
            ingest: Arc::new(IngestService::new(store.clone())),
            matcher: Arc::new(MatchingEngine::new(store.clone())),
            merger: Arc::new(SupplierMergeEngine::new(
                store.clone(),
                config.supplier.reference_columns.clone(),
            )),
            search: Arc::new(SearchIndex::new(store.clone())),
            mutator: Arc::new(RowMutator::new(store)),
            store_dir: config.store.dir.clone(),
            supplier_dir: config.supplier.dir.clone(),
            supplier_header_row: config.supplier.header_row,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/save-excel", post(save_excel))
        .route("/upload-supplier-excel", post(upload_supplier_excel))
        .route("/api/match/reconcile", post(reconcile))
        .route("/api/partitions", get(list_partitions))
        .route("/api/search", post(search))
        .route("/api/rows/add", post(add_row))
        .route("/api/rows/update", post(update_row))
        .route("/api/rows/delete", post(delete_row))
        .with_state(state)
}
