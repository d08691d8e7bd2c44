use super::AppState;
use crate::db::load_supplier_sheet;
use crate::error::{ReconError, ReconResult};
use crate::models::cell::CellText;
use crate::models::{
    DocketRecord, MatchReport, MergeReport, PartitionId, SearchHit, SupplierRow, UploadedDocument,
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 失败响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for ReconError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReconError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ReconError::NotFound(_) => StatusCode::NOT_FOUND,
            ReconError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let response = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(response)).into_response()
    }
}

/// 请求体解析失败一律按 InvalidInput 返回
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ReconResult<T> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| ReconError::invalid(rejection.body_text()))
}

/// 要求是数组；元素按目标类型宽松解析
fn rows_from<T: DeserializeOwned>(
    value: Option<serde_json::Value>,
    what: &str,
) -> ReconResult<Vec<T>> {
    match value {
        Some(value @ serde_json::Value::Array(_)) => serde_json::from_value(value)
            .map_err(|e| ReconError::invalid(format!("malformed {}: {}", what, e))),
        _ => Err(ReconError::invalid("No data provided")),
    }
}

/// 存储操作是同步的，放到阻塞线程池执行
async fn blocking<T, F>(task: F) -> ReconResult<T>
where
    F: FnOnce() -> ReconResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ReconError::store(format!("worker task failed: {}", e)))?
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub results: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub folder: String,
    pub file: String,
    pub partition_id: PartitionId,
}

/// 保存识别结果为新分区
pub async fn save_excel(
    State(state): State<AppState>,
    payload: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>, ReconError> {
    let req = body(payload)?;
    let records: Vec<DocketRecord> = rows_from(req.results, "results")?;

    let ingest = state.ingest.clone();
    let partition_id = blocking(move || ingest.save(records)).await?;

    Ok(Json(SaveResponse {
        success: true,
        message: "Excel saved successfully".to_string(),
        folder: state.store_dir.display().to_string(),
        file: format!("{}.csv", partition_id),
        partition_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub documents: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub success: bool,
    pub message: String,
    pub partition_id: PartitionId,
    pub report: MatchReport,
}

/// 上传单据对账
pub async fn reconcile(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Json<ReconcileResponse>, ReconError> {
    let req = body(payload)?;
    let documents: Vec<UploadedDocument> = rows_from(req.documents, "documents")?;

    let matcher = state.matcher.clone();
    let result = blocking(move || matcher.run(&documents)).await?;

    Ok(Json(ReconcileResponse {
        success: true,
        message: format!("Reconciled {} documents", result.report.rows.len()),
        partition_id: result.partition_id,
        report: result.report,
    }))
}

/// `data` 与 `path` 二选一，`data` 优先；`path` 相对于供应商目录
#[derive(Debug, Deserialize)]
pub struct SupplierUploadRequest {
    #[serde(default)]
    pub data: Vec<SupplierRow>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SupplierUploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: MergeReport,
}

/// 供应商清单合并
pub async fn upload_supplier_excel(
    State(state): State<AppState>,
    payload: Result<Json<SupplierUploadRequest>, JsonRejection>,
) -> Result<Json<SupplierUploadResponse>, ReconError> {
    let req = body(payload)?;
    if req.data.is_empty() && req.path.is_none() {
        return Err(ReconError::invalid("No data rows and no source location provided"));
    }

    let merger = state.merger.clone();
    let header_row = state.supplier_header_row;
    let supplier_dir = state.supplier_dir.clone();
    let report = blocking(move || {
        let rows = match (req.data, req.path) {
            (data, Some(path)) if data.is_empty() => {
                load_supplier_sheet(&supplier_dir, &path, header_row)?
            }
            (data, _) => data,
        };
        merger.merge(&rows)
    })
    .await?;

    Ok(Json(SupplierUploadResponse {
        success: true,
        message: format!(
            "Added: {}, Updated: {}",
            report.added_rows, report.updated_rows
        ),
        report,
    }))
}

#[derive(Debug, Serialize)]
pub struct PartitionsResponse {
    pub success: bool,
    pub partitions: Vec<PartitionId>,
}

pub async fn list_partitions(
    State(state): State<AppState>,
) -> Result<Json<PartitionsResponse>, ReconError> {
    let ingest = state.ingest.clone();
    let partitions = blocking(move || ingest.partitions()).await?;
    Ok(Json(PartitionsResponse {
        success: true,
        partitions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub references: Vec<CellText>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<SearchHit>,
}

/// 按原始单号检索
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ReconError> {
    let req = body(payload)?;
    let queries: Vec<String> = req.references.into_iter().map(String::from).collect();

    let index = state.search.clone();
    let results = blocking(move || index.search(&queries)).await?;

    Ok(Json(SearchResponse {
        success: true,
        message: format!("Found {} rows", results.len()),
        results,
    }))
}

#[derive(Debug, Serialize)]
pub struct RowResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AddRowRequest {
    pub partition_id: PartitionId,
    pub record: DocketRecord,
}

pub async fn add_row(
    State(state): State<AppState>,
    payload: Result<Json<AddRowRequest>, JsonRejection>,
) -> Result<Json<RowResponse>, ReconError> {
    let req = body(payload)?;
    let message = format!("Row added to {}", req.partition_id);

    let mutator = state.mutator.clone();
    blocking(move || mutator.add_row(&req.partition_id, req.record)).await?;

    Ok(Json(RowResponse {
        success: true,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRowRequest {
    pub partition_id: PartitionId,
    pub reference_number: CellText,
    #[serde(default)]
    pub fields: IndexMap<String, CellText>,
}

pub async fn update_row(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRowRequest>, JsonRejection>,
) -> Result<Json<RowResponse>, ReconError> {
    let req = body(payload)?;
    let reference = String::from(req.reference_number);
    let fields: IndexMap<String, String> = req
        .fields
        .into_iter()
        .map(|(k, v)| (k, String::from(v)))
        .collect();
    let message = format!("Row {} updated", reference);

    let mutator = state.mutator.clone();
    blocking(move || mutator.update_row(&req.partition_id, &reference, &fields)).await?;

    Ok(Json(RowResponse {
        success: true,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRowRequest {
    pub partition_id: PartitionId,
    pub reference_number: CellText,
}

pub async fn delete_row(
    State(state): State<AppState>,
    payload: Result<Json<DeleteRowRequest>, JsonRejection>,
) -> Result<Json<RowResponse>, ReconError> {
    let req = body(payload)?;
    let reference = String::from(req.reference_number);

    let mutator = state.mutator.clone();
    let target = reference.clone();
    let removed = blocking(move || mutator.delete_row(&req.partition_id, &target)).await?;

    Ok(Json(RowResponse {
        success: true,
        message: format!("Deleted {} row(s) for {}", removed, reference),
    }))
}
