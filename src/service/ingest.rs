use crate::db::RecordStore;
use crate::error::ReconResult;
use crate::models::{DocketRecord, PartitionId};
use std::sync::Arc;

/// 识别结果分区名前缀
pub const OCR_LABEL: &str = "ocr_structured";

/// 保存一批识别出的单据，作为新分区
pub struct IngestService {
    store: Arc<dyn RecordStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, records: Vec<DocketRecord>) -> ReconResult<PartitionId> {
        let rows = records.len();
        let id = self.store.append_partition(OCR_LABEL, records)?;
        tracing::info!("Saved {} OCR rows as {}", rows, id);
        Ok(id)
    }

    pub fn partitions(&self) -> ReconResult<Vec<PartitionId>> {
        self.store.list_partitions()
    }
}
