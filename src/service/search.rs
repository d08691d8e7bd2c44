use crate::db::RecordStore;
use crate::error::ReconResult;
use crate::models::SearchHit;
use std::collections::HashSet;
use std::sync::Arc;

/// 按原始单号精确检索
///
/// 不做规范化：调用方需要传入与存储中完全一致的单号文本。
pub struct SearchIndex {
    store: Arc<dyn RecordStore>,
}

impl SearchIndex {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn search(&self, queries: &[String]) -> ReconResult<Vec<SearchHit>> {
        let wanted: HashSet<&str> = queries.iter().map(String::as_str).collect();
        let snapshot = self.store.snapshot()?;

        let hits: Vec<SearchHit> = snapshot
            .records()
            .filter(|(_, record)| wanted.contains(record.reference_number.as_str()))
            .map(|(id, record)| SearchHit {
                partition_id: id.clone(),
                record: record.clone(),
            })
            .collect();

        tracing::debug!("检索 {} 个单号, 命中 {} 条", wanted.len(), hits.len());
        Ok(hits)
    }
}
