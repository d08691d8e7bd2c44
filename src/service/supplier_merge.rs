use super::normalize::{normalize, normalize_key};
use crate::db::RecordStore;
use crate::error::{ReconError, ReconResult};
use crate::models::docket::REFERENCE_NUMBER;
use crate::models::supplier::field_for_key;
use crate::models::{DocketRecord, MergeReport, SupplierRow};
use indexmap::IndexMap;
use std::sync::Arc;

/// 新增供应商行所在分区的名前缀
pub const SUPPLIER_LABEL: &str = "supplier_rows";

/// 表头规范化后的供应商行
#[derive(Debug, Clone)]
struct PreparedRow {
    reference: String,
    cells: IndexMap<String, String>,
}

/// 供应商清单合并：命中的记录全部覆盖更新，未命中的追加为一个新分区
///
/// 与对账不同，这里同一单号的所有记录 (跨所有分区) 都会被更新。
pub struct SupplierMergeEngine {
    store: Arc<dyn RecordStore>,
    reference_columns: Vec<String>,
}

impl SupplierMergeEngine {
    /// `reference_columns` 为规范化后的别名列，按顺序取第一个非空值
    pub fn new(store: Arc<dyn RecordStore>, reference_columns: Vec<String>) -> Self {
        let reference_columns = reference_columns
            .iter()
            .map(|c| normalize_key(c))
            .collect();
        Self {
            store,
            reference_columns,
        }
    }

    pub fn merge(&self, rows: &[SupplierRow]) -> ReconResult<MergeReport> {
        if rows.is_empty() {
            return Err(ReconError::invalid("No data to upload"));
        }

        let prepared: Vec<PreparedRow> = rows.iter().map(|r| self.prepare(r)).collect();
        let mut matched = vec![false; prepared.len()];
        let mut report = MergeReport::default();

        let partitions = self.store.list_partitions()?;
        tracing::info!(
            "开始合并供应商清单: {} 行, {} 个分区",
            prepared.len(),
            partitions.len()
        );

        for id in partitions {
            let mut updated_here = 0usize;
            let mut edit = |records: &mut Vec<DocketRecord>| -> ReconResult<bool> {
                let keys: Vec<String> = records
                    .iter()
                    .map(|r| normalize(&r.reference_number))
                    .collect();
                for (idx, row) in prepared.iter().enumerate() {
                    if row.reference.is_empty() {
                        continue;
                    }
                    for (record, key) in records.iter_mut().zip(&keys) {
                        if *key == row.reference {
                            self.overlay(record, row);
                            matched[idx] = true;
                            updated_here += 1;
                        }
                    }
                }
                Ok(updated_here > 0)
            };

            if let Err(e) = self.store.modify_partition(&id, &mut edit) {
                tracing::error!("合并中断于分区 {}: {}", id, e);
                return Err(e);
            }
            if updated_here > 0 {
                tracing::debug!("分区 {} 更新 {} 行", id, updated_here);
                report.updated_rows += updated_here;
                report.updated_partitions.push(id);
            }
        }

        let mut fresh = Vec::new();
        for (row, hit) in prepared.iter().zip(&matched) {
            if row.reference.is_empty() {
                report.skipped_rows += 1;
                continue;
            }
            if !hit {
                fresh.push(self.to_record(row));
            }
        }
        if report.skipped_rows > 0 {
            tracing::warn!("{} 行供应商数据没有单号, 已跳过", report.skipped_rows);
        }

        if !fresh.is_empty() {
            report.added_rows = fresh.len();
            report.new_partition = Some(self.store.append_partition(SUPPLIER_LABEL, fresh)?);
        }

        tracing::info!(
            "供应商合并完成: updated {}, added {}, 涉及分区 {}",
            report.updated_rows,
            report.added_rows,
            report.updated_partitions.len()
        );
        Ok(report)
    }

    fn prepare(&self, row: &SupplierRow) -> PreparedRow {
        let mut cells: IndexMap<String, String> = IndexMap::new();
        for (label, value) in &row.cells {
            let key = normalize_key(label);
            // 重复表头保留第一个非空值
            let keep_existing = cells.get(&key).is_some_and(|v| !v.trim().is_empty());
            if !keep_existing {
                cells.insert(key, value.clone());
            }
        }

        let raw_reference = self
            .reference_columns
            .iter()
            .filter_map(|c| cells.get(c))
            .find(|v| !v.trim().is_empty())
            .map(String::as_str)
            .unwrap_or_default();

        PreparedRow {
            reference: normalize(raw_reference),
            cells,
        }
    }

    fn is_reference_column(&self, key: &str) -> bool {
        self.reference_columns.iter().any(|c| c == key)
    }

    /// 只覆盖供应商给出非空值的列，单号列不动
    fn overlay(&self, record: &mut DocketRecord, row: &PreparedRow) {
        for (key, value) in &row.cells {
            if value.trim().is_empty() || self.is_reference_column(key) {
                continue;
            }
            match field_for_key(key) {
                Some(REFERENCE_NUMBER) => {}
                Some(field) => record.set(field, value.clone()),
                None => record.set(key, value.clone()),
            }
        }
    }

    fn to_record(&self, row: &PreparedRow) -> DocketRecord {
        let mut record = DocketRecord::default();
        self.overlay(&mut record, row);
        record.reference_number = row.reference.clone();
        record
    }
}
