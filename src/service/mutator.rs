use super::normalize::{loosely_equal, uppercase_trim};
use crate::db::RecordStore;
use crate::error::{ReconError, ReconResult};
use crate::models::{DocketRecord, PartitionId};
use indexmap::IndexMap;
use std::sync::Arc;

/// 单分区的行级增删改，只作用于指定分区
pub struct RowMutator {
    store: Arc<dyn RecordStore>,
}

impl RowMutator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// 更新分区内第一条单号相同 (忽略大小写与首尾空白) 的记录，给出的列全部覆盖
    pub fn update_row(
        &self,
        partition_id: &PartitionId,
        reference_number: &str,
        updates: &IndexMap<String, String>,
    ) -> ReconResult<()> {
        let wanted = uppercase_trim(reference_number);
        self.store.modify_partition(partition_id, &mut |records| {
            let record = records
                .iter_mut()
                .find(|r| uppercase_trim(&r.reference_number) == wanted)
                .ok_or_else(|| {
                    ReconError::not_found(format!(
                        "reference {} in partition {}",
                        reference_number, partition_id
                    ))
                })?;
            for (column, value) in updates {
                record.set(column, value.clone());
            }
            Ok(true)
        })?;

        tracing::info!("Updated row {} in {}", reference_number, partition_id);
        Ok(())
    }

    pub fn add_row(&self, partition_id: &PartitionId, record: DocketRecord) -> ReconResult<()> {
        let reference = record.reference_number.clone();
        let mut pending = Some(record);
        self.store.modify_partition(partition_id, &mut |records| {
            records.extend(pending.take());
            Ok(true)
        })?;

        tracing::info!("Added row {} to {}", reference, partition_id);
        Ok(())
    }

    /// 删除分区内所有单号宽松相等的记录，返回删除条数
    pub fn delete_row(
        &self,
        partition_id: &PartitionId,
        reference_number: &str,
    ) -> ReconResult<usize> {
        let mut removed = 0;
        self.store.modify_partition(partition_id, &mut |records| {
            let before = records.len();
            records.retain(|r| !loosely_equal(&r.reference_number, reference_number));
            removed = before - records.len();
            if removed == 0 {
                return Err(ReconError::not_found(format!(
                    "reference {} in partition {}",
                    reference_number, partition_id
                )));
            }
            Ok(true)
        })?;

        tracing::info!("Deleted {} row(s) {} from {}", removed, reference_number, partition_id);
        Ok(removed)
    }
}
