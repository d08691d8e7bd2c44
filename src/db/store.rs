use crate::error::ReconResult;
use crate::models::{DocketRecord, PartitionId};
use std::sync::Arc;

/// 分区内容；快照与存储共享同一份，替换时整体换掉
pub type PartitionRecords = Arc<Vec<DocketRecord>>;

/// 时点快照，后续写入不会影响已取得的快照
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    partitions: Vec<(PartitionId, PartitionRecords)>,
}

impl Snapshot {
    pub fn new(partitions: Vec<(PartitionId, PartitionRecords)>) -> Self {
        Self { partitions }
    }

    pub fn partitions(&self) -> &[(PartitionId, PartitionRecords)] {
        &self.partitions
    }

    /// 按分区顺序、分区内行序遍历
    pub fn records(&self) -> impl Iterator<Item = (&PartitionId, &DocketRecord)> {
        self.partitions
            .iter()
            .flat_map(|(id, records)| records.iter().map(move |r| (id, r)))
    }

    pub fn record_count(&self) -> usize {
        self.partitions.iter().map(|(_, r)| r.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// 分区式平面记录存储
///
/// 写操作对单个分区原子：同一分区的 读-改-写 持有该分区的排他锁。
/// 失败时已发布的分区内容保持不变；跨分区没有事务。
pub trait RecordStore: Send + Sync {
    fn list_partitions(&self) -> ReconResult<Vec<PartitionId>>;

    fn snapshot(&self) -> ReconResult<Snapshot>;

    fn read_partition(&self, id: &PartitionId) -> ReconResult<PartitionRecords>;

    fn replace_partition(&self, id: &PartitionId, records: Vec<DocketRecord>) -> ReconResult<()>;

    /// `label` 只用于生成分区名
    fn append_partition(&self, label: &str, records: Vec<DocketRecord>) -> ReconResult<PartitionId>;

    /// 在分区写锁内执行 `edit`；返回 `Ok(true)` 时落盘并发布，返回错误时什么都不写
    fn modify_partition(
        &self,
        id: &PartitionId,
        edit: &mut dyn FnMut(&mut Vec<DocketRecord>) -> ReconResult<bool>,
    ) -> ReconResult<bool>;
}
