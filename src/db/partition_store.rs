use super::store::{PartitionRecords, RecordStore, Snapshot};
use crate::error::{ReconError, ReconResult};
use crate::models::{DocketRecord, PartitionId};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// 分区落盘介质
pub trait PartitionSink: Send + Sync {
    /// 启动时读取已有分区，返回顺序即枚举顺序
    fn load(&self) -> ReconResult<Vec<(PartitionId, Vec<DocketRecord>)>>;

    fn write(&self, id: &PartitionId, records: &[DocketRecord]) -> ReconResult<()>;
}

/// 不落盘，测试和临时运行使用
#[derive(Debug, Clone, Copy, Default)]
pub struct MemorySink;

impl PartitionSink for MemorySink {
    fn load(&self) -> ReconResult<Vec<(PartitionId, Vec<DocketRecord>)>> {
        Ok(Vec::new())
    }

    fn write(&self, _id: &PartitionId, _records: &[DocketRecord]) -> ReconResult<()> {
        Ok(())
    }
}

type Slot = Arc<RwLock<PartitionRecords>>;

fn poisoned<T>(_: PoisonError<T>) -> ReconError {
    ReconError::store("partition lock poisoned")
}

/// 分区存储：有序分区表 + 每分区读写锁
///
/// 分区内容以 `Arc` 发布，写入时复制后整体替换，快照因此不受后续写入影响。
pub struct PartitionStore<S: PartitionSink> {
    sink: S,
    order: RwLock<Vec<PartitionId>>,
    slots: DashMap<PartitionId, Slot>,
    next_seq: AtomicU64,
}

pub type MemoryStore = PartitionStore<MemorySink>;

impl MemoryStore {
    pub fn new() -> Self {
        Self::empty(MemorySink)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PartitionSink> PartitionStore<S> {
    fn empty(sink: S) -> Self {
        Self {
            sink,
            order: RwLock::new(Vec::new()),
            slots: DashMap::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// 打开存储并载入介质中已有的分区
    pub fn open(sink: S) -> ReconResult<Self> {
        let loaded = sink.load()?;
        let store = Self::empty(sink);

        let mut max_seq = 0;
        let mut total_rows = 0;
        {
            let mut order = store.order.write().map_err(poisoned)?;
            for (id, records) in loaded {
                max_seq = max_seq.max(id.sequence().unwrap_or(0));
                total_rows += records.len();
                store
                    .slots
                    .insert(id.clone(), Arc::new(RwLock::new(Arc::new(records))));
                order.push(id);
            }
            tracing::info!("Loaded {} partitions, {} rows", order.len(), total_rows);
        }
        store.next_seq.store(max_seq + 1, Ordering::SeqCst);

        Ok(store)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn slot(&self, id: &PartitionId) -> ReconResult<Slot> {
        self.slots
            .get(id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| ReconError::not_found(format!("partition {}", id)))
    }

    fn next_id(&self, label: &str) -> PartitionId {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        PartitionId::generate(seq, label, Utc::now())
    }
}

impl<S: PartitionSink> RecordStore for PartitionStore<S> {
    fn list_partitions(&self) -> ReconResult<Vec<PartitionId>> {
        Ok(self.order.read().map_err(poisoned)?.clone())
    }

    fn snapshot(&self) -> ReconResult<Snapshot> {
        let order = self.order.read().map_err(poisoned)?;
        let mut partitions = Vec::with_capacity(order.len());
        for id in order.iter() {
            let slot = self.slot(id)?;
            let records = Arc::clone(&*slot.read().map_err(poisoned)?);
            partitions.push((id.clone(), records));
        }
        Ok(Snapshot::new(partitions))
    }

    fn read_partition(&self, id: &PartitionId) -> ReconResult<PartitionRecords> {
        let slot = self.slot(id)?;
        let records = Arc::clone(&*slot.read().map_err(poisoned)?);
        Ok(records)
    }

    fn replace_partition(&self, id: &PartitionId, records: Vec<DocketRecord>) -> ReconResult<()> {
        let slot = self.slot(id)?;
        let mut current = slot.write().map_err(poisoned)?;
        self.sink.write(id, &records)?;
        *current = Arc::new(records);
        tracing::debug!("Replaced partition {}", id);
        Ok(())
    }

    fn append_partition(
        &self,
        label: &str,
        records: Vec<DocketRecord>,
    ) -> ReconResult<PartitionId> {
        let mut order = self.order.write().map_err(poisoned)?;
        let id = self.next_id(label);
        self.sink.write(&id, &records)?;

        let rows = records.len();
        self.slots
            .insert(id.clone(), Arc::new(RwLock::new(Arc::new(records))));
        order.push(id.clone());

        tracing::info!("Appended partition {} ({} rows)", id, rows);
        Ok(id)
    }

    fn modify_partition(
        &self,
        id: &PartitionId,
        edit: &mut dyn FnMut(&mut Vec<DocketRecord>) -> ReconResult<bool>,
    ) -> ReconResult<bool> {
        let slot = self.slot(id)?;
        let mut current = slot.write().map_err(poisoned)?;

        let mut working: Vec<DocketRecord> = (**current).clone();
        if !edit(&mut working)? {
            return Ok(false);
        }

        self.sink.write(id, &working)?;
        *current = Arc::new(working);
        tracing::debug!("Rewrote partition {}", id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    /// 按开关决定写入是否失败
    #[derive(Default)]
    struct FlakySink {
        fail: AtomicBool,
    }

    impl PartitionSink for FlakySink {
        fn load(&self) -> ReconResult<Vec<(PartitionId, Vec<DocketRecord>)>> {
            Ok(vec![
                (
                    PartitionId::from("000007_ocr_structured_x"),
                    vec![DocketRecord::new("A1", "1")],
                ),
                (PartitionId::from("legacy"), Vec::new()),
            ])
        }

        fn write(&self, _id: &PartitionId, _records: &[DocketRecord]) -> ReconResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(ReconError::store("disk full"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn append_keeps_order() {
        let store = MemoryStore::new();
        let a = store
            .append_partition("ocr_structured", vec![DocketRecord::new("A", "1")])
            .unwrap();
        let b = store.append_partition("ocr_structured", Vec::new()).unwrap();

        assert_eq!(store.list_partitions().unwrap(), vec![a.clone(), b]);
        assert_eq!(a.sequence(), Some(1));
        assert_eq!(store.snapshot().unwrap().record_count(), 1);
    }

    #[test]
    fn snapshot_unaffected_by_later_replace() {
        let store = MemoryStore::new();
        let id = store
            .append_partition("ocr_structured", vec![DocketRecord::new("A", "1")])
            .unwrap();

        let before = store.snapshot().unwrap();
        store.replace_partition(&id, vec![DocketRecord::new("B", "2")]).unwrap();

        let (_, old) = &before.partitions()[0];
        assert_eq!(old[0].reference_number, "A");
        assert_eq!(store.read_partition(&id).unwrap()[0].reference_number, "B");
    }

    #[test]
    fn open_continues_sequence() {
        let store = PartitionStore::open(FlakySink::default()).unwrap();
        let id = store.append_partition("match_report", Vec::new()).unwrap();

        assert_eq!(id.sequence(), Some(8));
        assert_eq!(store.list_partitions().unwrap().len(), 3);
    }

    #[test]
    fn failed_write_publishes_nothing() {
        let store = PartitionStore::open(FlakySink::default()).unwrap();
        let id = PartitionId::from("000007_ocr_structured_x");
        store.sink().fail.store(true, Ordering::SeqCst);

        let err = store
            .modify_partition(&id, &mut |records| {
                records.clear();
                Ok(true)
            })
            .unwrap_err();
        assert!(matches!(err, ReconError::Store(_)));
        assert_eq!(store.read_partition(&id).unwrap().len(), 1);

        assert!(store.append_partition("supplier_rows", Vec::new()).is_err());
        assert_eq!(store.list_partitions().unwrap().len(), 2);
    }

    #[test]
    fn clean_edit_skips_write() {
        let store = PartitionStore::open(FlakySink::default()).unwrap();
        store.sink().fail.store(true, Ordering::SeqCst);

        let changed = store
            .modify_partition(&PartitionId::from("legacy"), &mut |_| Ok(false))
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn missing_partition_is_not_found() {
        let store = MemoryStore::new();
        let err = store.read_partition(&PartitionId::from("nope")).unwrap_err();
        assert!(matches!(err, ReconError::NotFound(_)));
    }
}
