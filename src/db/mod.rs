pub mod csv_files;
pub mod partition_store;
pub mod store;
pub mod supplier_sheet;

pub use csv_files::CsvDirSink;
pub use partition_store::{MemorySink, MemoryStore, PartitionSink, PartitionStore};
pub use store::{PartitionRecords, RecordStore, Snapshot};
pub use supplier_sheet::load_supplier_sheet;

/// 落盘到 CSV 目录的分区存储
pub type CsvStore = PartitionStore<CsvDirSink>;
