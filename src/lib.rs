pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{CsvDirSink, CsvStore, MemoryStore, RecordStore};
pub use error::{ReconError, ReconResult};
pub use service::{IngestService, MatchingEngine, RowMutator, SearchIndex, SupplierMergeEngine};
