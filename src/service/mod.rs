pub mod ingest;
pub mod matcher;
pub mod mutator;
pub mod normalize;
pub mod search;
pub mod supplier_merge;

pub use ingest::IngestService;
pub use matcher::{reconcile, MatchingEngine, Reconciliation};
pub use mutator::RowMutator;
pub use normalize::{normalize, normalize_key};
pub use search::SearchIndex;
pub use supplier_merge::SupplierMergeEngine;
