pub mod cell;
pub mod docket;
pub mod result;
pub mod supplier;
pub mod upload;

pub use docket::{DocketRecord, PartitionId, KNOWN_FIELDS};
pub use result::{MatchReport, MatchRow, MatchStatus, MergeReport, SearchHit, TOTAL_SENTINEL};
pub use supplier::SupplierRow;
pub use upload::UploadedDocument;
