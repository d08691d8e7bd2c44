use super::docket::{DocketRecord, PartitionId};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// 汇总行的日期哨兵值
pub const TOTAL_SENTINEL: &str = "TOTAL";

/// 单行对账状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Matched,
    #[serde(rename = "QRA")]
    Qra,
    Unmatched,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStatus::Matched => "Matched",
            MatchStatus::Qra => "QRA",
            MatchStatus::Unmatched => "Unmatched",
        })
    }
}

/// 对账结果行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub date: String,
    pub original_docket_number: String,
    pub supplier: String,
    pub po_number: String,
    pub ref_1: String,
    pub ref_2: String,
    pub matched_quantity: BigDecimal,
    pub unmatched_quantity: BigDecimal,
    pub qra: BigDecimal,
    /// 汇总行没有状态
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
}

impl MatchRow {
    /// 报告分区中的一行；不写 reference_number，避免报告被当作单据再次匹配
    pub fn to_record(&self) -> DocketRecord {
        let status = self.status.map(|s| s.to_string()).unwrap_or_default();
        DocketRecord::from_cells([
            ("date", self.date.clone()),
            ("original_docket_number", self.original_docket_number.clone()),
            ("supplier", self.supplier.clone()),
            ("po_number", self.po_number.clone()),
            ("ref_1", self.ref_1.clone()),
            ("ref_2", self.ref_2.clone()),
            ("matched_quantity", self.matched_quantity.to_string()),
            ("unmatched_quantity", self.unmatched_quantity.to_string()),
            ("qra", self.qra.to_string()),
            ("status", status),
        ])
    }
}

/// 对账报告：逐行结果 + 末尾汇总行
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub rows: Vec<MatchRow>,
    pub total_unmatched: BigDecimal,
}

impl MatchReport {
    pub fn new(rows: Vec<MatchRow>) -> Self {
        let total_unmatched = rows
            .iter()
            .fold(BigDecimal::zero(), |acc, r| acc + &r.unmatched_quantity);
        Self { rows, total_unmatched }
    }

    pub fn aggregate_row(&self) -> MatchRow {
        MatchRow {
            date: TOTAL_SENTINEL.to_string(),
            original_docket_number: String::new(),
            supplier: String::new(),
            po_number: String::new(),
            ref_1: String::new(),
            ref_2: String::new(),
            matched_quantity: BigDecimal::zero(),
            unmatched_quantity: self.total_unmatched.clone(),
            qra: BigDecimal::zero(),
            status: None,
        }
    }

    pub fn count(&self, status: MatchStatus) -> usize {
        self.rows.iter().filter(|r| r.status == Some(status)).count()
    }

    /// 落盘形式，汇总行在最后
    pub fn to_records(&self) -> Vec<DocketRecord> {
        self.rows
            .iter()
            .chain(std::iter::once(&self.aggregate_row()))
            .map(MatchRow::to_record)
            .collect()
    }
}

impl Serialize for MatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let aggregate = self.aggregate_row();
        serializer.collect_seq(self.rows.iter().chain(std::iter::once(&aggregate)))
    }
}

/// 供应商合并统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    pub updated_rows: usize,
    pub added_rows: usize,
    /// 推导不出单号的供应商行
    pub skipped_rows: usize,
    pub updated_partitions: Vec<PartitionId>,
    pub new_partition: Option<PartitionId>,
}

/// 检索命中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub partition_id: PartitionId,
    pub record: DocketRecord,
}
