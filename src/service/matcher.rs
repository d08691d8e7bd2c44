use super::normalize::{normalize, quantity_or_zero};
use crate::db::{RecordStore, Snapshot};
use crate::error::ReconResult;
use crate::models::{
    DocketRecord, MatchReport, MatchRow, MatchStatus, PartitionId, UploadedDocument,
};
use bigdecimal::{BigDecimal, Zero};
use rayon::prelude::*;
use std::sync::Arc;

/// 报告分区名前缀
pub const REPORT_LABEL: &str = "match_report";

/// 对账结果及其落盘分区
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub report: MatchReport,
    pub partition_id: PartitionId,
}

/// 对账服务：上传单据 vs 存储快照
pub struct MatchingEngine {
    store: Arc<dyn RecordStore>,
}

impl MatchingEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// 取一次快照完成全部对账，报告作为新分区追加
    pub fn run(&self, documents: &[UploadedDocument]) -> ReconResult<Reconciliation> {
        let snapshot = self.store.snapshot()?;
        tracing::info!(
            "开始对账: {} 张上传单据, 快照 {} 个分区 / {} 行",
            documents.len(),
            snapshot.partitions().len(),
            snapshot.record_count()
        );
        if snapshot.is_empty() {
            tracing::warn!("存储中没有任何分区, 全部单据将记为 Unmatched");
        }

        let report = reconcile(documents, &snapshot);
        let partition_id = self.store.append_partition(REPORT_LABEL, report.to_records())?;

        tracing::info!(
            "对账完成: Matched {}, QRA {}, Unmatched {}, 未匹配数量合计 {}, 报告分区 {}",
            report.count(MatchStatus::Matched),
            report.count(MatchStatus::Qra),
            report.count(MatchStatus::Unmatched),
            report.total_unmatched,
            partition_id
        );

        Ok(Reconciliation { report, partition_id })
    }
}

/// 逐张单据分类，输出顺序与输入一致
pub fn reconcile(documents: &[UploadedDocument], snapshot: &Snapshot) -> MatchReport {
    let rows: Vec<MatchRow> = documents
        .par_iter()
        .map(|doc| classify(doc, snapshot))
        .collect();
    MatchReport::new(rows)
}

/// 按分区顺序、行序找第一条单号相同的记录；空单号不参与匹配
fn first_match<'a>(snapshot: &'a Snapshot, key: &str) -> Option<&'a DocketRecord> {
    if key.is_empty() {
        return None;
    }
    snapshot
        .records()
        .map(|(_, record)| record)
        .find(|record| normalize(&record.reference_number) == key)
}

fn classify(doc: &UploadedDocument, snapshot: &Snapshot) -> MatchRow {
    let key = normalize(&doc.original_docket_number);
    let uploaded_qty = quantity_or_zero(&doc.quantity).abs();

    let mut row = MatchRow {
        date: String::new(),
        original_docket_number: doc.original_docket_number.clone(),
        supplier: doc.location.clone(),
        po_number: String::new(),
        ref_1: String::new(),
        ref_2: String::new(),
        matched_quantity: BigDecimal::zero(),
        unmatched_quantity: BigDecimal::zero(),
        qra: BigDecimal::zero(),
        status: None,
    };

    let Some(record) = first_match(snapshot, &key) else {
        tracing::debug!("单号 {} 未匹配", doc.original_docket_number);
        row.unmatched_quantity = uploaded_qty;
        row.status = Some(MatchStatus::Unmatched);
        return row;
    };

    row.date = record.date.clone();
    row.po_number = record.po_number.clone();
    row.ref_1 = record.ref_1.clone();
    row.ref_2 = record.ref_2.clone();

    let stored_qty = record.quantity_value();
    if uploaded_qty == stored_qty {
        row.matched_quantity = stored_qty;
        row.status = Some(MatchStatus::Matched);
    } else {
        row.qra = (&uploaded_qty - &stored_qty).abs();
        row.matched_quantity = uploaded_qty;
        row.status = Some(MatchStatus::Qra);
    }
    row
}
