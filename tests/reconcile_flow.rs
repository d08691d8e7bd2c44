use std::sync::{Arc, Barrier};
use std::thread;

use bigdecimal::{BigDecimal, Zero};
use docket_recon::models::{DocketRecord, MatchStatus, PartitionId, SupplierRow, UploadedDocument};
use docket_recon::{
    CsvDirSink, CsvStore, IngestService, MatchingEngine, MemoryStore, RecordStore, RowMutator,
    SearchIndex, SupplierMergeEngine,
};
use indexmap::IndexMap;
use tempfile::TempDir;

fn open(dir: &TempDir) -> Arc<CsvStore> {
    let sink = CsvDirSink::new(dir.path().join("saved_excels")).unwrap();
    Arc::new(CsvStore::open(sink).unwrap())
}

fn reference_columns() -> Vec<String> {
    vec!["DOCKET_NUMBER".to_string(), "REFERENCE_NUMBER".to_string()]
}

fn supplier(cells: &[(&str, &str)]) -> SupplierRow {
    SupplierRow::from_cells(cells.iter().map(|(k, v)| (*k, *v)))
}

// -------------------------------------------------------------------------
// Reconciliation
// -------------------------------------------------------------------------

#[test]
fn matched_qra_and_unmatched_in_one_batch() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    IngestService::new(store.clone())
        .save(vec![DocketRecord::new("A001", "10")])
        .unwrap();
    let engine = MatchingEngine::new(store.clone());

    let result = engine
        .run(&[
            UploadedDocument::new("A-001", "10"),
            UploadedDocument::new("a 001", "8"),
            UploadedDocument::new("Q-77", "8"),
        ])
        .unwrap();

    let rows = &result.report.rows;
    assert_eq!(rows[0].status, Some(MatchStatus::Matched));
    assert_eq!(rows[0].matched_quantity, BigDecimal::from(10));
    assert_eq!(rows[1].status, Some(MatchStatus::Qra));
    assert_eq!(rows[1].qra, BigDecimal::from(2));
    assert_eq!(rows[1].unmatched_quantity, BigDecimal::zero());
    assert_eq!(rows[2].status, Some(MatchStatus::Unmatched));
    assert_eq!(result.report.total_unmatched, BigDecimal::from(8));
}

#[test]
fn report_is_an_audit_partition_that_survives_restart() {
    let dir = TempDir::new().unwrap();
    let partition_id = {
        let store = open(&dir);
        MatchingEngine::new(store)
            .run(&[UploadedDocument::new("A-001", "8")])
            .unwrap()
            .partition_id
    };

    let reopened = open(&dir);
    assert_eq!(reopened.list_partitions().unwrap(), vec![partition_id.clone()]);
    let rows = reopened.read_partition(&partition_id).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("status"), Some("Unmatched"));
    assert_eq!(rows[0].get("unmatched_quantity"), Some("8"));
    assert_eq!(rows[1].get("date"), Some("TOTAL"));
    assert_eq!(rows[1].get("unmatched_quantity"), Some("8"));

    // 报告行没有 reference_number，不会被后续对账匹配到
    let again = MatchingEngine::new(reopened)
        .run(&[UploadedDocument::new("A-001", "8")])
        .unwrap();
    assert_eq!(again.report.rows[0].status, Some(MatchStatus::Unmatched));
}

#[test]
fn snapshot_isolated_from_concurrent_merge() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    store
        .append_partition("ocr_structured", vec![DocketRecord::new("M1", "5")])
        .unwrap();

    let snapshot = store.snapshot().unwrap();
    SupplierMergeEngine::new(store.clone(), reference_columns())
        .merge(&[supplier(&[("Docket Number", "M1"), ("Quantity", "9")])])
        .unwrap();

    let report = docket_recon::service::reconcile(&[UploadedDocument::new("M1", "5")], &snapshot);
    assert_eq!(report.rows[0].status, Some(MatchStatus::Matched));
}

// -------------------------------------------------------------------------
// Supplier merge
// -------------------------------------------------------------------------

#[test]
fn supplier_merge_updates_and_appends() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let ingest = IngestService::new(store.clone());
    let first = ingest.save(vec![DocketRecord::new("B002", "1")]).unwrap();
    let second = ingest
        .save(vec![DocketRecord::new("X5", "1"), DocketRecord::new("B-002", "1")])
        .unwrap();

    let report = SupplierMergeEngine::new(store.clone(), reference_columns())
        .merge(&[
            supplier(&[("Docket Number", "B002"), ("Ref 1", "R-1")]),
            supplier(&[("Docket Number", ""), ("Reference  Number", "Z999"), ("Qty", "3")]),
        ])
        .unwrap();

    assert_eq!(report.updated_rows, 2);
    assert_eq!(report.updated_partitions, vec![first.clone(), second.clone()]);
    assert_eq!(report.added_rows, 1);
    let new_partition = report.new_partition.clone().unwrap();

    let reopened = open(&dir);
    assert_eq!(
        reopened.list_partitions().unwrap(),
        vec![first.clone(), second, new_partition.clone()]
    );
    assert_eq!(reopened.read_partition(&first).unwrap()[0].ref_1, "R-1");
    let added = reopened.read_partition(&new_partition).unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].reference_number, "Z999");
    assert_eq!(added[0].quantity, "3");
}

#[test]
fn merge_never_deletes() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let id = store
        .append_partition(
            "ocr_structured",
            vec![DocketRecord::new("K1", "1"), DocketRecord::new("K2", "1")],
        )
        .unwrap();

    SupplierMergeEngine::new(store.clone(), reference_columns())
        .merge(&[supplier(&[("Docket Number", "K2"), ("Date", "")])])
        .unwrap();

    assert_eq!(store.read_partition(&id).unwrap().len(), 2);
}

// -------------------------------------------------------------------------
// Point lookups and mutations
// -------------------------------------------------------------------------

#[test]
fn row_operations_stay_inside_their_partition() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let a = store
        .append_partition("ocr_structured", vec![DocketRecord::new("D1", "1")])
        .unwrap();
    let b = store
        .append_partition("ocr_structured", vec![DocketRecord::new("D1", "2")])
        .unwrap();
    let mutator = RowMutator::new(store.clone());

    mutator.delete_row(&a, "D1").unwrap();
    assert!(mutator.delete_row(&a, "D1").is_err());

    let hits = SearchIndex::new(store.clone()).search(&["D1".to_string()]).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].partition_id, b);
}

#[test]
fn added_row_is_searchable_after_restart() {
    let dir = TempDir::new().unwrap();
    let mut record = DocketRecord::new("421 0797455", "6");
    record.date = "2026-10-14".to_string();
    record.set("company", "Northern Plant Hire Company");

    let id: PartitionId = {
        let store = open(&dir);
        let id = store.append_partition("ocr_structured", Vec::new()).unwrap();
        RowMutator::new(store).add_row(&id, record.clone()).unwrap();
        id
    };

    let hits = SearchIndex::new(open(&dir))
        .search(&["421 0797455".to_string()])
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].partition_id, id);
    assert_eq!(hits[0].record, record);
}

// -------------------------------------------------------------------------
// Concurrent writers
// -------------------------------------------------------------------------

#[test]
fn concurrent_adds_to_one_partition_are_all_kept() {
    const WRITERS: usize = 16;
    let store = Arc::new(MemoryStore::new());
    let id = store.append_partition("ocr_structured", Vec::new()).unwrap();
    let mutator = RowMutator::new(store.clone());
    let start = Barrier::new(WRITERS);

    thread::scope(|scope| {
        for n in 0..WRITERS {
            let (mutator, id, start) = (&mutator, &id, &start);
            scope.spawn(move || {
                start.wait();
                mutator
                    .add_row(id, DocketRecord::new(format!("T{n}"), "1"))
                    .unwrap();
            });
        }
    });

    let records = store.read_partition(&id).unwrap();
    assert_eq!(records.len(), WRITERS);
    for n in 0..WRITERS {
        let reference = format!("T{n}");
        assert_eq!(
            records.iter().filter(|r| r.reference_number == reference).count(),
            1
        );
    }
}

#[test]
fn merge_racing_update_keeps_both_edits() {
    let updates: IndexMap<String, String> = [("quantity".to_string(), "7".to_string())].into();

    for _ in 0..32 {
        let store = Arc::new(MemoryStore::new());
        let id = store
            .append_partition("ocr_structured", vec![DocketRecord::new("M1", "1")])
            .unwrap();
        let merger = SupplierMergeEngine::new(store.clone(), reference_columns());
        let mutator = RowMutator::new(store.clone());
        let rows = [supplier(&[("Docket Number", "M1"), ("Ref 1", "from supplier")])];
        let start = Barrier::new(2);

        thread::scope(|scope| {
            scope.spawn(|| {
                start.wait();
                merger.merge(&rows).unwrap();
            });
            scope.spawn(|| {
                start.wait();
                mutator.update_row(&id, "M1", &updates).unwrap();
            });
        });

        let record = &store.read_partition(&id).unwrap()[0];
        assert_eq!(record.ref_1, "from supplier");
        assert_eq!(record.quantity, "7");
    }
}
