use super::cell::CellText;
use super::docket::{DATE, PO_NUMBER, QUANTITY, REFERENCE_NUMBER, REF_1, REF_2, SUPPLIER_NAME};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 供应商清单中的一行，表头保持上传时的原样
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, CellText>", into = "IndexMap<String, String>")]
pub struct SupplierRow {
    pub cells: IndexMap<String, String>,
}

impl SupplierRow {
    pub fn from_cells<I, K, V>(cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<IndexMap<String, CellText>> for SupplierRow {
    fn from(cells: IndexMap<String, CellText>) -> Self {
        Self::from_cells(cells.into_iter().map(|(k, v)| (k, v.0)))
    }
}

impl From<SupplierRow> for IndexMap<String, String> {
    fn from(row: SupplierRow) -> Self {
        row.cells
    }
}

/// 规范化表头 (大写、下划线) 到单据字段名的映射
pub fn field_for_key(canonical: &str) -> Option<&'static str> {
    match canonical {
        "REFERENCE_NUMBER" => Some(REFERENCE_NUMBER),
        "DATE" => Some(DATE),
        "SUPPLIER_NAME" | "SUPPLIER" => Some(SUPPLIER_NAME),
        "PO_NUMBER" | "PO_NO" | "PO" => Some(PO_NUMBER),
        "REF_1" | "REF1" => Some(REF_1),
        "REF_2" | "REF2" => Some(REF_2),
        "QUANTITY" | "QTY" => Some(QUANTITY),
        _ => None,
    }
}
