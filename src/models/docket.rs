use super::cell::CellText;
use crate::service::normalize::quantity_or_zero;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const REFERENCE_NUMBER: &str = "reference_number";
pub const DATE: &str = "date";
pub const SUPPLIER_NAME: &str = "supplier_name";
pub const PO_NUMBER: &str = "po_number";
pub const REF_1: &str = "ref_1";
pub const REF_2: &str = "ref_2";
pub const QUANTITY: &str = "quantity";

/// 有名字段，按表头输出顺序排列
pub const KNOWN_FIELDS: [&str; 7] = [
    REFERENCE_NUMBER,
    DATE,
    SUPPLIER_NAME,
    PO_NUMBER,
    REF_1,
    REF_2,
    QUANTITY,
];

/// 分区标识，形如 `000012_match_report_2026-10-16T08-30-00`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(String);

impl PartitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate(seq: u64, label: &str, at: DateTime<Utc>) -> Self {
        Self(format!("{:06}_{}_{}", seq, label, at.format("%Y-%m-%dT%H-%M-%S")))
    }

    /// 前缀序号；手工命名的分区没有序号
    pub fn sequence(&self) -> Option<u64> {
        self.0.split('_').next().and_then(|s| s.parse().ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 存储中的一条单据记录
///
/// 有名字段之外的列原样保存在 `extra` 中，保持列的出现顺序。
/// JSON 形式是扁平对象，数字等标量都转为文本。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, CellText>", into = "IndexMap<String, String>")]
pub struct DocketRecord {
    pub reference_number: String,
    pub date: String,
    pub supplier_name: String,
    pub po_number: String,
    pub ref_1: String,
    pub ref_2: String,
    /// 原始单元格文本，数值解析在比较时进行
    pub quantity: String,
    pub extra: IndexMap<String, String>,
}

impl DocketRecord {
    pub fn new(reference_number: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            reference_number: reference_number.into(),
            quantity: quantity.into(),
            ..Self::default()
        }
    }

    pub fn from_cells<I, K, V>(cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::default();
        for (column, value) in cells {
            record.set(column.as_ref(), value);
        }
        record
    }

    fn field(&self, column: &str) -> Option<&String> {
        match column {
            REFERENCE_NUMBER => Some(&self.reference_number),
            DATE => Some(&self.date),
            SUPPLIER_NAME => Some(&self.supplier_name),
            PO_NUMBER => Some(&self.po_number),
            REF_1 => Some(&self.ref_1),
            REF_2 => Some(&self.ref_2),
            QUANTITY => Some(&self.quantity),
            _ => None,
        }
    }

    fn field_mut(&mut self, column: &str) -> Option<&mut String> {
        match column {
            REFERENCE_NUMBER => Some(&mut self.reference_number),
            DATE => Some(&mut self.date),
            SUPPLIER_NAME => Some(&mut self.supplier_name),
            PO_NUMBER => Some(&mut self.po_number),
            REF_1 => Some(&mut self.ref_1),
            REF_2 => Some(&mut self.ref_2),
            QUANTITY => Some(&mut self.quantity),
            _ => None,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.field(column)
            .or_else(|| self.extra.get(column))
            .map(String::as_str)
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.field_mut(column) {
            Some(slot) => *slot = value,
            None => {
                self.extra.insert(column.to_string(), value);
            }
        }
    }

    /// 数量列的数值，非数值按 0
    pub fn quantity_value(&self) -> BigDecimal {
        quantity_or_zero(&self.quantity)
    }

    /// 全部列：有名字段在前，额外列在后
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        KNOWN_FIELDS
            .into_iter()
            .map(move |name| (name, self.get(name).unwrap_or_default()))
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl From<IndexMap<String, CellText>> for DocketRecord {
    fn from(cells: IndexMap<String, CellText>) -> Self {
        Self::from_cells(cells.into_iter().map(|(k, v)| (k, v.0)))
    }
}

impl From<DocketRecord> for IndexMap<String, String> {
    fn from(record: DocketRecord) -> Self {
        record
            .cells()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
