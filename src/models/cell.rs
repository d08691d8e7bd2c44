use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 单元格文本：任意标量都按文本保存，null 视为空串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellText(pub String);

impl<'de> Deserialize<'de> for CellText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(CellText(to_text(&value)))
    }
}

impl From<CellText> for String {
    fn from(cell: CellText) -> Self {
        cell.0
    }
}

pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// `deserialize_with` 入口
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    CellText::deserialize(deserializer).map(String::from)
}

/// 空串视为缺失
pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let text = text(deserializer)?;
    Ok(if text.trim().is_empty() { None } else { Some(text) })
}
