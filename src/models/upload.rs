use super::cell;
use serde::{Deserialize, Serialize};

/// 待对账的上传单据，只在对账过程中存在
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    #[serde(default, deserialize_with = "cell::text")]
    pub original_docket_number: String,
    /// 原始文本，非数值按 0 处理
    #[serde(default, deserialize_with = "cell::text")]
    pub quantity: String,
    #[serde(default, deserialize_with = "cell::text")]
    pub location: String,
    #[serde(default, deserialize_with = "cell::opt_text")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "cell::text")]
    pub other_ref: String,
}

impl UploadedDocument {
    pub fn new(original_docket_number: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            original_docket_number: original_docket_number.into(),
            quantity: quantity.into(),
            ..Self::default()
        }
    }
}
