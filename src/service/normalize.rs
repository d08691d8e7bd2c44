use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;

/// 单号规范化：去掉空白和非字母数字字符、去前导零、转大写
///
/// 幂等：`normalize(normalize(x)) == normalize(x)`。
pub fn normalize(value: &str) -> String {
    let cleaned: String = value.chars().filter(char::is_ascii_alphanumeric).collect();
    cleaned.trim_start_matches('0').to_ascii_uppercase()
}

/// 外部表头规范化：大写、去首尾空白、连续空白替换为一个下划线
pub fn normalize_key(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}

pub fn uppercase_trim(value: &str) -> String {
    value.trim().to_uppercase()
}

/// 数量允许的最大小数位/指数位数
const MAX_QUANTITY_SCALE: i64 = 32;

/// 指数超出范围的值视为非数值，避免比较时按指数对齐小数位
pub fn parse_quantity(text: &str) -> Option<BigDecimal> {
    let text = text.trim();
    let bounds = -MAX_QUANTITY_SCALE..=MAX_QUANTITY_SCALE;
    if let Some((_, exponent)) = text.split_once(|c: char| c == 'e' || c == 'E') {
        let exponent: i64 = exponent.parse().ok()?;
        if !bounds.contains(&exponent) {
            return None;
        }
    }
    let value = BigDecimal::from_str(text).ok()?;
    let (_, scale) = value.as_bigint_and_exponent();
    bounds.contains(&scale).then_some(value)
}

/// 非数值按 0 处理
pub fn quantity_or_zero(text: &str) -> BigDecimal {
    parse_quantity(text).unwrap_or_else(BigDecimal::zero)
}

/// 宽松相等：文本相同，或两边都能解析为数值且数值相等
pub fn loosely_equal(cell: &str, value: &str) -> bool {
    if cell == value {
        return true;
    }
    match (parse_quantity(cell), parse_quantity(value)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ignores_case_and_punctuation() {
        assert_eq!(normalize(" a-01 "), normalize("A01"));
        assert_eq!(normalize("A-001"), "A001");
        assert_eq!(normalize("421 0797455"), "4210797455");
        assert_eq!(normalize("00123"), "123");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("--"), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [" 0a-01 ", "Z999", "0 0 7", "po#12/b", "ÄB-0"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_key("  Docket   No "), "DOCKET_NO");
        assert_eq!(normalize_key("qty"), "QTY");
        assert_eq!(normalize_key("PO\tNumber"), "PO_NUMBER");
    }

    #[test]
    fn quantities() {
        assert_eq!(quantity_or_zero(" 10 "), BigDecimal::from(10));
        assert_eq!(quantity_or_zero("ten"), BigDecimal::zero());
        assert_eq!(quantity_or_zero(""), BigDecimal::zero());
        assert_eq!(parse_quantity("10.0"), parse_quantity("10"));
        assert_eq!(parse_quantity("1.5e2"), Some(BigDecimal::from(150)));
    }

    #[test]
    fn extreme_exponents_count_as_zero() {
        for raw in [
            "1e-9223372036854775807",
            "1e-9223372036854775808",
            "1E9223372036854775807",
            "1e-40",
            "1e+33",
        ] {
            assert_eq!(parse_quantity(raw), None, "input {:?}", raw);
            assert_eq!(quantity_or_zero(raw), BigDecimal::zero());
        }

        let tiny = format!("0.{}1", "0".repeat(40));
        assert_eq!(parse_quantity(&tiny), None);
        assert_eq!(parse_quantity("1e-32"), BigDecimal::from_str("1e-32").ok());
        assert!(!loosely_equal("1e-9223372036854775807", "10"));
    }

    #[test]
    fn loose_equality() {
        assert!(loosely_equal("A001", "A001"));
        assert!(loosely_equal("0123", "123"));
        assert!(!loosely_equal("A001", "a001"));
        assert!(!loosely_equal("", "0"));
    }
}
