//! Formatting helpers shared by table output and summaries.

use rust_decimal::Decimal;

/// Format a monetary value with symbol: "$ 1,234.56"
pub fn format_currency(value: Decimal) -> String {
    format!("$ {}", format_amount(value))
}

/// Format a monetary value without symbol: "1,234.56"
pub fn format_amount(value: Decimal) -> String {
    let is_negative = value < Decimal::ZERO;
    let abs_value = value.abs();

    let formatted = format!("{:.2}", abs_value);
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    format!("{}{}.{}", sign, with_separators, decimal_part)
}

/// Format a quantity, dropping a trailing fractional part when it is zero.
pub fn format_quantity(value: Decimal) -> String {
    let normalized = value.normalize();
    normalized.to_string()
}
