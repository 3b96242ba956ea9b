use super::types::UnitFormat;

pub const RUPEE: &str = "₹";

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// Renders a raw value for display. Currency follows the Indian convention:
/// crores and lakhs with two decimals, smaller amounts as a grouped integer
/// (`12,34,567` style grouping).
pub fn format_value(value: f64, unit: UnitFormat, currency_symbol: &str) -> String {
    if !value.is_finite() {
        return String::new();
    }
    match unit {
        UnitFormat::Currency => format_currency(value, currency_symbol),
        UnitFormat::Percentage => format!("{}%", trim_decimals(value, 2)),
        UnitFormat::Years => format_count(value, "year"),
        UnitFormat::Months => format_count(value, "month"),
        UnitFormat::Plain => trim_decimals(value, 6),
    }
}

fn format_currency(value: f64, symbol: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    let whole = magnitude.round();
    if whole < LAKH {
        let rounded = whole as u64;
        return if rounded == 0 {
            format!("{symbol}0")
        } else {
            format!("{sign}{symbol}{}", group_indian(rounded))
        };
    }
    // Pick the unit from the figure as displayed, so 99.999 lakh reads 1.00 Cr.
    let lakhs = (magnitude / LAKH * 100.0).round() / 100.0;
    if lakhs < CRORE / LAKH {
        format!("{sign}{symbol}{:.2} Lakh", magnitude / LAKH)
    } else {
        format!("{sign}{symbol}{:.2} Cr", magnitude / CRORE)
    }
}

fn format_count(value: f64, unit: &str) -> String {
    let amount = trim_decimals(value, 2);
    if value == 1.0 {
        format!("{amount} {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Indian digit grouping: the last three digits, then pairs.
pub fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Rounds to `places` decimals and drops trailing zeros (`12.50` -> `12.5`,
/// `3.00` -> `3`).
fn trim_decimals(value: f64, places: usize) -> String {
    let fixed = format!("{value:.places$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
