//! Parsing and formatting for the numeric-as-text fields Coinlore sends.
//!
//! Two policies live here and must not be mixed up: ordering falls back to a
//! `0.0` sentinel, display falls back to the raw text (or a placeholder when
//! the field is absent).

use serde::Serialize;

pub const SORT_SENTINEL: f64 = 0.0;
pub const NOT_AVAILABLE: &str = "N/A";

const TRILLION: f64 = 1_000_000_000_000.0;
const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;
const SIGNIFICANT_FRACTION_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
}

/// Sort-context parse. Never fails; missing, blank or garbled text orders as
/// [`SORT_SENTINEL`].
pub fn parse_sort_value(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(SORT_SENTINEL)
}

/// Display-context parse: drops `,` separators first.
pub fn parse_display_value(raw: &str) -> Option<f64> {
    raw.replace(',', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Formats a price-like value for detail views. Unparsable text is returned
/// as-is so garbled upstream data still shows up.
pub fn format_crypto_value(raw: Option<&str>, not_available: &str) -> String {
    let Some(raw) = raw else {
        return not_available.to_string();
    };
    let Some(value) = parse_display_value(raw) else {
        return raw.to_string();
    };

    if value >= 1.0 {
        group_thousands(&format!("{value:.2}"))
    } else {
        format_fraction(value)
    }
}

// Keeps digits up to the third non-zero one after the decimal point.
fn format_fraction(value: f64) -> String {
    let shortest = value.to_string();
    let fraction = shortest
        .split_once('.')
        .map(|(_, fraction)| fraction)
        .unwrap_or("");

    let mut decimals = fraction.len();
    let mut non_zero = 0;
    for (position, digit) in fraction.chars().enumerate() {
        if digit != '0' {
            non_zero += 1;
            if non_zero == SIGNIFICANT_FRACTION_DIGITS {
                decimals = position + 1;
                break;
            }
        }
    }

    let rendered = format!("{value:.decimals$}");
    if rendered.contains('.') {
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        rendered
    }
}

fn group_thousands(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(rendered.len() + integer.len() / 3);
    grouped.push_str(sign);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

/// Scales to a T/B/M suffix with two decimals, `N/A` for blank or garbled
/// text.
pub fn format_compact(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    let Some(value) = parse_display_value(trimmed) else {
        return NOT_AVAILABLE.to_string();
    };

    if value >= TRILLION {
        format!("{:.2}T", value / TRILLION)
    } else if value >= BILLION {
        format!("{:.2}B", value / BILLION)
    } else if value >= MILLION {
        format!("{:.2}M", value / MILLION)
    } else {
        format!("{value:.2}")
    }
}

pub fn change_direction(raw: Option<&str>) -> ChangeDirection {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return ChangeDirection::Up;
    };
    match text.parse::<f64>() {
        Ok(value) if value < 0.0 => ChangeDirection::Down,
        Ok(_) => ChangeDirection::Up,
        Err(error) => {
            tracing::warn!(raw = text, %error, "unparsable percent change");
            ChangeDirection::Up
        }
    }
}
