//! Magnitude strings.
//!
//! Players type values the way the game displays them: "6M", "3.5k", "120".
//! Parsing is permissive: a half-typed form field degrades to a
//! best-effort number (or zero) instead of failing.
//!
//! The period is the only decimal separator. A comma is never read as a
//! decimal point, it simply ends the numeric prefix ("3,5k" parses as 3).

use std::sync::LazyLock;

use regex::Regex;

static MAGNITUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)\s*([kmbtq])?\s*$").expect("magnitude pattern")
});

static FLOAT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:e[+-]?[0-9]+)?").expect("float pattern")
});

static INT_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+").expect("int pattern"));

/// Multiplier for a magnitude suffix (already lower-cased).
fn suffix_multiplier(suffix: &str) -> f64 {
    match suffix {
        "k" => 1e3,
        "m" => 1e6,
        "b" => 1e9,
        "t" => 1e12,
        "q" => 1e15,
        _ => 1.0,
    }
}

/// Parse a human-entered magnitude string (e.g. "6M", "3.5k", "42").
///
/// Input that does not match `<number>[k|m|b|t|q]` falls back to the longest
/// leading float ("12abc" gives 12, "-5" gives -5) and finally to `0.0`.
/// The result is always finite.
pub fn parse_magnitude(input: &str) -> f64 {
    let value = input.trim().to_lowercase();

    let parsed = match MAGNITUDE_RE.captures(&value) {
        Some(caps) => {
            let number: f64 = caps[1].parse().unwrap_or(0.0);
            let multiplier = caps
                .get(2)
                .map(|m| suffix_multiplier(m.as_str()))
                .unwrap_or(1.0);
            number * multiplier
        }
        None => parse_float_prefix(&value).unwrap_or(0.0),
    };

    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

fn parse_float_prefix(value: &str) -> Option<f64> {
    FLOAT_PREFIX_RE
        .find(value)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse the leading integer of a string ("12abc" gives 12).
///
/// Used for level and area fields, which are whole numbers.
pub fn parse_int_prefix(input: &str) -> Option<i64> {
    INT_PREFIX_RE
        .find(input.trim())
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Format a number for display with `,` as thousands separator.
///
/// Keeps at most three fraction digits and never compresses to a suffix, so
/// `format_magnitude(parse_magnitude("6M"))` is `"6,000,000"`.
pub fn format_magnitude(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let text = format!("{:.3}", n.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    if n < 0.0 && (int_part != "0" || !frac.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
