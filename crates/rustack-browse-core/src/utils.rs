//! Shared helpers: size formatting, prefix normalization, and duration parsing.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Size formatting
// ---------------------------------------------------------------------------

const KIB: i64 = 1 << 10;
const MIB: i64 = 1 << 20;
const GIB: i64 = 1 << 30;
const TIB: i64 = 1 << 40;

/// Format a byte count as a human-readable string with one decimal digit.
///
/// Uses 1024-based multiples with `KB`/`MB`/`GB`/`TB` labels, picking the
/// largest unit that keeps the value at or above 1.0.
///
/// # Examples
///
/// ```
/// use rustack_browse_core::utils::format_size;
///
/// assert_eq!(format_size(0), "0.0 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// assert_eq!(format_size(1 << 30), "1.0 GB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size: i64) -> String {
    let (value, unit) = match size {
        s if s >= TIB => (s as f64 / TIB as f64, "TB"),
        s if s >= GIB => (s as f64 / GIB as f64, "GB"),
        s if s >= MIB => (s as f64 / MIB as f64, "MB"),
        s if s >= KIB => (s as f64 / KIB as f64, "KB"),
        s => (s as f64, "B"),
    };
    format!("{value:.1} {unit}")
}

// ---------------------------------------------------------------------------
// Prefixes
// ---------------------------------------------------------------------------

/// Append a trailing `/` to a non-empty prefix that lacks one.
///
/// # Examples
///
/// ```
/// use rustack_browse_core::utils::normalize_prefix;
///
/// assert_eq!(normalize_prefix("photos"), "photos/");
/// assert_eq!(normalize_prefix("photos/"), "photos/");
/// assert_eq!(normalize_prefix(""), "");
/// ```
#[must_use]
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_owned()
    } else {
        format!("{prefix}/")
    }
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Parse a duration such as `90s`, `15m`, `1h30m`, or `250ms`.
///
/// A bare integer is read as seconds. Returns `None` for anything else,
/// including an empty string.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rustack_browse_core::utils::parse_duration;
///
/// assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
/// assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
/// assert_eq!(parse_duration("soon"), None);
/// ```
#[must_use]
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = value;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => Duration::from_secs(amount.checked_mul(60)?),
            "h" => Duration::from_secs(amount.checked_mul(3600)?),
            _ => return None,
        };
        total = total.checked_add(part)?;
        rest = &rest[unit_len..];
    }

    Some(total)
}
