//! # Size Limits
//!
//! Parses human readable size limits such as `"2MB"` or `"500 kb"` into byte
//! counts, and formats byte counts back for messages and listings.

use std::fmt;

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

/// Errors produced while parsing a size limit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeParseError {
    #[error("size limit is empty")]
    Empty,

    #[error("invalid size limit: {0}")]
    Invalid(String),
}

/// Display unit of a parsed size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    Kilobytes,
    Megabytes,
}

impl SizeUnit {
    fn multiplier(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::Kilobytes => KB,
            SizeUnit::Megabytes => MB,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            SizeUnit::Bytes => "B",
            SizeUnit::Kilobytes => "KB",
            SizeUnit::Megabytes => "MB",
        }
    }
}

/// A maximum file size with the unit it was written in.
///
/// The unit is kept so error messages echo the limit the way it was configured
/// (`"2MB"` rather than `"2097152B"`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimit {
    bytes: u64,
    amount: f64,
    unit: SizeUnit,
}

impl SizeLimit {
    /// A limit expressed directly in bytes.
    pub fn from_bytes(bytes: u64) -> Self {
        Self {
            bytes,
            amount: bytes as f64,
            unit: SizeUnit::Bytes,
        }
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    /// Returns true when `size` is over the limit.
    pub fn is_exceeded_by(&self, size: u64) -> bool {
        size > self.bytes
    }
}

impl fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.fract() == 0.0 {
            write!(f, "{}{}", self.amount as u64, self.unit.suffix())
        } else {
            write!(f, "{}{}", self.amount, self.unit.suffix())
        }
    }
}

/// Parses a size limit into bytes.
///
/// Whitespace is ignored and suffixes are case-insensitive: `"2MB"`, `"2 mb"`,
/// `"500KB"`, `"100B"` and a bare `"100"` are all accepted. Fractional amounts
/// are rounded down to whole bytes.
///
/// # Examples
///
/// ```
/// use intake::utils::size::parse_max_size;
///
/// assert_eq!(parse_max_size("2MB").unwrap().bytes(), 2 * 1024 * 1024);
/// assert_eq!(parse_max_size("100").unwrap().to_string(), "100B");
/// ```
pub fn parse_max_size(text: &str) -> Result<SizeLimit, SizeParseError> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if normalized.is_empty() {
        return Err(SizeParseError::Empty);
    }

    let (number, unit) = if let Some(n) = normalized.strip_suffix("KB") {
        (n, SizeUnit::Kilobytes)
    } else if let Some(n) = normalized.strip_suffix("MB") {
        (n, SizeUnit::Megabytes)
    } else if let Some(n) = normalized.strip_suffix('B') {
        (n, SizeUnit::Bytes)
    } else {
        (normalized.as_str(), SizeUnit::Bytes)
    };

    let amount: f64 = number
        .parse()
        .map_err(|_| SizeParseError::Invalid(text.to_string()))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(SizeParseError::Invalid(text.to_string()));
    }

    Ok(SizeLimit {
        bytes: (amount * unit.multiplier() as f64).floor() as u64,
        amount,
        unit,
    })
}

/// Formats a byte count in the given unit with up to two decimals.
pub fn format_size(bytes: u64, unit: SizeUnit) -> String {
    let value = bytes as f64 / unit.multiplier() as f64;
    format!("{} {}", round2(value), unit.suffix())
}

/// Formats a byte count in the largest unit that keeps the value above one.
///
/// ```
/// use intake::utils::size::human_size;
///
/// assert_eq!(human_size(512), "512 B");
/// assert_eq!(human_size(1536), "1.5 KB");
/// ```
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if bytes < KB {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / KB as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", round2(value), UNITS[unit])
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
