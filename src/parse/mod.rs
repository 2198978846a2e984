//! Lexical forms of the XML Schema datatypes and policy version strings.

mod error;
mod grammar;

use winnow::Parser;

pub use error::ParseError;

use crate::repository::VersionComponent;
use crate::types::{Date, DateTime, DayTimeDuration, Time, YearMonthDuration};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid `xs:date`.
pub fn parse_date(input: &str) -> Result<Date, ParseError> {
    let ((y, m, d), tz) = grammar::date
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("date", input, e))?;
    Date::new(y, m, d, tz)
}

/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid `xs:time`.
pub fn parse_time(input: &str) -> Result<Time, ParseError> {
    let ((h, m, s, n), tz) = grammar::time
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("time", input, e))?;
    Time::new(h, m, s, n, tz)
}

/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid `xs:dateTime`.
pub fn parse_date_time(input: &str) -> Result<DateTime, ParseError> {
    let ((y, mo, d), (h, mi, s, n), tz) = grammar::date_time
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("dateTime", input, e))?;
    Ok(DateTime {
        date: Date::new(y, mo, d, tz)?,
        time: Time::new(h, mi, s, n, tz)?,
    })
}

/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid `xs:dayTimeDuration`.
pub fn parse_day_time_duration(input: &str) -> Result<DayTimeDuration, ParseError> {
    let parts = grammar::day_time_duration
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("dayTimeDuration", input, e))?;
    let has_time_component =
        parts.hours.is_some() || parts.minutes.is_some() || parts.seconds.is_some();
    if parts.has_time_designator && !has_time_component {
        return Err(ParseError::invalid(
            "dayTimeDuration",
            input,
            "'T' must be followed by a component",
        ));
    }
    if parts.days.is_none() && !has_time_component {
        return Err(ParseError::invalid(
            "dayTimeDuration",
            input,
            "no components",
        ));
    }
    let (seconds, nanos) = parts.seconds.unwrap_or((0, 0));
    let total_seconds = i128::from(parts.days.unwrap_or(0)) * 86_400
        + i128::from(parts.hours.unwrap_or(0)) * 3600
        + i128::from(parts.minutes.unwrap_or(0)) * 60
        + i128::from(seconds);
    let total = total_seconds * NANOS_PER_SECOND + i128::from(nanos);
    Ok(DayTimeDuration {
        nanos: if parts.negative { -total } else { total },
    })
}

/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid `xs:yearMonthDuration`.
pub fn parse_year_month_duration(input: &str) -> Result<YearMonthDuration, ParseError> {
    let (negative, years, months) = grammar::year_month_duration
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("yearMonthDuration", input, e))?;
    if years.is_none() && months.is_none() {
        return Err(ParseError::invalid(
            "yearMonthDuration",
            input,
            "no components",
        ));
    }
    let total = years
        .unwrap_or(0)
        .checked_mul(12)
        .and_then(|y| y.checked_add(months.unwrap_or(0)))
        .and_then(|t| i64::try_from(t).ok())
        .ok_or_else(|| ParseError::invalid("yearMonthDuration", input, "overflow"))?;
    Ok(YearMonthDuration {
        months: if negative { -total } else { total },
    })
}

/// # Errors
///
/// Returns [`ParseError`] if the input is not an even-length hex string.
pub fn parse_hex_binary(input: &str) -> Result<Vec<u8>, ParseError> {
    grammar::hex_binary
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("hexBinary", input, e))
}

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Decode standard base64, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns [`ParseError`] on characters outside the alphabet or bad padding.
pub fn parse_base64_binary(input: &str) -> Result<Vec<u8>, ParseError> {
    let symbols: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if symbols.len() % 4 != 0 {
        return Err(ParseError::invalid(
            "base64Binary",
            input,
            "length is not a multiple of 4",
        ));
    }
    let padding = symbols.iter().rev().take_while(|&&b| b == b'=').count();
    if padding > 2 {
        return Err(ParseError::invalid("base64Binary", input, "bad padding"));
    }
    let mut out = Vec::with_capacity(symbols.len() / 4 * 3);
    let mut acc: u32 = 0;
    let mut bits = 0;
    for &symbol in &symbols[..symbols.len() - padding] {
        let sextet = BASE64_ALPHABET
            .iter()
            .position(|&c| c == symbol)
            .ok_or_else(|| {
                ParseError::invalid("base64Binary", input, format!("bad symbol '{}'", symbol as char))
            })?;
        acc = (acc << 6) | u32::try_from(sextet).unwrap_or(0);
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
            acc &= (1 << bits) - 1;
        }
    }
    Ok(out)
}

/// Canonical base64 encoding with padding.
#[must_use]
pub fn format_base64_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(BASE64_ALPHABET[(n >> (18 - 6 * i) & 0x3f) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

/// Parse a dotted policy version such as `1.0.3`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a dotted list of integers.
pub fn parse_version(input: &str) -> Result<Vec<u64>, ParseError> {
    grammar::version
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("version", input, e))
}

/// Parse a version match pattern such as `1.*.+`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid pattern.
pub fn parse_version_pattern(input: &str) -> Result<Vec<VersionComponent>, ParseError> {
    grammar::version_pattern
        .parse(input.trim())
        .map_err(|e| ParseError::invalid("version pattern", input, e))
}
