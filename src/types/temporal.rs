//! Calendar and duration values for the XML Schema temporal datatypes.
//!
//! Values without a timezone are interpreted in UTC (the implicit timezone)
//! when ordered against each other.

use std::cmp::Ordering;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::parse::ParseError;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SECOND;

pub(crate) fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_month(year: i64, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn write_offset(f: &mut fmt::Formatter<'_>, offset: Option<i16>) -> fmt::Result {
    match offset {
        None => Ok(()),
        Some(0) => write!(f, "Z"),
        Some(minutes) => {
            let sign = if minutes < 0 { '-' } else { '+' };
            let abs = minutes.unsigned_abs();
            write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
        }
    }
}

fn write_seconds(f: &mut fmt::Formatter<'_>, second: u8, nanos: u32) -> fmt::Result {
    write!(f, "{second:02}")?;
    if nanos > 0 {
        let frac = format!("{nanos:09}");
        write!(f, ".{}", frac.trim_end_matches('0'))?;
    }
    Ok(())
}

fn offset_nanos(offset: Option<i16>) -> i128 {
    i128::from(offset.unwrap_or(0)) * 60 * NANOS_PER_SECOND
}

/// `xs:date`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year: i64,
    pub month: u8,
    pub day: u8,
    /// Timezone offset in minutes east of UTC.
    pub offset: Option<i16>,
}

/// `xs:time`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
    pub offset: Option<i16>,
}

/// `xs:dateTime`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

/// `xs:dayTimeDuration`, held as a signed number of nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DayTimeDuration {
    pub nanos: i128,
}

/// `xs:yearMonthDuration`, held as a signed number of months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YearMonthDuration {
    pub months: i64,
}

impl Date {
    /// Validate and build a date.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the month or day is out of range.
    pub fn new(year: i64, month: u8, day: u8, offset: Option<i16>) -> Result<Self, ParseError> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return Err(ParseError::new(format!(
                "invalid calendar date {year}-{month:02}-{day:02}"
            )));
        }
        check_offset(offset)?;
        Ok(Self {
            year,
            month,
            day,
            offset,
        })
    }

    /// # Errors
    ///
    /// Returns [`ParseError`] on a malformed lexical form.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        crate::parse::parse_date(input)
    }

    fn instant(&self) -> i128 {
        i128::from(days_from_civil(self.year, self.month, self.day)) * NANOS_PER_DAY
            - offset_nanos(self.offset)
    }

    /// Add (or with a negative duration, subtract) calendar months, clamping
    /// the day to the length of the resulting month.
    #[must_use]
    pub fn add_months(&self, months: i64) -> Date {
        let total = self.year * 12 + i64::from(self.month) - 1 + months;
        let year = total.div_euclid(12);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let month = (total.rem_euclid(12) + 1) as u8;
        let day = self.day.min(days_in_month(year, month));
        Date {
            year,
            month,
            day,
            offset: self.offset,
        }
    }
}

impl Time {
    /// # Errors
    ///
    /// Returns [`ParseError`] if any component is out of range.
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        nanos: u32,
        offset: Option<i16>,
    ) -> Result<Self, ParseError> {
        if hour > 23 || minute > 59 || second > 59 || nanos >= 1_000_000_000 {
            return Err(ParseError::new(format!(
                "invalid time of day {hour:02}:{minute:02}:{second:02}"
            )));
        }
        check_offset(offset)?;
        Ok(Self {
            hour,
            minute,
            second,
            nanos,
            offset,
        })
    }

    /// # Errors
    ///
    /// Returns [`ParseError`] on a malformed lexical form.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        crate::parse::parse_time(input)
    }

    fn nanos_of_day(&self) -> i128 {
        (i128::from(self.hour) * 3600 + i128::from(self.minute) * 60 + i128::from(self.second))
            * NANOS_PER_SECOND
            + i128::from(self.nanos)
    }

    fn instant(&self) -> i128 {
        self.nanos_of_day() - offset_nanos(self.offset)
    }

    /// Position within the UTC day, wrapping across midnight.
    pub(crate) fn utc_nanos_of_day(&self) -> i128 {
        self.instant().rem_euclid(NANOS_PER_DAY)
    }
}

impl DateTime {
    /// # Errors
    ///
    /// Returns [`ParseError`] on a malformed lexical form.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        crate::parse::parse_date_time(input)
    }

    /// The current instant in UTC.
    #[must_use]
    pub fn now_utc() -> DateTime {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        #[allow(clippy::cast_possible_wrap)]
        let nanos = since_epoch as i128;
        Self::from_local_nanos(nanos, Some(0))
    }

    fn local_nanos(&self) -> i128 {
        i128::from(days_from_civil(self.date.year, self.date.month, self.date.day)) * NANOS_PER_DAY
            + self.time.nanos_of_day()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_local_nanos(nanos: i128, offset: Option<i16>) -> DateTime {
        let days = nanos.div_euclid(NANOS_PER_DAY);
        let rem = nanos.rem_euclid(NANOS_PER_DAY);
        let (year, month, day) = civil_from_days(days as i64);
        let secs = rem / NANOS_PER_SECOND;
        DateTime {
            date: Date {
                year,
                month,
                day,
                offset,
            },
            time: Time {
                hour: (secs / 3600) as u8,
                minute: (secs / 60 % 60) as u8,
                second: (secs % 60) as u8,
                nanos: (rem % NANOS_PER_SECOND) as u32,
                offset,
            },
        }
    }

    fn instant(&self) -> i128 {
        self.local_nanos() - offset_nanos(self.time.offset)
    }

    #[must_use]
    pub fn add_duration(&self, duration: DayTimeDuration) -> DateTime {
        Self::from_local_nanos(self.local_nanos() + duration.nanos, self.time.offset)
    }

    #[must_use]
    pub fn add_months(&self, months: i64) -> DateTime {
        DateTime {
            date: self.date.add_months(months),
            time: self.time,
        }
    }

    #[must_use]
    pub fn date_part(&self) -> Date {
        self.date
    }

    #[must_use]
    pub fn time_part(&self) -> Time {
        self.time
    }
}

impl DayTimeDuration {
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            nanos: i128::from(seconds) * NANOS_PER_SECOND,
        }
    }

    /// # Errors
    ///
    /// Returns [`ParseError`] on a malformed lexical form.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        crate::parse::parse_day_time_duration(input)
    }

    #[must_use]
    pub fn negated(self) -> Self {
        Self { nanos: -self.nanos }
    }
}

impl YearMonthDuration {
    /// # Errors
    ///
    /// Returns [`ParseError`] on a malformed lexical form.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        crate::parse::parse_year_month_duration(input)
    }

    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            months: -self.months,
        }
    }
}

fn check_offset(offset: Option<i16>) -> Result<(), ParseError> {
    match offset {
        Some(minutes) if minutes.abs() > 14 * 60 => Err(ParseError::new(format!(
            "timezone offset {minutes} minutes out of range"
        ))),
        _ => Ok(()),
    }
}

macro_rules! order_by_instant {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.instant() == other.instant()
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                self.instant().cmp(&other.instant())
            }
        }
    };
}

order_by_instant!(Date);
order_by_instant!(Time);
order_by_instant!(DateTime);

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year < 0 {
            write!(f, "-{:04}", -self.year)?;
        } else {
            write!(f, "{:04}", self.year)?;
        }
        write!(f, "-{:02}-{:02}", self.month, self.day)?;
        write_offset(f, self.offset)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:", self.hour, self.minute)?;
        write_seconds(f, self.second, self.nanos)?;
        write_offset(f, self.offset)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = Date {
            offset: None,
            ..self.date
        };
        let time = Time {
            offset: None,
            ..self.time
        };
        write!(f, "{date}T{time}")?;
        write_offset(f, self.time.offset)
    }
}

impl fmt::Display for DayTimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return write!(f, "PT0S");
        }
        if self.nanos < 0 {
            write!(f, "-")?;
        }
        let abs = self.nanos.abs();
        let days = abs / NANOS_PER_DAY;
        let rem = abs % NANOS_PER_DAY;
        let hours = rem / (3600 * NANOS_PER_SECOND);
        let minutes = rem / (60 * NANOS_PER_SECOND) % 60;
        let seconds = rem / NANOS_PER_SECOND % 60;
        let frac = rem % NANOS_PER_SECOND;
        write!(f, "P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if rem > 0 {
            write!(f, "T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if seconds > 0 || frac > 0 {
                write!(f, "{seconds}")?;
                if frac > 0 {
                    let digits = format!("{frac:09}");
                    write!(f, ".{}", digits.trim_end_matches('0'))?;
                }
                write!(f, "S")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for YearMonthDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 {
            return write!(f, "P0M");
        }
        if self.months < 0 {
            write!(f, "-")?;
        }
        let abs = self.months.unsigned_abs();
        write!(f, "P")?;
        if abs >= 12 {
            write!(f, "{}Y", abs / 12)?;
        }
        if abs % 12 > 0 {
            write!(f, "{}M", abs % 12)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civil_round_trip_around_epoch() {
        for days in [-719_468_i64, -1, 0, 1, 365, 11_016, 20_000] {
            let (y, m, d) = civil_from_days(days);
            assert_eq!(days_from_civil(y, m, d), days);
        }
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(civil_from_days(59), (1970, 3, 1));
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
    }

    #[test]
    fn date_validation() {
        assert!(Date::new(2024, 2, 29, None).is_ok());
        assert!(Date::new(2023, 2, 29, None).is_err());
        assert!(Date::new(2023, 13, 1, None).is_err());
        assert!(Date::new(2023, 1, 1, Some(15 * 60)).is_err());
    }

    #[test]
    fn add_months_clamps_day() {
        let d = Date::new(2024, 1, 31, None).unwrap();
        let next = d.add_months(1);
        assert_eq!((next.year, next.month, next.day), (2024, 2, 29));
        let back = d.add_months(-2);
        assert_eq!((back.year, back.month, back.day), (2023, 11, 30));
    }

    #[test]
    fn times_with_offsets_compare_as_instants() {
        let utc = Time::new(12, 0, 0, 0, Some(0)).unwrap();
        let cet = Time::new(13, 0, 0, 0, Some(60)).unwrap();
        assert_eq!(utc, cet);
        let later = Time::new(12, 0, 1, 0, None).unwrap();
        assert!(later > utc);
    }

    #[test]
    fn date_time_adds_duration_across_midnight() {
        let dt = DateTime {
            date: Date::new(2023, 12, 31, Some(0)).unwrap(),
            time: Time::new(23, 30, 0, 0, Some(0)).unwrap(),
        };
        let later = dt.add_duration(DayTimeDuration::from_seconds(3600));
        assert_eq!(later.to_string(), "2024-01-01T00:30:00Z");
    }

    #[test]
    fn display_forms() {
        let t = Time::new(9, 5, 7, 250_000_000, Some(-300)).unwrap();
        assert_eq!(t.to_string(), "09:05:07.25-05:00");
        let d = DayTimeDuration {
            nanos: (86_400 + 3_661) * NANOS_PER_SECOND + 500_000_000,
        };
        assert_eq!(d.to_string(), "P1DT1H1M1.5S");
        assert_eq!(d.negated().to_string(), "-P1DT1H1M1.5S");
        assert_eq!(DayTimeDuration { nanos: 0 }.to_string(), "PT0S");
        assert_eq!(YearMonthDuration { months: 14 }.to_string(), "P1Y2M");
        assert_eq!(YearMonthDuration { months: -3 }.to_string(), "-P3M");
    }

    #[test]
    fn now_is_after_2020() {
        let now = DateTime::now_utc();
        assert!(now.date.year >= 2020);
        assert_eq!(now.time.offset, Some(0));
    }
}
