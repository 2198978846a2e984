use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, preceded, separated, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::repository::VersionComponent;

// -- Shared pieces -----------------------------------------------------------

fn number(input: &mut &str) -> ModalResult<u64> {
    digit1.try_map(str::parse::<u64>).parse_next(input)
}

fn two_digits(input: &mut &str) -> ModalResult<u8> {
    take_while(2, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<u8>)
        .parse_next(input)
}

fn year(input: &mut &str) -> ModalResult<i64> {
    (opt('-'), take_while(4.., |c: char| c.is_ascii_digit()))
        .take()
        .try_map(str::parse::<i64>)
        .parse_next(input)
}

/// Fractional seconds, truncated to nanosecond precision.
fn fraction(input: &mut &str) -> ModalResult<u32> {
    preceded('.', digit1)
        .try_map(|digits: &str| {
            let mut padded: String = digits.chars().take(9).collect();
            while padded.len() < 9 {
                padded.push('0');
            }
            padded.parse::<u32>()
        })
        .parse_next(input)
}

/// `Z` or `(+|-)hh:mm`, as minutes east of UTC.
fn timezone(input: &mut &str) -> ModalResult<i16> {
    alt((
        'Z'.value(0_i16),
        (one_of(['+', '-']), two_digits, ':', two_digits).verify_map(
            |(sign, hours, _, minutes): (char, u8, char, u8)| {
                if hours > 14 || minutes > 59 {
                    return None;
                }
                let total = i16::from(hours) * 60 + i16::from(minutes);
                Some(if sign == '-' { -total } else { total })
            },
        ),
    ))
    .parse_next(input)
}

// -- Calendar values ---------------------------------------------------------

pub(crate) type DateParts = (i64, u8, u8);
pub(crate) type TimeParts = (u8, u8, u8, u32);

fn date_parts(input: &mut &str) -> ModalResult<DateParts> {
    let (y, _, m, _, d) = (year, '-', two_digits, '-', two_digits).parse_next(input)?;
    Ok((y, m, d))
}

fn time_parts(input: &mut &str) -> ModalResult<TimeParts> {
    let (h, _, m, _, s, nanos) =
        (two_digits, ':', two_digits, ':', two_digits, opt(fraction)).parse_next(input)?;
    Ok((h, m, s, nanos.unwrap_or(0)))
}

pub(crate) fn date(input: &mut &str) -> ModalResult<(DateParts, Option<i16>)> {
    (date_parts, opt(timezone)).parse_next(input)
}

pub(crate) fn time(input: &mut &str) -> ModalResult<(TimeParts, Option<i16>)> {
    (time_parts, opt(timezone)).parse_next(input)
}

pub(crate) fn date_time(input: &mut &str) -> ModalResult<(DateParts, TimeParts, Option<i16>)> {
    let (d, _, t, tz) = (date_parts, 'T', time_parts, opt(timezone)).parse_next(input)?;
    Ok((d, t, tz))
}

// -- Durations ---------------------------------------------------------------

/// Components of `-?P(nD)?(T(nH)?(nM)?(n(.f)?S)?)?`, validated by the caller.
#[derive(Debug, Default)]
pub(crate) struct DayTimeParts {
    pub negative: bool,
    pub days: Option<u64>,
    pub has_time_designator: bool,
    pub hours: Option<u64>,
    pub minutes: Option<u64>,
    pub seconds: Option<(u64, u32)>,
}

pub(crate) fn day_time_duration(input: &mut &str) -> ModalResult<DayTimeParts> {
    let negative = opt('-').parse_next(input)?.is_some();
    'P'.parse_next(input)?;
    let days = opt(terminated(number, 'D')).parse_next(input)?;
    let time = opt(preceded(
        'T',
        (
            opt(terminated(number, 'H')),
            opt(terminated(number, 'M')),
            opt(terminated((number, opt(fraction)), 'S')),
        ),
    ))
    .parse_next(input)?;

    let mut parts = DayTimeParts {
        negative,
        days,
        ..DayTimeParts::default()
    };
    if let Some((hours, minutes, seconds)) = time {
        parts.has_time_designator = true;
        parts.hours = hours;
        parts.minutes = minutes;
        parts.seconds = seconds.map(|(s, f)| (s, f.unwrap_or(0)));
    }
    Ok(parts)
}

pub(crate) fn year_month_duration(
    input: &mut &str,
) -> ModalResult<(bool, Option<u64>, Option<u64>)> {
    let negative = opt('-').parse_next(input)?.is_some();
    'P'.parse_next(input)?;
    let years = opt(terminated(number, 'Y')).parse_next(input)?;
    let months = opt(terminated(number, 'M')).parse_next(input)?;
    Ok((negative, years, months))
}

// -- Binary ------------------------------------------------------------------

pub(crate) fn hex_binary(input: &mut &str) -> ModalResult<Vec<u8>> {
    winnow::combinator::repeat(
        0..,
        take_while(2, |c: char| c.is_ascii_hexdigit())
            .try_map(|pair: &str| u8::from_str_radix(pair, 16)),
    )
    .parse_next(input)
}

// -- Policy versions ---------------------------------------------------------

pub(crate) fn version(input: &mut &str) -> ModalResult<Vec<u64>> {
    separated(1.., number, '.').parse_next(input)
}

pub(crate) fn version_pattern(input: &mut &str) -> ModalResult<Vec<VersionComponent>> {
    separated(
        1..,
        alt((
            '*'.value(VersionComponent::Any),
            '+'.value(VersionComponent::Rest),
            number.map(VersionComponent::Exact),
        )),
        '.',
    )
    .parse_next(input)
}
