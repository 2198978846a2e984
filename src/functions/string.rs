//! String manipulation, conversions to and from strings, regular
//! expressions, name matching and XPath node counting.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use regex::Regex;

use super::args::{arity, integer, min_arity, ok, string, typed, value};
use super::{Function, FunctionContext, FunctionRegistry};
use crate::types::{DataType, Evaluated, EvaluationError, Value};
use crate::uri::category;
use crate::uri::function::{V1, V2, V3};

fn concatenate(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    min_arity(args, 2)?;
    let mut out = String::new();
    for i in 0..args.len() {
        out.push_str(string(args, i)?);
    }
    ok(out)
}

fn normalize_space(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(string(args, 0)?.trim())
}

fn normalize_to_lower_case(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(string(args, 0)?.to_lowercase())
}

#[derive(Clone, Copy)]
enum Position {
    StartsWith,
    EndsWith,
    Contains,
}

/// `string-starts-with` and friends: the first argument is the needle,
/// the second the (string or anyURI) haystack.
#[derive(Clone, Copy)]
struct Substring {
    haystack: DataType,
    position: Position,
}

fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) | Value::AnyUri(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Function for Substring {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 2)?;
        let needle = string(args, 0)?;
        let haystack = text_of(typed(args, 1, self.haystack)?);
        ok(match self.position {
            Position::StartsWith => haystack.starts_with(needle),
            Position::EndsWith => haystack.ends_with(needle),
            Position::Contains => haystack.contains(needle),
        })
    }
}

/// `string-substring(s, begin, end)` over characters; an `end` of -1 runs
/// to the end of the string.
#[derive(Clone, Copy)]
struct Slice(DataType);

impl Function for Slice {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 3)?;
        let text = text_of(typed(args, 0, self.0)?);
        let chars: Vec<char> = text.chars().collect();
        let begin = integer(args, 1)?;
        let end = integer(args, 2)?;
        let out_of_range = || {
            EvaluationError::processing(format!(
                "substring({begin}, {end}) out of range for length {}",
                chars.len()
            ))
        };
        let begin = usize::try_from(begin).map_err(|_| out_of_range())?;
        let end = if end == -1 {
            chars.len()
        } else {
            usize::try_from(end).map_err(|_| out_of_range())?
        };
        if begin > end || end > chars.len() {
            return Err(out_of_range());
        }
        ok(chars[begin..end].iter().collect::<String>())
    }
}

/// `<type>-from-string`.
#[derive(Clone, Copy)]
struct ParseFrom(DataType);

impl Function for ParseFrom {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 1)?;
        let parsed = self.0.parse(string(args, 0)?)?;
        ok(parsed)
    }
}

/// `string-from-<type>`.
#[derive(Clone, Copy)]
struct Stringify(DataType);

impl Function for Stringify {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 1)?;
        ok(typed(args, 0, self.0)?.to_string())
    }
}

/// `<type>-regexp-match(pattern, value)`, an unanchored search over the
/// value's lexical form.
#[derive(Clone, Copy)]
struct RegexpMatch(DataType);

impl Function for RegexpMatch {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 2)?;
        let pattern = string(args, 0)?;
        let subject = text_of(typed(args, 1, self.0)?);
        ok(compiled(pattern)?.is_match(&subject))
    }
}

/// Upper bound on cached patterns; the cache starts over once it is full.
const PATTERN_CACHE_LIMIT: usize = 256;

static PATTERNS: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();

/// Compiles `pattern`, reusing an earlier compilation when there is one.
fn compiled(pattern: &str) -> Result<Regex, EvaluationError> {
    let cache = PATTERNS.get_or_init(Mutex::default);
    if let Some(regex) = cache.lock().unwrap_or_else(PoisonError::into_inner).get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern).map_err(|e| {
        EvaluationError::processing(format!("invalid regular expression '{pattern}': {e}"))
    })?;
    let mut patterns = cache.lock().unwrap_or_else(PoisonError::into_inner);
    if patterns.len() >= PATTERN_CACHE_LIMIT {
        patterns.clear();
    }
    patterns.insert(pattern.to_owned(), regex.clone());
    Ok(regex)
}

fn x500_name_match(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    match (
        typed(args, 0, DataType::X500Name)?,
        typed(args, 1, DataType::X500Name)?,
    ) {
        (Value::X500Name(suffix), Value::X500Name(name)) => ok(suffix.is_suffix_of(name)),
        _ => Err(EvaluationError::processing("x500Name-match: bad arguments")),
    }
}

fn rfc822_name_match(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    let pattern = string(args, 0)?;
    match typed(args, 1, DataType::Rfc822Name)? {
        Value::Rfc822Name(name) => ok(name.matches_pattern(pattern)),
        _ => Err(EvaluationError::processing("rfc822Name-match: bad arguments")),
    }
}

/// Counts the nodes an XPath expression selects in the resource content.
fn xpath_node_count(
    args: &[Evaluated],
    ctx: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    let path = match value(args, 0)? {
        Value::String(s) => s,
        other => {
            return Err(EvaluationError::processing(format!(
                "xpath-node-count: expected a string path, got {}",
                other.data_type()
            )))
        }
    };
    let nodes = ctx
        .source
        .values_by_xpath(ctx.version, path, category::RESOURCE, None, &[])?;
    ok(i64::try_from(nodes.len()).unwrap_or(i64::MAX))
}

const CONVERTIBLE: [DataType; 11] = [
    DataType::Boolean,
    DataType::Integer,
    DataType::Double,
    DataType::Time,
    DataType::Date,
    DataType::DateTime,
    DataType::AnyUri,
    DataType::DayTimeDuration,
    DataType::YearMonthDuration,
    DataType::X500Name,
    DataType::Rfc822Name,
];

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.native(format!("{V2}string-concatenate"), concatenate);
    registry.native(format!("{V1}string-normalize-space"), normalize_space);
    registry.native(
        format!("{V1}string-normalize-to-lower-case"),
        normalize_to_lower_case,
    );

    for (name, position) in [
        ("starts-with", Position::StartsWith),
        ("ends-with", Position::EndsWith),
        ("contains", Position::Contains),
    ] {
        for haystack in [DataType::String, DataType::AnyUri] {
            registry.insert(
                format!("{V3}{}-{name}", haystack.short_name()),
                Substring { haystack, position },
            );
        }
    }
    registry.insert(format!("{V3}string-substring"), Slice(DataType::String));
    registry.insert(format!("{V3}anyURI-substring"), Slice(DataType::AnyUri));

    for dt in CONVERTIBLE {
        registry.insert(format!("{V3}{}-from-string", dt.short_name()), ParseFrom(dt));
        registry.insert(format!("{V3}string-from-{}", dt.short_name()), Stringify(dt));
    }

    registry.insert(format!("{V1}string-regexp-match"), RegexpMatch(DataType::String));
    for dt in [DataType::AnyUri, DataType::Rfc822Name, DataType::X500Name] {
        registry.insert(
            format!("{V2}{}-regexp-match", dt.short_name()),
            RegexpMatch(dt),
        );
    }

    registry.native(format!("{V1}x500Name-match"), x500_name_match);
    registry.native(format!("{V1}rfc822Name-match"), rfc822_name_match);
    registry.native(format!("{V1}xpath-node-count"), xpath_node_count);
    registry.native(format!("{V3}xpath-node-count"), xpath_node_count);
}
