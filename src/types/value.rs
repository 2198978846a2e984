use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::temporal::{Date, DateTime, DayTimeDuration, Time, YearMonthDuration};
use crate::functions::Function;
use crate::parse::{self, ParseError};

const XS: &str = "http://www.w3.org/2001/XMLSchema#";
const LEGACY_XQUERY: &str = "http://www.w3.org/TR/2002/WD-xquery-operators-20020816#";

/// The primitive datatypes understood by the value registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    String,
    Boolean,
    Integer,
    Double,
    Date,
    Time,
    DateTime,
    DayTimeDuration,
    YearMonthDuration,
    AnyUri,
    HexBinary,
    Base64Binary,
    Rfc822Name,
    X500Name,
}

impl DataType {
    pub const ALL: [DataType; 14] = [
        DataType::String,
        DataType::Boolean,
        DataType::Integer,
        DataType::Double,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::DayTimeDuration,
        DataType::YearMonthDuration,
        DataType::AnyUri,
        DataType::HexBinary,
        DataType::Base64Binary,
        DataType::Rfc822Name,
        DataType::X500Name,
    ];

    /// Resolve a datatype URI, accepting the pre-3.0 duration aliases.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<DataType> {
        if let Some(local) = uri.strip_prefix(XS) {
            return Self::ALL
                .into_iter()
                .find(|dt| dt.short_name() == local && !dt.is_xacml_defined());
        }
        if let Some(local) = uri.strip_prefix(LEGACY_XQUERY) {
            return match local {
                "dayTimeDuration" => Some(DataType::DayTimeDuration),
                "yearMonthDuration" => Some(DataType::YearMonthDuration),
                _ => None,
            };
        }
        match uri {
            "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name" => Some(DataType::Rfc822Name),
            "urn:oasis:names:tc:xacml:1.0:data-type:x500Name" => Some(DataType::X500Name),
            _ => None,
        }
    }

    /// The canonical (3.0) URI of this datatype.
    #[must_use]
    pub fn uri(self) -> String {
        match self {
            DataType::Rfc822Name | DataType::X500Name => {
                format!("urn:oasis:names:tc:xacml:1.0:data-type:{}", self.short_name())
            }
            _ => format!("{XS}{}", self.short_name()),
        }
    }

    /// The name used as the prefix of type-specific function ids, e.g.
    /// `integer` in `integer-equal`.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Double => "double",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::DateTime => "dateTime",
            DataType::DayTimeDuration => "dayTimeDuration",
            DataType::YearMonthDuration => "yearMonthDuration",
            DataType::AnyUri => "anyURI",
            DataType::HexBinary => "hexBinary",
            DataType::Base64Binary => "base64Binary",
            DataType::Rfc822Name => "rfc822Name",
            DataType::X500Name => "x500Name",
        }
    }

    fn is_xacml_defined(self) -> bool {
        matches!(self, DataType::Rfc822Name | DataType::X500Name)
    }

    /// Whether values of this type are totally ordered for the
    /// `greater-than` family of functions.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            DataType::String
                | DataType::Integer
                | DataType::Double
                | DataType::Date
                | DataType::Time
                | DataType::DateTime
        )
    }

    /// Convert a lexical form into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if `text` is not a valid literal of this type.
    pub fn parse(self, text: &str) -> Result<Value, ParseError> {
        Ok(match self {
            DataType::String => Value::String(text.to_owned()),
            DataType::Boolean => match text.trim() {
                "true" | "1" => Value::Boolean(true),
                "false" | "0" => Value::Boolean(false),
                _ => return Err(ParseError::invalid("boolean", text, "expected true or false")),
            },
            DataType::Integer => Value::Integer(
                text.trim()
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|e| ParseError::invalid("integer", text, e))?,
            ),
            DataType::Double => Value::Double(parse_double(text)?),
            DataType::Date => Value::Date(Date::parse(text)?),
            DataType::Time => Value::Time(Time::parse(text)?),
            DataType::DateTime => Value::DateTime(DateTime::parse(text)?),
            DataType::DayTimeDuration => Value::DayTimeDuration(DayTimeDuration::parse(text)?),
            DataType::YearMonthDuration => {
                Value::YearMonthDuration(YearMonthDuration::parse(text)?)
            }
            DataType::AnyUri => Value::AnyUri(text.trim().to_owned()),
            DataType::HexBinary => Value::HexBinary(parse::parse_hex_binary(text)?),
            DataType::Base64Binary => Value::Base64Binary(parse::parse_base64_binary(text)?),
            DataType::Rfc822Name => Value::Rfc822Name(Rfc822Name::parse(text)?),
            DataType::X500Name => Value::X500Name(X500Name::parse(text)?),
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

fn parse_double(text: &str) -> Result<f64, ParseError> {
    match text.trim() {
        "INF" | "+INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        other if other.chars().any(char::is_alphabetic) && !other.contains(['e', 'E']) => Err(
            ParseError::invalid("double", text, "unexpected characters"),
        ),
        other => other
            .parse()
            .map_err(|e| ParseError::invalid("double", text, e)),
    }
}

/// An `rfc822Name`: the local part compares case-sensitively, the domain
/// case-insensitively.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rfc822Name {
    pub local: String,
    pub domain: String,
}

impl Rfc822Name {
    /// # Errors
    ///
    /// Returns [`ParseError`] if the text has no `@` separated domain.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        match text.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self {
                local: local.to_owned(),
                domain: domain.to_owned(),
            }),
            _ => Err(ParseError::invalid("rfc822Name", text, "expected local@domain")),
        }
    }

    /// `rfc822Name-match`: a full address, a host (`example.com`) or a
    /// domain suffix (`.example.com`).
    #[must_use]
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if let Some((local, domain)) = pattern.rsplit_once('@') {
            local == self.local && domain.eq_ignore_ascii_case(&self.domain)
        } else if pattern.starts_with('.') {
            self.domain
                .to_ascii_lowercase()
                .ends_with(&pattern.to_ascii_lowercase())
        } else {
            pattern.eq_ignore_ascii_case(&self.domain)
        }
    }
}

impl PartialEq for Rfc822Name {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.domain.eq_ignore_ascii_case(&other.domain)
    }
}

impl fmt::Display for Rfc822Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

/// An X.500 distinguished name, kept as its ordered list of RDNs.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct X500Name {
    raw: String,
    rdns: Vec<(String, String)>,
}

impl X500Name {
    /// # Errors
    ///
    /// Returns [`ParseError`] if an RDN is not of the form `type=value`.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut rdns = Vec::new();
        for rdn in text.split(',') {
            let (attr, value) = rdn
                .split_once('=')
                .ok_or_else(|| ParseError::invalid("x500Name", text, "expected type=value"))?;
            let attr = attr.trim();
            if attr.is_empty() {
                return Err(ParseError::invalid("x500Name", text, "empty attribute type"));
            }
            rdns.push((attr.to_ascii_lowercase(), value.trim().to_lowercase()));
        }
        Ok(Self {
            raw: text.trim().to_owned(),
            rdns,
        })
    }

    /// `x500Name-match`: true if `self` is a terminal sequence of `other`'s RDNs.
    #[must_use]
    pub fn is_suffix_of(&self, other: &X500Name) -> bool {
        other.rdns.ends_with(&self.rdns)
    }
}

impl PartialEq for X500Name {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl fmt::Display for X500Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A typed attribute value. The variant determines its [`DataType`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    DayTimeDuration(DayTimeDuration),
    YearMonthDuration(YearMonthDuration),
    AnyUri(String),
    HexBinary(Vec<u8>),
    Base64Binary(Vec<u8>),
    Rfc822Name(Rfc822Name),
    X500Name(X500Name),
}

impl Value {
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Double(_) => DataType::Double,
            Value::Date(_) => DataType::Date,
            Value::Time(_) => DataType::Time,
            Value::DateTime(_) => DataType::DateTime,
            Value::DayTimeDuration(_) => DataType::DayTimeDuration,
            Value::YearMonthDuration(_) => DataType::YearMonthDuration,
            Value::AnyUri(_) => DataType::AnyUri,
            Value::HexBinary(_) => DataType::HexBinary,
            Value::Base64Binary(_) => DataType::Base64Binary,
            Value::Rfc822Name(_) => DataType::Rfc822Name,
            Value::X500Name(_) => DataType::X500Name,
        }
    }

    /// Type-specific equality. Returns `None` when the types differ.
    #[must_use]
    pub fn equals(&self, other: &Value) -> Option<bool> {
        if self.data_type() != other.data_type() {
            return None;
        }
        Some(self == other)
    }

    /// Total order for the ordered datatypes. Returns `None` for mismatched
    /// or unordered types, and for NaN.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::DayTimeDuration(a), Value::DayTimeDuration(b)) => Some(a.cmp(b)),
            (Value::YearMonthDuration(a), Value::YearMonthDuration(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::AnyUri(s) => Some(s),
            _ => None,
        }
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02X}")?;
    }
    Ok(())
}

/// Canonical lexical form, the inverse of [`DataType::parse`].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::AnyUri(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) if d.is_nan() => write!(f, "NaN"),
            Value::Double(d) if d.is_infinite() => {
                write!(f, "{}", if *d > 0.0 { "INF" } else { "-INF" })
            }
            Value::Double(d) => write!(f, "{d}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
            Value::DayTimeDuration(d) => write!(f, "{d}"),
            Value::YearMonthDuration(d) => write!(f, "{d}"),
            Value::HexBinary(bytes) => write_hex(f, bytes),
            Value::Base64Binary(bytes) => f.write_str(&parse::format_base64_binary(bytes)),
            Value::Rfc822Name(n) => write!(f, "{n}"),
            Value::X500Name(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// An unordered multiset of values of one datatype. Designator results keep
/// the order the attribute source returned them in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bag {
    pub data_type: DataType,
    pub values: Vec<Value>,
}

impl Bag {
    #[must_use]
    pub fn new(data_type: DataType, values: Vec<Value>) -> Self {
        Self { data_type, values }
    }

    #[must_use]
    pub fn empty(data_type: DataType) -> Self {
        Self::new(data_type, Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Membership under the datatype's equality.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.values
            .iter()
            .any(|v| v.equals(value).unwrap_or(false))
    }

    /// The distinct members, first occurrence first.
    #[must_use]
    pub fn distinct(&self) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::with_capacity(self.values.len());
        for v in &self.values {
            if !out.iter().any(|o| o.equals(v).unwrap_or(false)) {
                out.push(v.clone());
            }
        }
        out
    }
}

/// A function resolved from the registry, usable as a first-class value by
/// the higher-order bag functions.
#[derive(Clone)]
pub struct FunctionRef {
    pub uri: String,
    pub function: Arc<dyn Function>,
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRef").field("uri", &self.uri).finish()
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Value(Value),
    Bag(Bag),
    Function(FunctionRef),
}

impl Evaluated {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Evaluated::Value(_) => "value",
            Evaluated::Bag(_) => "bag",
            Evaluated::Function(_) => "function",
        }
    }
}

impl From<Value> for Evaluated {
    fn from(v: Value) -> Self {
        Evaluated::Value(v)
    }
}

impl From<Bag> for Evaluated {
    fn from(b: Bag) -> Self {
        Evaluated::Bag(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_uris_and_aliases() {
        assert_eq!(
            DataType::from_uri("http://www.w3.org/2001/XMLSchema#integer"),
            Some(DataType::Integer)
        );
        assert_eq!(
            DataType::from_uri(
                "http://www.w3.org/TR/2002/WD-xquery-operators-20020816#dayTimeDuration"
            ),
            Some(DataType::DayTimeDuration)
        );
        assert_eq!(
            DataType::from_uri("urn:oasis:names:tc:xacml:1.0:data-type:x500Name"),
            Some(DataType::X500Name)
        );
        assert_eq!(
            DataType::from_uri("http://www.w3.org/2001/XMLSchema#x500Name"),
            None
        );
        assert_eq!(DataType::from_uri("urn:example:unknown"), None);
    }

    #[test]
    fn uri_round_trip_for_all_types() {
        for dt in DataType::ALL {
            assert_eq!(DataType::from_uri(&dt.uri()), Some(dt));
        }
    }

    #[test]
    fn parse_and_display_scalars() {
        let cases = [
            (DataType::Boolean, "true", "true"),
            (DataType::Boolean, "0", "false"),
            (DataType::Integer, "+42", "42"),
            (DataType::Double, "1.5", "1.5"),
            (DataType::Double, "-INF", "-INF"),
            (DataType::HexBinary, "0aff", "0AFF"),
            (DataType::Base64Binary, "Zm9v", "Zm9v"),
            (DataType::Rfc822Name, "Anne@Example.COM", "Anne@Example.COM"),
        ];
        for (dt, text, expected) in cases {
            let v = dt.parse(text).unwrap();
            assert_eq!(v.data_type(), dt);
            assert_eq!(v.to_string(), expected, "display of {dt} '{text}'");
        }
    }

    #[test]
    fn parse_rejects_bad_literals() {
        assert!(DataType::Boolean.parse("yes").is_err());
        assert!(DataType::Integer.parse("4.2").is_err());
        assert!(DataType::Double.parse("abc").is_err());
        assert!(DataType::Rfc822Name.parse("no-at-sign").is_err());
        assert!(DataType::X500Name.parse("cn").is_err());
    }

    #[test]
    fn rfc822_equality_ignores_domain_case_only() {
        let a = Rfc822Name::parse("Anne@EXAMPLE.com").unwrap();
        let b = Rfc822Name::parse("Anne@example.COM").unwrap();
        let c = Rfc822Name::parse("anne@example.com").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.matches_pattern("example.com"));
        assert!(a.matches_pattern(".com"));
        assert!(a.matches_pattern("Anne@example.com"));
        assert!(!a.matches_pattern("anne@example.com"));
    }

    #[test]
    fn x500_suffix_match() {
        let org = X500Name::parse("O=Medico Corp, C=US").unwrap();
        let person = X500Name::parse("cn=John Smith,o=Medico Corp,c=US").unwrap();
        assert!(org.is_suffix_of(&person));
        assert!(!person.is_suffix_of(&org));
        assert_eq!(org, X500Name::parse("o=medico corp,c=us").unwrap());
    }

    #[test]
    fn equals_requires_same_type() {
        assert_eq!(Value::Integer(1).equals(&Value::Integer(1)), Some(true));
        assert_eq!(Value::Integer(1).equals(&Value::Double(1.0)), None);
        assert_eq!(
            Value::String("a".into()).equals(&Value::AnyUri("a".into())),
            None
        );
    }

    #[test]
    fn compare_ordered_types() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Integer(2)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Double(f64::NAN).compare(&Value::Double(1.0)), None);
        assert_eq!(Value::Boolean(true).compare(&Value::Boolean(false)), None);
    }

    #[test]
    fn bag_membership_and_distinct() {
        let bag = Bag::new(
            DataType::String,
            vec!["a".into(), "b".into(), "a".into()],
        );
        assert!(bag.contains(&"a".into()));
        assert!(!bag.contains(&"c".into()));
        assert_eq!(bag.distinct().len(), 2);
        assert_eq!(bag.len(), 3);
    }
}
