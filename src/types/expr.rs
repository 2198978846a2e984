use std::fmt;

use super::error::{ConfigError, EvaluationError, Fault};
use super::value::{DataType, Value};

/// Expression tree used by conditions, variable definitions and
/// obligation/advice assignments.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Value(AttributeValue),
    Designator(AttributeDesignator),
    Selector(AttributeSelector),
    VariableReference(String),
    Function(String),
    Apply(Apply),
}

/// Application of a function to argument expressions, evaluated eagerly
/// left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub function: String,
    pub arguments: Vec<Expression>,
}

/// A literal in its lexical form, tagged with a datatype URI.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeValue {
    pub data_type: String,
    pub value: String,
}

impl AttributeValue {
    pub fn new(data_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            value: value.into(),
        }
    }

    /// Convert into a typed [`Value`].
    ///
    /// # Errors
    ///
    /// Returns [`PdpError`](crate::PdpError) if the datatype is unknown or
    /// the lexical form is invalid.
    pub fn to_value(&self) -> Result<Value, crate::PdpError> {
        let data_type = DataType::from_uri(&self.data_type).ok_or_else(|| {
            ConfigError::UnknownDataType {
                uri: self.data_type.clone(),
            }
        })?;
        Ok(data_type.parse(&self.value)?)
    }

    /// Like [`to_value`](Self::to_value), splitting the failure into the
    /// fatal and the recoverable channel.
    pub(crate) fn resolve(&self) -> Result<Value, Fault> {
        let data_type = DataType::from_uri(&self.data_type).ok_or_else(|| {
            ConfigError::UnknownDataType {
                uri: self.data_type.clone(),
            }
        })?;
        data_type
            .parse(&self.value)
            .map_err(|e| Fault::from(EvaluationError::from(e)))
    }
}

impl From<Value> for AttributeValue {
    fn from(v: Value) -> Self {
        Self {
            data_type: v.data_type().uri(),
            value: v.to_string(),
        }
    }
}

macro_rules! attribute_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(v: $ty) -> Self {
                    Value::from(v).into()
                }
            }
        )*
    };
}

attribute_value_from!(i64, f64, bool, &str, String);

/// Lookup of a named attribute in a request category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesignator {
    pub category: String,
    pub attribute_id: String,
    pub data_type: String,
    pub issuer: Option<String>,
    pub must_be_present: bool,
}

impl AttributeDesignator {
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn must_be_present(mut self) -> Self {
        self.must_be_present = true;
        self
    }
}

/// XPath lookup into a category's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub category: String,
    pub path: String,
    pub data_type: String,
    pub context_selector_id: Option<String>,
    pub must_be_present: bool,
    /// Namespace prefix bindings in scope, as `(prefix, uri)`.
    pub namespaces: Vec<(String, String)>,
}

impl AttributeSelector {
    #[must_use]
    pub fn context_selector(mut self, attribute_id: impl Into<String>) -> Self {
        self.context_selector_id = Some(attribute_id.into());
        self
    }

    #[must_use]
    pub fn must_be_present(mut self) -> Self {
        self.must_be_present = true;
        self
    }

    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), uri.into()));
        self
    }
}

/// Start an attribute designator.
///
/// ```
/// use xacml_pdp::{designator, uri};
///
/// let role = designator(uri::category::ACCESS_SUBJECT, "role", uri::data_type::STRING)
///     .must_be_present();
/// assert!(role.must_be_present);
/// ```
pub fn designator(
    category: impl Into<String>,
    attribute_id: impl Into<String>,
    data_type: impl Into<String>,
) -> AttributeDesignator {
    AttributeDesignator {
        category: category.into(),
        attribute_id: attribute_id.into(),
        data_type: data_type.into(),
        issuer: None,
        must_be_present: false,
    }
}

pub fn selector(
    category: impl Into<String>,
    path: impl Into<String>,
    data_type: impl Into<String>,
) -> AttributeSelector {
    AttributeSelector {
        category: category.into(),
        path: path.into(),
        data_type: data_type.into(),
        context_selector_id: None,
        must_be_present: false,
        namespaces: Vec::new(),
    }
}

pub fn apply(
    function: impl Into<String>,
    arguments: impl IntoIterator<Item = Expression>,
) -> Expression {
    Expression::Apply(Apply {
        function: function.into(),
        arguments: arguments.into_iter().collect(),
    })
}

pub fn literal(value: impl Into<AttributeValue>) -> Expression {
    Expression::Value(value.into())
}

pub fn variable(id: impl Into<String>) -> Expression {
    Expression::VariableReference(id.into())
}

pub fn function(uri: impl Into<String>) -> Expression {
    Expression::Function(uri.into())
}

impl From<AttributeDesignator> for Expression {
    fn from(d: AttributeDesignator) -> Self {
        Expression::Designator(d)
    }
}

impl From<AttributeSelector> for Expression {
    fn from(s: AttributeSelector) -> Self {
        Expression::Selector(s)
    }
}

impl From<AttributeValue> for Expression {
    fn from(v: AttributeValue) -> Self {
        Expression::Value(v)
    }
}

fn short(uri: &str) -> &str {
    uri.rsplit([':', '#']).next().unwrap_or(uri)
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Value(v) => write!(f, "{:?}:{}", v.value, short(&v.data_type)),
            Expression::Designator(d) => write!(f, "${}", short(&d.attribute_id)),
            Expression::Selector(s) => write!(f, "${{{}}}", s.path),
            Expression::VariableReference(id) => write!(f, "var({id})"),
            Expression::Function(uri) => write!(f, "&{}", short(uri)),
            Expression::Apply(a) => {
                write!(f, "{}(", short(&a.function))?;
                for (i, arg) in a.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
