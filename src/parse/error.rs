use std::fmt;

/// Errors produced when parsing the lexical form of a datatype value or a
/// policy version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build an error for `input` that is not a valid `kind` literal.
    pub(crate) fn invalid(kind: &str, input: &str, detail: impl fmt::Display) -> Self {
        Self::new(format!("invalid {kind} '{input}': {detail}"))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}
