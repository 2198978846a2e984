use std::fmt;

use thiserror::Error;

/// Fatal deployment errors: the policy tree or the registries are
/// misconfigured and no safe decision exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown combining algorithm '{uri}'")]
    UnknownCombiningAlgorithm { uri: String },

    #[error("unknown function '{uri}'")]
    UnknownFunction { uri: String },

    #[error("unknown data type '{uri}'")]
    UnknownDataType { uri: String },

    #[error("undefined variable '{variable}' in policy '{policy}'")]
    UndefinedVariable { policy: String, variable: String },

    #[error("cyclic variable definitions: {}", path.join(" -> "))]
    CyclicVariable { path: Vec<String> },

    #[error("duplicate rule id '{rule}' in policy '{policy}'")]
    DuplicateRule { policy: String, rule: String },

    #[error("duplicate variable id '{variable}' in policy '{policy}'")]
    DuplicateVariable { policy: String, variable: String },

    #[error("malformed policy '{policy}': {reason}")]
    MalformedPolicy { policy: String, reason: String },

    #[error("no root policy or policy set configured")]
    MissingPolicy,
}

/// XACML status codes reported alongside a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusCode {
    #[default]
    Ok,
    MissingAttribute,
    SyntaxError,
    ProcessingError,
}

impl StatusCode {
    #[must_use]
    pub fn uri(self) -> &'static str {
        match self {
            StatusCode::Ok => "urn:oasis:names:tc:xacml:1.0:status:ok",
            StatusCode::MissingAttribute => "urn:oasis:names:tc:xacml:1.0:status:missing-attribute",
            StatusCode::SyntaxError => "urn:oasis:names:tc:xacml:1.0:status:syntax-error",
            StatusCode::ProcessingError => "urn:oasis:names:tc:xacml:1.0:status:processing-error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// A recoverable evaluation failure. Converted into an Indeterminate
/// decision or match result at the nearest node boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct EvaluationError {
    pub status: StatusCode,
    pub message: String,
}

impl EvaluationError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn missing_attribute(message: impl Into<String>) -> Self {
        Self::new(StatusCode::MissingAttribute, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SyntaxError, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProcessingError, message)
    }
}

/// Either failure channel, as seen by the expression evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum Fault {
    #[error(transparent)]
    Indeterminate(#[from] EvaluationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Fault {
    /// The recoverable error, or the fatal one as `Err`.
    pub(crate) fn into_recoverable(self) -> Result<EvaluationError, ConfigError> {
        match self {
            Fault::Indeterminate(err) => Ok(err),
            Fault::Config(err) => Err(err),
        }
    }
}

impl From<crate::parse::ParseError> for EvaluationError {
    fn from(err: crate::parse::ParseError) -> Self {
        EvaluationError::syntax(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_message() {
        let err = ConfigError::UnknownCombiningAlgorithm {
            uri: "urn:example:alg".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown combining algorithm 'urn:example:alg'"
        );
    }

    #[test]
    fn cyclic_variable_message() {
        let err = ConfigError::CyclicVariable {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic variable definitions: a -> b -> a");
    }

    #[test]
    fn duplicate_rule_message() {
        let err = ConfigError::DuplicateRule {
            policy: "p1".into(),
            rule: "r1".into(),
        };
        assert_eq!(err.to_string(), "duplicate rule id 'r1' in policy 'p1'");
    }

    #[test]
    fn evaluation_error_display_includes_status_uri() {
        let err = EvaluationError::missing_attribute("subject-id");
        assert_eq!(
            err.to_string(),
            "urn:oasis:names:tc:xacml:1.0:status:missing-attribute: subject-id"
        );
    }

    #[test]
    fn fault_conversions() {
        let fault: Fault = EvaluationError::processing("boom").into();
        assert!(matches!(fault, Fault::Indeterminate(_)));
        let fault: Fault = ConfigError::MissingPolicy.into();
        assert!(matches!(fault, Fault::Config(ConfigError::MissingPolicy)));
        assert_eq!(fault.into_recoverable(), Err(ConfigError::MissingPolicy));
    }
}
