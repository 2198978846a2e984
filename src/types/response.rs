use std::fmt;

use super::decision::{Decision, Effect};
use super::error::{EvaluationError, StatusCode};
use super::request::Attributes;
use super::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    pub code: StatusCode,
    pub message: Option<String>,
}

impl Status {
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }
}

impl From<&EvaluationError> for Status {
    fn from(err: &EvaluationError) -> Self {
        Self {
            code: err.status,
            message: Some(err.message.clone()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// One evaluated attribute assignment of an obligation or advice.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeAssignment {
    pub attribute_id: String,
    pub category: Option<String>,
    pub issuer: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obligation {
    pub id: String,
    pub effect: Effect,
    pub assignments: Vec<AttributeAssignment>,
}

pub type Advice = Obligation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyKind {
    Policy,
    PolicySet,
}

/// A policy or policy set that contributed to the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyIdentifier {
    pub kind: PolicyKind,
    pub id: String,
    pub version: String,
}

/// The outcome of evaluating one individual request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationResult {
    pub decision: Decision,
    pub status: Status,
    pub obligations: Vec<Obligation>,
    pub advice: Vec<Advice>,
    /// Attributes flagged `include_in_result`, grouped by category.
    pub attributes: Vec<Attributes>,
    pub applicable_policies: Vec<PolicyIdentifier>,
}

impl EvaluationResult {
    #[must_use]
    pub fn new(decision: Decision, status: Status) -> Self {
        Self {
            decision,
            status,
            obligations: Vec::new(),
            advice: Vec::new(),
            attributes: Vec::new(),
            applicable_policies: Vec::new(),
        }
    }

    /// An Indeterminate result carrying `err` as its status.
    #[must_use]
    pub fn indeterminate(err: &EvaluationError) -> Self {
        Self::new(Decision::Indeterminate, Status::from(err))
    }

    #[must_use]
    pub fn obligation(&self, id: &str) -> Option<&Obligation> {
        self.obligations.iter().find(|o| o.id == id)
    }
}
