mod decision;
mod error;
mod expr;
mod policy;
mod request;
mod response;
mod target;
mod temporal;
mod value;

pub use decision::{Decision, Effect, MatchResult, XacmlVersion};
pub(crate) use error::Fault;
pub use error::{ConfigError, EvaluationError, StatusCode};
pub use expr::{
    Apply, AttributeDesignator, AttributeSelector, AttributeValue, Expression, apply, designator,
    function, literal, selector, variable,
};
pub use policy::{
    AdviceExpression, AttributeAssignmentExpression, CombinerParameter, IdReference,
    ObligationExpression, Policy, PolicyBuilder, PolicySet, PolicySetBuilder, PolicySetChild,
    Rule, VariableDefinition,
};
pub use request::{Attribute, Attributes, Request, RequestBuilder, RequestReference};
pub use response::{
    Advice, AttributeAssignment, EvaluationResult, Obligation, PolicyIdentifier, PolicyKind,
    Status,
};
pub use target::{AllOf, AnyOf, Match, MatchSource, Target};
pub use temporal::{Date, DateTime, DayTimeDuration, Time, YearMonthDuration};
pub use value::{Bag, DataType, Evaluated, FunctionRef, Rfc822Name, Value, X500Name};
