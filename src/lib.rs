//! An XACML policy decision point covering versions 1.0 through 3.0.
//!
//! Policies are built in memory, validated once by [`PdpBuilder::build`],
//! and evaluated concurrently against [`Request`]s. The request's version
//! selects the evaluation semantics, so one [`Pdp`] serves 2.0 and 3.0
//! clients alike.
//!
//! ```
//! use xacml_pdp::{
//!     apply, designator, literal, Decision, Effect, PdpBuilder, Policy, XacmlVersion, uri,
//! };
//!
//! let doctors_read = Policy::builder("records", uri::algorithm::RULE_DENY_OVERRIDES)
//!     .rule("doctors-read", Effect::Permit, |r| {
//!         r.when(apply(
//!             "urn:oasis:names:tc:xacml:1.0:function:string-is-in",
//!             [
//!                 literal("doctor"),
//!                 designator(uri::category::ACCESS_SUBJECT, "role", uri::data_type::STRING).into(),
//!             ],
//!         ))
//!     })
//!     .build();
//!
//! let pdp = PdpBuilder::new().root_policy(doctors_read).build().unwrap();
//!
//! let request = pdp
//!     .request()
//!     .attribute(uri::category::ACCESS_SUBJECT, "role", "doctor")
//!     .build();
//! assert_eq!(pdp.evaluate(&request).unwrap()[0].decision, Decision::Permit);
//!
//! let legacy = xacml_pdp::Request::builder(XacmlVersion::V2_0)
//!     .attribute(uri::category::ACCESS_SUBJECT, "role", "nurse")
//!     .build();
//! assert_eq!(pdp.evaluate(&legacy).unwrap()[0].decision, Decision::NotApplicable);
//! ```

mod combining;
mod compile;
mod config;
mod error;
mod evaluate;
mod expression;
mod functions;
mod matching;
mod multi;
mod pdp;
mod repository;
mod source;
mod types;

pub mod parse;
pub mod uri;

pub use combining::{
    AlgorithmRegistry, Children, CombiningAlgorithm, FirstApplicable, OnlyOneApplicable,
    Overrides, Unless,
};
pub use config::PdpConfig;
pub use error::PdpError;
pub use functions::{CompareOp, Function, FunctionContext, FunctionRegistry};
pub use pdp::{Pdp, PdpBuilder};
pub use repository::{InMemoryRepository, PolicyRepository, VersionComponent, VersionConstraints};
pub use source::{AttributeSource, RequestAttributeSource};
pub use types::{
    Advice, AdviceExpression, AllOf, AnyOf, Apply, Attribute, AttributeAssignment,
    AttributeAssignmentExpression, AttributeDesignator, AttributeSelector, AttributeValue,
    Attributes, Bag, CombinerParameter, ConfigError, DataType, Date, DateTime, DayTimeDuration,
    Decision, Effect, Evaluated, EvaluationError, EvaluationResult, Expression, FunctionRef,
    IdReference, Match, MatchResult, MatchSource, Obligation, ObligationExpression, Policy,
    PolicyBuilder, PolicyIdentifier, PolicyKind, PolicySet, PolicySetBuilder, PolicySetChild,
    Request, RequestBuilder, RequestReference, Rfc822Name, Rule, Status, StatusCode, Target, Time,
    Value, VariableDefinition, X500Name, XacmlVersion, YearMonthDuration, apply, designator,
    function, literal, selector, variable,
};
