//! Rule- and policy-combining algorithms.
//!
//! An algorithm sees its children only through [`Children`], which
//! evaluates them lazily: an algorithm that stops early never evaluates
//! the remaining children, and none is evaluated twice.

mod applicable;
mod overrides;
mod unless;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::types::{CombinerParameter, ConfigError, Decision, Effect, MatchResult, XacmlVersion};
use crate::uri::algorithm as alg;

pub use applicable::{FirstApplicable, OnlyOneApplicable};
pub use overrides::Overrides;
pub use unless::Unless;

/// The children of a policy or policy set, as seen by a combining
/// algorithm.
pub trait Children {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate child `index` to its decision.
    ///
    /// # Errors
    ///
    /// Only fatal configuration errors; evaluation failures are reported
    /// as an indeterminate decision.
    fn evaluate(&mut self, index: usize) -> Result<Decision, ConfigError>;

    /// Evaluate only the target of child `index`.
    ///
    /// # Errors
    ///
    /// Fatal configuration errors, as for [`Children::evaluate`].
    fn is_applicable(&mut self, index: usize) -> Result<MatchResult, ConfigError>;

    /// The declared effect of a rule child; `None` for policies.
    fn effect_hint(&self, index: usize) -> Option<Effect>;

    /// Combiner parameters attached to child `index`.
    fn parameters(&self, index: usize) -> &[CombinerParameter];
}

/// A combining algorithm, registered under one or more URIs.
pub trait CombiningAlgorithm: Send + Sync {
    /// # Errors
    ///
    /// Propagates fatal errors raised while evaluating children.
    fn combine(
        &self,
        children: &mut dyn Children,
        parameters: &[CombinerParameter],
        version: XacmlVersion,
    ) -> Result<Decision, ConfigError>;
}

/// Ordered map from algorithm URI to implementation.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<String, Arc<dyn CombiningAlgorithm>>,
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.algorithms.keys()).finish()
    }
}

static STANDARD: OnceLock<AlgorithmRegistry> = OnceLock::new();

impl AlgorithmRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard 1.0, 1.1 and 3.0 algorithms.
    pub fn standard() -> &'static AlgorithmRegistry {
        STANDARD.get_or_init(|| {
            let mut registry = AlgorithmRegistry::new();
            let deny_overrides = Arc::new(Overrides::new(Effect::Deny));
            let permit_overrides = Arc::new(Overrides::new(Effect::Permit));
            for uri in [
                alg::RULE_DENY_OVERRIDES_V1,
                alg::RULE_ORDERED_DENY_OVERRIDES_V1,
                alg::RULE_DENY_OVERRIDES,
                alg::RULE_ORDERED_DENY_OVERRIDES,
            ] {
                registry.register(uri, deny_overrides.clone());
            }
            for uri in [
                alg::RULE_PERMIT_OVERRIDES_V1,
                alg::RULE_ORDERED_PERMIT_OVERRIDES_V1,
                alg::RULE_PERMIT_OVERRIDES,
                alg::RULE_ORDERED_PERMIT_OVERRIDES,
            ] {
                registry.register(uri, permit_overrides.clone());
            }
            for uri in [
                alg::POLICY_DENY_OVERRIDES_V1,
                alg::POLICY_ORDERED_DENY_OVERRIDES_V1,
                alg::POLICY_DENY_OVERRIDES,
                alg::POLICY_ORDERED_DENY_OVERRIDES,
            ] {
                registry.register(uri, deny_overrides.clone());
            }
            for uri in [
                alg::POLICY_PERMIT_OVERRIDES_V1,
                alg::POLICY_ORDERED_PERMIT_OVERRIDES_V1,
                alg::POLICY_PERMIT_OVERRIDES,
                alg::POLICY_ORDERED_PERMIT_OVERRIDES,
            ] {
                registry.register(uri, permit_overrides.clone());
            }
            registry.register(alg::RULE_FIRST_APPLICABLE, Arc::new(FirstApplicable));
            registry.register(alg::POLICY_FIRST_APPLICABLE, Arc::new(FirstApplicable));
            registry.register(alg::POLICY_ONLY_ONE_APPLICABLE, Arc::new(OnlyOneApplicable));
            let deny_unless_permit = Arc::new(Unless::new(Effect::Permit));
            let permit_unless_deny = Arc::new(Unless::new(Effect::Deny));
            registry.register(alg::RULE_DENY_UNLESS_PERMIT, deny_unless_permit.clone());
            registry.register(alg::POLICY_DENY_UNLESS_PERMIT, deny_unless_permit);
            registry.register(alg::RULE_PERMIT_UNLESS_DENY, permit_unless_deny.clone());
            registry.register(alg::POLICY_PERMIT_UNLESS_DENY, permit_unless_deny);
            registry
        })
    }

    /// Register (or replace) an algorithm.
    pub fn register(&mut self, uri: impl Into<String>, algorithm: Arc<dyn CombiningAlgorithm>) {
        self.algorithms.insert(uri.into(), algorithm);
    }

    #[must_use]
    pub fn get(&self, uri: &str) -> Option<Arc<dyn CombiningAlgorithm>> {
        self.algorithms.get(uri).cloned()
    }

    /// Like [`AlgorithmRegistry::get`], failing on an unknown URI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCombiningAlgorithm`].
    pub fn require(&self, uri: &str) -> Result<Arc<dyn CombiningAlgorithm>, ConfigError> {
        self.get(uri)
            .ok_or_else(|| ConfigError::UnknownCombiningAlgorithm {
                uri: uri.to_owned(),
            })
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.algorithms.contains_key(uri)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}

/// The indeterminate decision an algorithm reports for its own failures.
fn indeterminate(version: XacmlVersion) -> Decision {
    if version.is_v3() {
        Decision::IndeterminateDP
    } else {
        Decision::Indeterminate
    }
}
