use std::collections::BTreeMap;
use std::sync::Arc;

use super::decision::Effect;
use super::expr::{AttributeValue, Expression};
use super::target::Target;
use crate::repository::VersionConstraints;

const DEFAULT_VERSION: &str = "1.0";

/// A single permit or deny statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub effect: Effect,
    pub description: Option<String>,
    /// `None` inherits the enclosing policy's target.
    pub target: Option<Target>,
    /// `None` is equivalent to a literal `true`.
    pub condition: Option<Expression>,
    /// Honoured from 3.0 on.
    pub obligations: Vec<ObligationExpression>,
    pub advice: Vec<AdviceExpression>,
}

impl Rule {
    pub fn new(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            effect,
            description: None,
            target: None,
            condition: None,
            obligations: Vec::new(),
            advice: Vec::new(),
        }
    }

    /// Set the condition expression for this rule.
    #[must_use]
    pub fn when(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn obligation(mut self, obligation: ObligationExpression) -> Self {
        self.obligations.push(obligation);
        self
    }

    #[must_use]
    pub fn advice(mut self, advice: AdviceExpression) -> Self {
        self.advice.push(advice);
        self
    }
}

/// A named expression shared by the conditions of one policy.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub id: String,
    pub expression: Expression,
}

/// An obligation (or advice) to be returned with decisions matching `effect`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObligationExpression {
    pub id: String,
    pub effect: Effect,
    pub assignments: Vec<AttributeAssignmentExpression>,
}

/// Advice has the same shape as an obligation; only its handling by the
/// caller differs.
pub type AdviceExpression = ObligationExpression;

impl ObligationExpression {
    pub fn new(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            effect,
            assignments: Vec::new(),
        }
    }

    #[must_use]
    pub fn assign(mut self, attribute_id: impl Into<String>, expression: Expression) -> Self {
        self.assignments.push(AttributeAssignmentExpression {
            attribute_id: attribute_id.into(),
            category: None,
            issuer: None,
            expression,
        });
        self
    }

    #[must_use]
    pub fn assignment(mut self, assignment: AttributeAssignmentExpression) -> Self {
        self.assignments.push(assignment);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAssignmentExpression {
    pub attribute_id: String,
    pub category: Option<String>,
    pub issuer: Option<String>,
    pub expression: Expression,
}

/// An opaque parameter handed to the combining algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinerParameter {
    pub name: String,
    pub value: AttributeValue,
}

impl CombinerParameter {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A set of rules combined by a rule-combining algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub id: String,
    pub version: String,
    pub description: Option<String>,
    pub target: Option<Target>,
    pub rule_combining: String,
    pub combiner_parameters: Vec<CombinerParameter>,
    /// Per-rule parameters keyed by rule id.
    pub rule_combiner_parameters: BTreeMap<String, Vec<CombinerParameter>>,
    pub variables: Vec<VariableDefinition>,
    pub rules: Vec<Rule>,
    pub obligations: Vec<ObligationExpression>,
    pub advice: Vec<AdviceExpression>,
}

impl Policy {
    pub fn builder(id: impl Into<String>, rule_combining: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder {
            policy: Policy {
                id: id.into(),
                version: DEFAULT_VERSION.to_owned(),
                description: None,
                target: None,
                rule_combining: rule_combining.into(),
                combiner_parameters: Vec::new(),
                rule_combiner_parameters: BTreeMap::new(),
                variables: Vec::new(),
                rules: Vec::new(),
                obligations: Vec::new(),
                advice: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn variable(&self, id: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.id == id)
    }

    #[must_use]
    pub fn rule_parameters(&self, rule_id: &str) -> &[CombinerParameter] {
        self.rule_combiner_parameters
            .get(rule_id)
            .map_or(&[], Vec::as_slice)
    }
}

/// Builder for constructing a [`Policy`].
///
/// ```
/// use xacml_pdp::{Effect, Policy, literal, uri};
///
/// let policy = Policy::builder("p1", uri::algorithm::RULE_DENY_OVERRIDES)
///     .variable("always", literal(true))
///     .rule("allow", Effect::Permit, |r| r.description("everyone"))
///     .build();
/// assert_eq!(policy.rules.len(), 1);
/// assert_eq!(policy.version, "1.0");
/// ```
#[derive(Debug)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.policy.version = version.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.policy.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.policy.target = Some(target);
        self
    }

    #[must_use]
    pub fn variable(mut self, id: impl Into<String>, expression: Expression) -> Self {
        self.policy.variables.push(VariableDefinition {
            id: id.into(),
            expression,
        });
        self
    }

    /// Define a rule. The closure refines the bare rule with a target,
    /// condition and obligations.
    #[must_use]
    pub fn rule(mut self, id: &str, effect: Effect, f: impl FnOnce(Rule) -> Rule) -> Self {
        self.policy.rules.push(f(Rule::new(id, effect)));
        self
    }

    #[must_use]
    pub fn combiner_parameter(mut self, parameter: CombinerParameter) -> Self {
        self.policy.combiner_parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn rule_combiner_parameter(mut self, rule_id: &str, parameter: CombinerParameter) -> Self {
        self.policy
            .rule_combiner_parameters
            .entry(rule_id.to_owned())
            .or_default()
            .push(parameter);
        self
    }

    #[must_use]
    pub fn obligation(mut self, obligation: ObligationExpression) -> Self {
        self.policy.obligations.push(obligation);
        self
    }

    #[must_use]
    pub fn advice(mut self, advice: AdviceExpression) -> Self {
        self.policy.advice.push(advice);
        self
    }

    #[must_use]
    pub fn build(self) -> Policy {
        self.policy
    }
}

/// Reference to a policy or policy set held by a
/// [`PolicyRepository`](crate::PolicyRepository).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdReference {
    pub id: String,
    pub constraints: VersionConstraints,
}

impl IdReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            constraints: VersionConstraints::default(),
        }
    }

    #[must_use]
    pub fn constraints(mut self, constraints: VersionConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicySetChild {
    Policy(Arc<Policy>),
    PolicySet(Arc<PolicySet>),
    PolicyRef(IdReference),
    PolicySetRef(IdReference),
}

impl PolicySetChild {
    /// The id of the child, or of the node it refers to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            PolicySetChild::Policy(p) => &p.id,
            PolicySetChild::PolicySet(ps) => &ps.id,
            PolicySetChild::PolicyRef(r) | PolicySetChild::PolicySetRef(r) => &r.id,
        }
    }
}

impl From<Policy> for PolicySetChild {
    fn from(p: Policy) -> Self {
        PolicySetChild::Policy(Arc::new(p))
    }
}

impl From<PolicySet> for PolicySetChild {
    fn from(ps: PolicySet) -> Self {
        PolicySetChild::PolicySet(Arc::new(ps))
    }
}

impl From<Arc<Policy>> for PolicySetChild {
    fn from(p: Arc<Policy>) -> Self {
        PolicySetChild::Policy(p)
    }
}

impl From<Arc<PolicySet>> for PolicySetChild {
    fn from(ps: Arc<PolicySet>) -> Self {
        PolicySetChild::PolicySet(ps)
    }
}

/// A set of policies, policy sets and references combined by a
/// policy-combining algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySet {
    pub id: String,
    pub version: String,
    pub description: Option<String>,
    pub target: Option<Target>,
    pub policy_combining: String,
    pub combiner_parameters: Vec<CombinerParameter>,
    /// Per-child parameters keyed by child (or referenced) id.
    pub child_combiner_parameters: BTreeMap<String, Vec<CombinerParameter>>,
    pub children: Vec<PolicySetChild>,
    pub obligations: Vec<ObligationExpression>,
    pub advice: Vec<AdviceExpression>,
}

impl PolicySet {
    pub fn builder(
        id: impl Into<String>,
        policy_combining: impl Into<String>,
    ) -> PolicySetBuilder {
        PolicySetBuilder {
            set: PolicySet {
                id: id.into(),
                version: DEFAULT_VERSION.to_owned(),
                description: None,
                target: None,
                policy_combining: policy_combining.into(),
                combiner_parameters: Vec::new(),
                child_combiner_parameters: BTreeMap::new(),
                children: Vec::new(),
                obligations: Vec::new(),
                advice: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn child_parameters(&self, child_id: &str) -> &[CombinerParameter] {
        self.child_combiner_parameters
            .get(child_id)
            .map_or(&[], Vec::as_slice)
    }
}

/// Builder for constructing a [`PolicySet`].
#[derive(Debug)]
pub struct PolicySetBuilder {
    set: PolicySet,
}

impl PolicySetBuilder {
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.set.version = version.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.set.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.set.target = Some(target);
        self
    }

    /// Append an inline policy or policy set.
    #[must_use]
    pub fn child(mut self, child: impl Into<PolicySetChild>) -> Self {
        self.set.children.push(child.into());
        self
    }

    #[must_use]
    pub fn policy_ref(mut self, reference: IdReference) -> Self {
        self.set.children.push(PolicySetChild::PolicyRef(reference));
        self
    }

    #[must_use]
    pub fn policy_set_ref(mut self, reference: IdReference) -> Self {
        self.set
            .children
            .push(PolicySetChild::PolicySetRef(reference));
        self
    }

    #[must_use]
    pub fn combiner_parameter(mut self, parameter: CombinerParameter) -> Self {
        self.set.combiner_parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn child_combiner_parameter(
        mut self,
        child_id: &str,
        parameter: CombinerParameter,
    ) -> Self {
        self.set
            .child_combiner_parameters
            .entry(child_id.to_owned())
            .or_default()
            .push(parameter);
        self
    }

    #[must_use]
    pub fn obligation(mut self, obligation: ObligationExpression) -> Self {
        self.set.obligations.push(obligation);
        self
    }

    #[must_use]
    pub fn advice(mut self, advice: AdviceExpression) -> Self {
        self.set.advice.push(advice);
        self
    }

    #[must_use]
    pub fn build(self) -> PolicySet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::expr::literal;
    use crate::uri;

    #[test]
    fn builder_collects_rules_in_order() {
        let policy = Policy::builder("p", uri::algorithm::RULE_FIRST_APPLICABLE)
            .rule("a", Effect::Deny, |r| r)
            .rule("b", Effect::Permit, |r| r.when(literal(true)))
            .rule_combiner_parameter("b", CombinerParameter::new("weight", 2_i64))
            .build();
        let ids: Vec<&str> = policy.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(policy.rules[1].condition.is_some());
        assert_eq!(policy.rule_parameters("b").len(), 1);
        assert!(policy.rule_parameters("a").is_empty());
    }

    #[test]
    fn variable_lookup() {
        let policy = Policy::builder("p", uri::algorithm::RULE_FIRST_APPLICABLE)
            .variable("v", literal(1_i64))
            .build();
        assert!(policy.variable("v").is_some());
        assert!(policy.variable("w").is_none());
    }

    #[test]
    fn child_ids_cover_references() {
        let set = PolicySet::builder("root", uri::algorithm::POLICY_FIRST_APPLICABLE)
            .child(Policy::builder("inline", uri::algorithm::RULE_FIRST_APPLICABLE).build())
            .policy_ref(IdReference::new("remote"))
            .build();
        let ids: Vec<&str> = set.children.iter().map(PolicySetChild::id).collect();
        assert_eq!(ids, ["inline", "remote"]);
    }
}
