//! The evaluation engine: rules, policies, policy sets and references.
//!
//! Every node boundary turns a recoverable [`EvaluationError`] into an
//! indeterminate decision. Obligations, advice and the applicable-policy
//! list are collected in a ledger that each policy and policy set scopes:
//! the caller's ledger is swapped out while the node's body runs, and only
//! entries agreeing with the node's decision are merged back.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::combining::{AlgorithmRegistry, Children};
use crate::config::PdpConfig;
use crate::expression::{condition, evaluate};
use crate::functions::FunctionRegistry;
use crate::matching::match_target;
use crate::repository::PolicyRepository;
use crate::source::AttributeSource;
use crate::types::{
    Advice, AttributeAssignment, CombinerParameter, ConfigError, DateTime, Decision, Effect,
    Evaluated, EvaluationError, EvaluationResult, Fault, IdReference, MatchResult, Obligation,
    ObligationExpression, Policy, PolicyIdentifier, PolicyKind, PolicySet, PolicySetChild, Rule,
    Status, Target, XacmlVersion,
};

/// The root of a policy tree.
#[derive(Debug, Clone)]
pub(crate) enum Root {
    Policy(Arc<Policy>),
    PolicySet(Arc<PolicySet>),
}

/// Registries and settings shared by every evaluation of one PDP.
#[derive(Clone, Copy)]
pub(crate) struct Services<'a> {
    pub(crate) functions: &'a FunctionRegistry,
    pub(crate) algorithms: &'a AlgorithmRegistry,
    pub(crate) repository: &'a dyn PolicyRepository,
    pub(crate) config: &'a PdpConfig,
}

/// A variable's memoized value.
pub(crate) enum Memo {
    Pending,
    Done(Result<Evaluated, EvaluationError>),
}

#[derive(Debug, Default)]
struct Ledger {
    obligations: Vec<Obligation>,
    advice: Vec<Advice>,
    /// Applicable nodes with the effect of their decision, if any.
    policies: Vec<(PolicyIdentifier, Option<Effect>)>,
}

impl Ledger {
    /// Moves the entries agreeing with `effect` into `self`.
    fn absorb(&mut self, inner: Ledger, effect: Effect) {
        self.obligations
            .extend(inner.obligations.into_iter().filter(|o| o.effect == effect));
        self.advice
            .extend(inner.advice.into_iter().filter(|a| a.effect == effect));
        self.policies
            .extend(inner.policies.into_iter().filter(|(_, e)| *e == Some(effect)));
    }
}

/// All state of one individual request's evaluation.
pub(crate) struct EvaluationContext<'a> {
    pub(crate) version: XacmlVersion,
    pub(crate) source: &'a dyn AttributeSource,
    pub(crate) functions: &'a FunctionRegistry,
    algorithms: &'a AlgorithmRegistry,
    repository: &'a dyn PolicyRepository,
    max_reference_depth: usize,
    collect_policies: bool,
    /// Snapshot answering the environment's current-* attributes.
    pub(crate) clock: Option<DateTime>,
    pub(crate) variables: HashMap<String, Memo>,
    ledger: Ledger,
    /// Ids of the policy sets being evaluated, outermost first.
    chain: Vec<String>,
    references: usize,
    first_error: Option<EvaluationError>,
}

impl<'a> EvaluationContext<'a> {
    pub(crate) fn new(
        services: Services<'a>,
        version: XacmlVersion,
        source: &'a dyn AttributeSource,
        collect_policies: bool,
    ) -> Self {
        let config = services.config;
        Self {
            version,
            source,
            functions: services.functions,
            algorithms: services.algorithms,
            repository: services.repository,
            max_reference_depth: config.max_reference_depth,
            collect_policies: collect_policies || config.return_policy_id_list,
            clock: config.supply_environment_clock.then(DateTime::now_utc),
            variables: HashMap::new(),
            ledger: Ledger::default(),
            chain: Vec::new(),
            references: 0,
            first_error: None,
        }
    }

    /// Evaluate the whole tree and package the result.
    pub(crate) fn evaluate_root(mut self, root: &Root) -> Result<EvaluationResult, ConfigError> {
        let decision = match root {
            Root::Policy(policy) => self.evaluate_policy(policy)?,
            Root::PolicySet(set) => self.evaluate_policy_set(set)?,
        };
        let status = if decision.is_indeterminate() {
            let err = self.first_error.take().unwrap_or_else(|| {
                EvaluationError::processing("no decision could be reached")
            });
            Status::from(&err)
        } else {
            Status::ok()
        };
        let mut result = EvaluationResult::new(decision, status);
        result.obligations = self.ledger.obligations;
        result.advice = self.ledger.advice;
        result.applicable_policies = self.ledger.policies.into_iter().map(|(id, _)| id).collect();
        Ok(result)
    }

    fn record(&mut self, err: EvaluationError) {
        trace!(status = %err.status, message = %err.message, "evaluation error");
        self.first_error.get_or_insert(err);
    }

    /// The indeterminate decision for a failure whose effect is unknown.
    fn indeterminate(&mut self, err: EvaluationError) -> Decision {
        self.record(err);
        if self.version.is_v3() {
            Decision::IndeterminateDP
        } else {
            Decision::Indeterminate
        }
    }

    /// The indeterminate decision for a failure in a node that could only
    /// have produced `effect`.
    fn indeterminate_for(&mut self, err: EvaluationError, effect: Effect) -> Decision {
        self.record(err);
        if self.version.is_v3() {
            effect.indeterminate()
        } else {
            Decision::Indeterminate
        }
    }

    fn evaluate_rule(&mut self, rule: &Rule, policy: &Policy) -> Result<Decision, ConfigError> {
        let decision = match match_target(rule_target(rule, policy), self)? {
            MatchResult::NoMatch => Decision::NotApplicable,
            MatchResult::Indeterminate(err) => self.indeterminate_for(err, rule.effect),
            MatchResult::Match => self.evaluate_rule_body(rule, policy)?,
        };
        trace!(rule = %rule.id, %decision, "rule evaluated");
        Ok(decision)
    }

    fn evaluate_rule_body(&mut self, rule: &Rule, policy: &Policy) -> Result<Decision, ConfigError> {
        if let Some(expr) = &rule.condition {
            match condition(expr, Some(policy), self) {
                Ok(true) => {}
                Ok(false) => return Ok(Decision::NotApplicable),
                Err(fault) => {
                    let err = fault.into_recoverable()?;
                    return Ok(self.indeterminate_for(err, rule.effect));
                }
            }
        }
        if self.version.is_v3() {
            if let Err(fault) =
                self.discharge(&rule.obligations, &rule.advice, rule.effect, Some(policy))
            {
                let err = fault.into_recoverable()?;
                return Ok(self.indeterminate_for(err, rule.effect));
            }
        }
        Ok(rule.effect.decision())
    }

    /// Evaluates the obligations and advice for `effect` into the current
    /// ledger. Nothing is added unless every assignment succeeds.
    fn discharge(
        &mut self,
        obligations: &[ObligationExpression],
        advice: &[ObligationExpression],
        effect: Effect,
        scope: Option<&Policy>,
    ) -> Result<(), Fault> {
        let obligations = self.instantiate(obligations, effect, scope)?;
        let advice = self.instantiate(advice, effect, scope)?;
        self.ledger.obligations.extend(obligations);
        self.ledger.advice.extend(advice);
        Ok(())
    }

    fn instantiate(
        &mut self,
        expressions: &[ObligationExpression],
        effect: Effect,
        scope: Option<&Policy>,
    ) -> Result<Vec<Obligation>, Fault> {
        let mut out = Vec::new();
        for expression in expressions.iter().filter(|o| o.effect == effect) {
            let mut assignments = Vec::new();
            for assignment in &expression.assignments {
                let values = match evaluate(&assignment.expression, scope, self)? {
                    Evaluated::Value(v) => vec![v],
                    Evaluated::Bag(bag) => bag.values,
                    Evaluated::Function(f) => {
                        return Err(EvaluationError::processing(format!(
                            "attribute assignment '{}' evaluated to function {}",
                            assignment.attribute_id, f.uri
                        ))
                        .into())
                    }
                };
                assignments.extend(values.into_iter().map(|value| AttributeAssignment {
                    attribute_id: assignment.attribute_id.clone(),
                    category: assignment.category.clone(),
                    issuer: assignment.issuer.clone(),
                    value,
                }));
            }
            out.push(Obligation {
                id: expression.id.clone(),
                effect,
                assignments,
            });
        }
        Ok(out)
    }

    /// Runs `body` against a fresh ledger, then keeps what agrees with the
    /// resulting decision, adds the node's own obligations and advice, and
    /// lists the node itself when it applied.
    fn scoped(
        &mut self,
        identifier: PolicyIdentifier,
        obligations: &[ObligationExpression],
        advice: &[ObligationExpression],
        scope: Option<&Policy>,
        body: impl FnOnce(&mut Self) -> Result<Decision, ConfigError>,
    ) -> Result<Decision, ConfigError> {
        let outer = mem::take(&mut self.ledger);
        let result = body(self);
        let inner = mem::replace(&mut self.ledger, outer);
        let mut decision = result?;

        if let Some(effect) = decision.effect() {
            let mut kept = Ledger::default();
            kept.absorb(inner, effect);
            let saved = mem::replace(&mut self.ledger, kept);
            let discharged = self.discharge(obligations, advice, effect, scope);
            let kept = mem::replace(&mut self.ledger, saved);
            match discharged {
                Ok(()) => self.ledger.absorb(kept, effect),
                Err(fault) => {
                    let err = fault.into_recoverable()?;
                    decision = self.indeterminate_for(err, effect);
                }
            }
        }
        if self.collect_policies && decision != Decision::NotApplicable {
            self.ledger.policies.push((identifier, decision.effect()));
        }
        Ok(decision)
    }

    /// Variable values are memoized for the duration of one policy only.
    pub(crate) fn evaluate_policy(&mut self, policy: &Policy) -> Result<Decision, ConfigError> {
        let outer = mem::take(&mut self.variables);
        let decision = self.evaluate_policy_in_scope(policy);
        self.variables = outer;
        decision
    }

    fn evaluate_policy_in_scope(&mut self, policy: &Policy) -> Result<Decision, ConfigError> {
        let target_indeterminate = match match_target(policy.target.as_ref(), self)? {
            MatchResult::Match => false,
            MatchResult::NoMatch => {
                debug!(policy = %policy.id, "policy not applicable");
                return Ok(Decision::NotApplicable);
            }
            MatchResult::Indeterminate(err) if !self.version.is_v3() => {
                let decision = self.indeterminate(err);
                debug!(policy = %policy.id, %decision, "policy target indeterminate");
                return Ok(decision);
            }
            MatchResult::Indeterminate(err) => {
                self.record(err);
                true
            }
        };
        let algorithm = self.algorithms.require(&policy.rule_combining)?;
        let identifier = PolicyIdentifier {
            kind: PolicyKind::Policy,
            id: policy.id.clone(),
            version: policy.version.clone(),
        };

        let decision = self.scoped(
            identifier,
            &policy.obligations,
            &policy.advice,
            Some(policy),
            |ctx| {
                let version = ctx.version;
                let mut children = RuleChildren {
                    ctx,
                    policy,
                    applicable: Vec::new(),
                };
                let decision =
                    algorithm.combine(&mut children, &policy.combiner_parameters, version)?;
                Ok(settle(decision, &children.applicable, version, target_indeterminate))
            },
        )?;
        debug!(policy = %policy.id, version = %policy.version, %decision, "policy evaluated");
        Ok(decision)
    }

    pub(crate) fn evaluate_policy_set(&mut self, set: &PolicySet) -> Result<Decision, ConfigError> {
        let target_indeterminate = match match_target(set.target.as_ref(), self)? {
            MatchResult::Match => false,
            MatchResult::NoMatch => {
                debug!(policy_set = %set.id, "policy set not applicable");
                return Ok(Decision::NotApplicable);
            }
            MatchResult::Indeterminate(err) if !self.version.is_v3() => {
                let decision = self.indeterminate(err);
                debug!(policy_set = %set.id, %decision, "policy set target indeterminate");
                return Ok(decision);
            }
            MatchResult::Indeterminate(err) => {
                self.record(err);
                true
            }
        };
        let algorithm = self.algorithms.require(&set.policy_combining)?;
        let identifier = PolicyIdentifier {
            kind: PolicyKind::PolicySet,
            id: set.id.clone(),
            version: set.version.clone(),
        };

        self.chain.push(set.id.clone());
        let decision = self.scoped(identifier, &set.obligations, &set.advice, None, |ctx| {
            let version = ctx.version;
            let mut children = SetChildren {
                ctx,
                set,
                applicable: Vec::new(),
            };
            let decision = algorithm.combine(&mut children, &set.combiner_parameters, version)?;
            Ok(settle(decision, &children.applicable, version, target_indeterminate))
        });
        self.chain.pop();
        let decision = decision?;
        debug!(policy_set = %set.id, version = %set.version, %decision, "policy set evaluated");
        Ok(decision)
    }

    /// Resolves a reference, failing safely on cycles, excessive depth and
    /// unknown ids.
    fn resolve(&self, child: &PolicySetChild) -> Result<Resolved, EvaluationError> {
        let (reference, kind) = match child {
            PolicySetChild::Policy(policy) => return Ok(Resolved::Policy(policy.clone())),
            PolicySetChild::PolicySet(set) => return Ok(Resolved::PolicySet(set.clone())),
            PolicySetChild::PolicyRef(r) => (r, PolicyKind::Policy),
            PolicySetChild::PolicySetRef(r) => (r, PolicyKind::PolicySet),
        };
        if self.references >= self.max_reference_depth {
            warn!(reference = %reference.id, depth = self.references, "reference depth exceeded");
            return Err(EvaluationError::processing(format!(
                "reference to '{}' exceeds the maximum depth of {}",
                reference.id, self.max_reference_depth
            )));
        }
        if kind == PolicyKind::PolicySet && self.chain.contains(&reference.id) {
            warn!(reference = %reference.id, chain = ?self.chain, "reference cycle");
            return Err(EvaluationError::processing(format!(
                "reference cycle through '{}'",
                reference.id
            )));
        }
        let resolved = match kind {
            PolicyKind::Policy => self.lookup_policy(reference).map(Resolved::Policy),
            PolicyKind::PolicySet => self.lookup_policy_set(reference).map(Resolved::PolicySet),
        };
        resolved.ok_or_else(|| {
            warn!(reference = %reference.id, "unresolved reference");
            EvaluationError::processing(format!("reference not found: '{}'", reference.id))
        })
    }

    fn lookup_policy(&self, reference: &IdReference) -> Option<Arc<Policy>> {
        self.repository
            .resolve_policy(&reference.id, &reference.constraints)
    }

    fn lookup_policy_set(&self, reference: &IdReference) -> Option<Arc<PolicySet>> {
        self.repository
            .resolve_policy_set(&reference.id, &reference.constraints)
    }

    fn evaluate_child(&mut self, child: &PolicySetChild) -> Result<Decision, ConfigError> {
        let resolved = match self.resolve(child) {
            Ok(resolved) => resolved,
            Err(err) => return Ok(self.indeterminate(err)),
        };
        let is_reference = matches!(
            child,
            PolicySetChild::PolicyRef(_) | PolicySetChild::PolicySetRef(_)
        );
        if is_reference {
            self.references += 1;
        }
        let decision = match &resolved {
            Resolved::Policy(policy) => self.evaluate_policy(policy),
            Resolved::PolicySet(set) => self.evaluate_policy_set(set),
        };
        if is_reference {
            self.references -= 1;
        }
        decision
    }

    fn child_applicable(&mut self, child: &PolicySetChild) -> Result<MatchResult, ConfigError> {
        let resolved = match self.resolve(child) {
            Ok(resolved) => resolved,
            Err(err) => return Ok(MatchResult::Indeterminate(err)),
        };
        match &resolved {
            Resolved::Policy(policy) => match_target(policy.target.as_ref(), self),
            Resolved::PolicySet(set) => match_target(set.target.as_ref(), self),
        }
    }
}

enum Resolved {
    Policy(Arc<Policy>),
    PolicySet(Arc<PolicySet>),
}

/// A rule without a target of its own is scoped by the enclosing policy's.
fn rule_target<'p>(rule: &'p Rule, policy: &'p Policy) -> Option<&'p Target> {
    rule.target.as_ref().or(policy.target.as_ref())
}

/// Post-processing shared by policies and policy sets: before 3.0 a body
/// in which no child applied is NotApplicable whatever the algorithm
/// says, and in 3.0 an indeterminate target weakens the decision.
fn settle(
    decision: Decision,
    applicable: &[bool],
    version: XacmlVersion,
    target_indeterminate: bool,
) -> Decision {
    if !version.is_v3() && !applicable.iter().any(|&a| a) {
        Decision::NotApplicable
    } else if target_indeterminate {
        decision.promote_for_indeterminate_target()
    } else {
        decision
    }
}

/// Rules of a policy, seen by its rule-combining algorithm.
struct RuleChildren<'c, 'a> {
    ctx: &'c mut EvaluationContext<'a>,
    policy: &'c Policy,
    applicable: Vec<bool>,
}

impl Children for RuleChildren<'_, '_> {
    fn len(&self) -> usize {
        self.policy.rules.len()
    }

    fn evaluate(&mut self, index: usize) -> Result<Decision, ConfigError> {
        let decision = self.ctx.evaluate_rule(&self.policy.rules[index], self.policy)?;
        self.applicable.push(decision != Decision::NotApplicable);
        Ok(decision)
    }

    fn is_applicable(&mut self, index: usize) -> Result<MatchResult, ConfigError> {
        let rule = &self.policy.rules[index];
        let target = rule_target(rule, self.policy);
        let result = match_target(target, self.ctx)?;
        self.applicable.push(!matches!(result, MatchResult::NoMatch));
        if let MatchResult::Indeterminate(err) = &result {
            self.ctx.record(err.clone());
        }
        Ok(result)
    }

    fn effect_hint(&self, index: usize) -> Option<Effect> {
        Some(self.policy.rules[index].effect)
    }

    fn parameters(&self, index: usize) -> &[CombinerParameter] {
        self.policy.rule_parameters(&self.policy.rules[index].id)
    }
}

/// Children of a policy set, seen by its policy-combining algorithm.
struct SetChildren<'c, 'a> {
    ctx: &'c mut EvaluationContext<'a>,
    set: &'c PolicySet,
    applicable: Vec<bool>,
}

impl Children for SetChildren<'_, '_> {
    fn len(&self) -> usize {
        self.set.children.len()
    }

    fn evaluate(&mut self, index: usize) -> Result<Decision, ConfigError> {
        let decision = self.ctx.evaluate_child(&self.set.children[index])?;
        self.applicable.push(decision != Decision::NotApplicable);
        Ok(decision)
    }

    fn is_applicable(&mut self, index: usize) -> Result<MatchResult, ConfigError> {
        let result = self.ctx.child_applicable(&self.set.children[index])?;
        self.applicable.push(!matches!(result, MatchResult::NoMatch));
        if let MatchResult::Indeterminate(err) = &result {
            self.ctx.record(err.clone());
        }
        Ok(result)
    }

    fn effect_hint(&self, _index: usize) -> Option<Effect> {
        None
    }

    fn parameters(&self, index: usize) -> &[CombinerParameter] {
        self.set.child_parameters(self.set.children[index].id())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::repository::InMemoryRepository;
    use crate::source::RequestAttributeSource;
    use crate::types::Request;

    /// Runs `f` with a context over `request` and the standard registries.
    pub(crate) fn with_context<R>(
        request: &Request,
        f: impl FnOnce(&mut EvaluationContext<'_>) -> R,
    ) -> R {
        let repository = InMemoryRepository::new();
        let config = PdpConfig::default();
        let services = Services {
            functions: FunctionRegistry::standard(),
            algorithms: AlgorithmRegistry::standard(),
            repository: &repository,
            config: &config,
        };
        let source = RequestAttributeSource::new(request);
        let mut ctx = EvaluationContext::new(services, request.version, &source, false);
        f(&mut ctx)
    }
}
