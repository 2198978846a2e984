//! Validation run once when a [`Pdp`](crate::Pdp) is built, so that
//! configuration mistakes surface before any request is evaluated.

use std::collections::{HashMap, HashSet};

use crate::combining::AlgorithmRegistry;
use crate::evaluate::Root;
use crate::functions::FunctionRegistry;
use crate::parse::{parse_version, parse_version_pattern};
use crate::repository::InMemoryRepository;
use crate::types::{
    CombinerParameter, ConfigError, DataType, Expression, IdReference, MatchSource,
    ObligationExpression, Policy, PolicySet, PolicySetChild, Target,
};

struct Validator<'a> {
    functions: &'a FunctionRegistry,
    algorithms: &'a AlgorithmRegistry,
}

pub(crate) fn validate(
    root: &Root,
    repository: &InMemoryRepository,
    functions: &FunctionRegistry,
    algorithms: &AlgorithmRegistry,
) -> Result<(), ConfigError> {
    let validator = Validator {
        functions,
        algorithms,
    };
    match root {
        Root::Policy(policy) => validator.policy(policy)?,
        Root::PolicySet(set) => validator.policy_set(set)?,
    }
    for policy in repository.policies() {
        validator.policy(policy)?;
    }
    for set in repository.policy_sets() {
        validator.policy_set(set)?;
    }
    Ok(())
}

fn malformed(owner: &str, reason: String) -> ConfigError {
    ConfigError::MalformedPolicy {
        policy: owner.to_owned(),
        reason,
    }
}

impl Validator<'_> {
    fn policy(&self, policy: &Policy) -> Result<(), ConfigError> {
        let owner = policy.id.as_str();
        check_version(owner, &policy.version)?;
        self.algorithm(&policy.rule_combining)?;
        check_duplicates(policy)?;

        let variables: HashSet<&str> = policy.variables.iter().map(|v| v.id.as_str()).collect();
        let scope = Some(&variables);
        for definition in &policy.variables {
            self.expression(owner, &definition.expression, scope)?;
        }
        check_variable_cycles(policy)?;

        self.target(policy.target.as_ref())?;
        self.parameters(&policy.combiner_parameters)?;
        for (rule_id, parameters) in &policy.rule_combiner_parameters {
            if !policy.rules.iter().any(|r| r.id == *rule_id) {
                return Err(malformed(
                    owner,
                    format!("combiner parameters for unknown rule '{rule_id}'"),
                ));
            }
            self.parameters(parameters)?;
        }
        for rule in &policy.rules {
            self.target(rule.target.as_ref())?;
            if let Some(condition) = &rule.condition {
                self.expression(owner, condition, scope)?;
            }
            self.obligations(owner, &rule.obligations, scope)?;
            self.obligations(owner, &rule.advice, scope)?;
        }
        self.obligations(owner, &policy.obligations, scope)?;
        self.obligations(owner, &policy.advice, scope)
    }

    fn policy_set(&self, set: &PolicySet) -> Result<(), ConfigError> {
        let owner = set.id.as_str();
        check_version(owner, &set.version)?;
        self.algorithm(&set.policy_combining)?;
        self.target(set.target.as_ref())?;
        self.parameters(&set.combiner_parameters)?;
        for parameters in set.child_combiner_parameters.values() {
            self.parameters(parameters)?;
        }
        for child in &set.children {
            match child {
                PolicySetChild::Policy(policy) => self.policy(policy)?,
                PolicySetChild::PolicySet(inner) => self.policy_set(inner)?,
                PolicySetChild::PolicyRef(reference) | PolicySetChild::PolicySetRef(reference) => {
                    reference_patterns(owner, reference)?;
                }
            }
        }
        self.obligations(owner, &set.obligations, None)?;
        self.obligations(owner, &set.advice, None)
    }

    fn algorithm(&self, uri: &str) -> Result<(), ConfigError> {
        self.algorithms.require(uri).map(drop)
    }

    fn function(&self, uri: &str) -> Result<(), ConfigError> {
        if self.functions.contains(uri) {
            Ok(())
        } else {
            Err(ConfigError::UnknownFunction {
                uri: uri.to_owned(),
            })
        }
    }

    fn target(&self, target: Option<&Target>) -> Result<(), ConfigError> {
        let matches = target
            .into_iter()
            .flat_map(|t| &t.any_of)
            .flat_map(|any_of| &any_of.all_of)
            .flat_map(|all_of| &all_of.matches);
        for m in matches {
            self.function(&m.function)?;
            known_data_type(&m.value.data_type)?;
            let data_type = match &m.source {
                MatchSource::Designator(d) => &d.data_type,
                MatchSource::Selector(s) => &s.data_type,
            };
            known_data_type(data_type)?;
        }
        Ok(())
    }

    fn parameters(&self, parameters: &[CombinerParameter]) -> Result<(), ConfigError> {
        for parameter in parameters {
            known_data_type(&parameter.value.data_type)?;
        }
        Ok(())
    }

    fn obligations(
        &self,
        owner: &str,
        obligations: &[ObligationExpression],
        scope: Option<&HashSet<&str>>,
    ) -> Result<(), ConfigError> {
        for assignment in obligations.iter().flat_map(|o| &o.assignments) {
            self.expression(owner, &assignment.expression, scope)?;
        }
        Ok(())
    }

    fn expression(
        &self,
        owner: &str,
        expr: &Expression,
        scope: Option<&HashSet<&str>>,
    ) -> Result<(), ConfigError> {
        match expr {
            Expression::Value(value) => known_data_type(&value.data_type),
            Expression::Designator(d) => known_data_type(&d.data_type),
            Expression::Selector(s) => known_data_type(&s.data_type),
            Expression::VariableReference(id) => {
                if scope.is_some_and(|variables| variables.contains(id.as_str())) {
                    Ok(())
                } else {
                    Err(ConfigError::UndefinedVariable {
                        policy: owner.to_owned(),
                        variable: id.clone(),
                    })
                }
            }
            Expression::Function(uri) => self.function(uri),
            Expression::Apply(apply) => {
                self.function(&apply.function)?;
                for argument in &apply.arguments {
                    self.expression(owner, argument, scope)?;
                }
                Ok(())
            }
        }
    }
}

fn known_data_type(uri: &str) -> Result<(), ConfigError> {
    DataType::from_uri(uri)
        .map(drop)
        .ok_or_else(|| ConfigError::UnknownDataType {
            uri: uri.to_owned(),
        })
}

fn check_version(owner: &str, version: &str) -> Result<(), ConfigError> {
    parse_version(version)
        .map(drop)
        .map_err(|e| malformed(owner, format!("bad version: {e}")))
}

fn reference_patterns(owner: &str, reference: &IdReference) -> Result<(), ConfigError> {
    for pattern in reference.constraints.patterns() {
        parse_version_pattern(pattern).map_err(|e| {
            malformed(
                owner,
                format!("bad version pattern in reference to '{}': {e}", reference.id),
            )
        })?;
    }
    Ok(())
}

fn check_duplicates(policy: &Policy) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for rule in &policy.rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(ConfigError::DuplicateRule {
                policy: policy.id.clone(),
                rule: rule.id.clone(),
            });
        }
    }
    let mut seen = HashSet::new();
    for variable in &policy.variables {
        if !seen.insert(variable.id.as_str()) {
            return Err(ConfigError::DuplicateVariable {
                policy: policy.id.clone(),
                variable: variable.id.clone(),
            });
        }
    }
    Ok(())
}

fn variable_refs<'a>(expr: &'a Expression, refs: &mut Vec<&'a str>) {
    match expr {
        Expression::VariableReference(id) => refs.push(id),
        Expression::Apply(apply) => {
            for argument in &apply.arguments {
                variable_refs(argument, refs);
            }
        }
        Expression::Value(_)
        | Expression::Designator(_)
        | Expression::Selector(_)
        | Expression::Function(_) => {}
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

fn check_variable_cycles(policy: &Policy) -> Result<(), ConfigError> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for definition in &policy.variables {
        let mut refs = Vec::new();
        variable_refs(&definition.expression, &mut refs);
        adj.insert(definition.id.as_str(), refs);
    }

    let mut state: HashMap<&str, DfsState> =
        adj.keys().map(|&k| (k, DfsState::Unvisited)).collect();
    let mut stack = Vec::new();
    for definition in &policy.variables {
        let id = definition.id.as_str();
        if state.get(id) == Some(&DfsState::Unvisited) {
            if let Some(path) = dfs(id, &adj, &mut state, &mut stack) {
                return Err(ConfigError::CyclicVariable { path });
            }
        }
    }
    Ok(())
}

fn dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    state: &mut HashMap<&'a str, DfsState>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    state.insert(node, DfsState::InStack);
    stack.push(node);

    for &neighbor in adj.get(node).into_iter().flatten() {
        match state.get(neighbor) {
            Some(DfsState::InStack) => {
                let start = stack.iter().position(|&n| n == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|&s| s.to_owned()).collect();
                cycle.push(neighbor.to_owned());
                return Some(cycle);
            }
            Some(DfsState::Unvisited) => {
                if let Some(cycle) = dfs(neighbor, adj, state, stack) {
                    return Some(cycle);
                }
            }
            Some(DfsState::Done) | None => {}
        }
    }

    stack.pop();
    state.insert(node, DfsState::Done);
    None
}
