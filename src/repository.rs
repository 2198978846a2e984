//! Resolution of policy and policy-set references.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::parse::{parse_version, parse_version_pattern};
use crate::types::{Policy, PolicySet};

/// One component of a version match pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionComponent {
    Exact(u64),
    /// `*`: any single component.
    Any,
    /// `+`: any number of subsequent components.
    Rest,
}

/// The `Version`, `EarliestVersion` and `LatestVersion` attributes of a
/// reference. All present constraints must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionConstraints {
    pub version: Option<String>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Compare a version against a pattern, with wildcards matching whatever
/// they cover.
fn compare(version: &[u64], pattern: &[VersionComponent]) -> Ordering {
    let mut components = version.iter();
    for p in pattern {
        match (p, components.next()) {
            (VersionComponent::Rest, _) => return Ordering::Equal,
            (_, None) => return Ordering::Less,
            (VersionComponent::Any, Some(_)) => {}
            (VersionComponent::Exact(n), Some(v)) => match v.cmp(n) {
                Ordering::Equal => {}
                other => return other,
            },
        }
    }
    if components.next().is_some() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl VersionConstraints {
    #[must_use]
    pub fn exact(mut self, pattern: impl Into<String>) -> Self {
        self.version = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn earliest(mut self, pattern: impl Into<String>) -> Self {
        self.earliest = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn latest(mut self, pattern: impl Into<String>) -> Self {
        self.latest = Some(pattern.into());
        self
    }

    /// The patterns that are present, for validation.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        [&self.version, &self.earliest, &self.latest]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }

    /// Whether `version` satisfies every constraint. Malformed versions and
    /// patterns never match.
    #[must_use]
    pub fn matches(&self, version: &str) -> bool {
        let Ok(version) = parse_version(version) else {
            return false;
        };
        let check = |pattern: &Option<String>, accept: fn(Ordering) -> bool| match pattern {
            None => true,
            Some(p) => parse_version_pattern(p)
                .map(|p| accept(compare(&version, &p)))
                .unwrap_or(false),
        };
        check(&self.version, |o| o == Ordering::Equal)
            && check(&self.earliest, |o| o != Ordering::Less)
            && check(&self.latest, |o| o != Ordering::Greater)
    }
}

/// Source of policies and policy sets named by id references.
pub trait PolicyRepository: Send + Sync {
    fn resolve_policy(&self, id: &str, constraints: &VersionConstraints) -> Option<Arc<Policy>>;

    fn resolve_policy_set(
        &self,
        id: &str,
        constraints: &VersionConstraints,
    ) -> Option<Arc<PolicySet>>;
}

/// Repository backed by in-memory maps. When several versions satisfy a
/// reference, the latest wins.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    policies: BTreeMap<String, Vec<Arc<Policy>>>,
    policy_sets: BTreeMap<String, Vec<Arc<PolicySet>>>,
}

fn latest_matching<'a, T>(
    candidates: Option<&'a Vec<Arc<T>>>,
    constraints: &VersionConstraints,
    version_of: impl Fn(&T) -> &str,
) -> Option<Arc<T>> {
    candidates?
        .iter()
        .filter(|c| constraints.matches(version_of(c)))
        .max_by_key(|c| parse_version(version_of(c)).unwrap_or_default())
        .cloned()
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_policy(&mut self, policy: impl Into<Arc<Policy>>) {
        let policy = policy.into();
        self.policies
            .entry(policy.id.clone())
            .or_default()
            .push(policy);
    }

    pub fn add_policy_set(&mut self, set: impl Into<Arc<PolicySet>>) {
        let set = set.into();
        self.policy_sets
            .entry(set.id.clone())
            .or_default()
            .push(set);
    }

    pub fn policies(&self) -> impl Iterator<Item = &Arc<Policy>> {
        self.policies.values().flatten()
    }

    pub fn policy_sets(&self) -> impl Iterator<Item = &Arc<PolicySet>> {
        self.policy_sets.values().flatten()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty() && self.policy_sets.is_empty()
    }
}

impl PolicyRepository for InMemoryRepository {
    fn resolve_policy(&self, id: &str, constraints: &VersionConstraints) -> Option<Arc<Policy>> {
        latest_matching(self.policies.get(id), constraints, |p| p.version.as_str())
    }

    fn resolve_policy_set(
        &self,
        id: &str,
        constraints: &VersionConstraints,
    ) -> Option<Arc<PolicySet>> {
        latest_matching(self.policy_sets.get(id), constraints, |ps| ps.version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::algorithm::RULE_FIRST_APPLICABLE;

    fn policy(id: &str, version: &str) -> Policy {
        Policy::builder(id, RULE_FIRST_APPLICABLE)
            .version(version)
            .build()
    }

    #[test]
    fn wildcard_patterns() {
        let exact = |p: &str| VersionConstraints::default().exact(p);
        assert!(exact("1.*").matches("1.7"));
        assert!(!exact("1.*").matches("1.7.1"));
        assert!(exact("1.+").matches("1.7.1"));
        assert!(exact("1.+").matches("1"));
        assert!(!exact("2.+").matches("1.9"));
        assert!(exact("1.0").matches("1.0"));
        assert!(!exact("1.0").matches("1.0.1"));
    }

    #[test]
    fn earliest_and_latest_bounds() {
        let range = VersionConstraints::default().earliest("1.2").latest("2.*");
        assert!(range.matches("1.2"));
        assert!(range.matches("1.10"));
        assert!(range.matches("2.5"));
        assert!(!range.matches("1.1.9"));
        assert!(!range.matches("3.0"));
    }

    #[test]
    fn malformed_versions_never_match() {
        let any = VersionConstraints::default();
        assert!(any.matches("1.0"));
        assert!(!any.matches("one"));
        assert!(!VersionConstraints::default().exact("1.x").matches("1.0"));
    }

    #[test]
    fn resolves_latest_satisfying_version() {
        let mut repo = InMemoryRepository::new();
        repo.add_policy(policy("p", "1.0"));
        repo.add_policy(policy("p", "1.10"));
        repo.add_policy(policy("p", "2.0"));

        let any = repo.resolve_policy("p", &VersionConstraints::default()).unwrap();
        assert_eq!(any.version, "2.0");

        let ones = VersionConstraints::default().exact("1.+");
        assert_eq!(repo.resolve_policy("p", &ones).unwrap().version, "1.10");

        assert!(repo.resolve_policy("q", &ones).is_none());
        assert!(repo
            .resolve_policy_set("p", &VersionConstraints::default())
            .is_none());
    }
}
