use proptest::prelude::*;
use xacml_pdp::{
    AlgorithmRegistry, Children, CombinerParameter, ConfigError, Decision, Effect,
    EvaluationError, MatchResult, XacmlVersion,
};

const DECISIONS: &[Decision] = &[
    Decision::Permit,
    Decision::Deny,
    Decision::NotApplicable,
    Decision::Indeterminate,
    Decision::IndeterminateD,
    Decision::IndeterminateP,
    Decision::IndeterminateDP,
];

/// Decisions a pre-3.0 child can produce.
const LEGACY_DECISIONS: &[Decision] = &[
    Decision::Permit,
    Decision::Deny,
    Decision::NotApplicable,
    Decision::Indeterminate,
];

const VERSIONS: &[XacmlVersion] = &[
    XacmlVersion::V1_0,
    XacmlVersion::V1_1,
    XacmlVersion::V2_0,
    XacmlVersion::V3_0,
];

pub fn arb_decision() -> impl Strategy<Value = Decision> {
    prop::sample::select(DECISIONS)
}

pub fn arb_legacy_decision() -> impl Strategy<Value = Decision> {
    prop::sample::select(LEGACY_DECISIONS)
}

pub fn arb_effect() -> impl Strategy<Value = Effect> {
    prop_oneof![Just(Effect::Permit), Just(Effect::Deny)]
}

pub fn arb_version() -> impl Strategy<Value = XacmlVersion> {
    prop::sample::select(VERSIONS)
}

/// Up to eight rule outcomes with their declared effects.
pub fn arb_rules() -> impl Strategy<Value = Vec<(Decision, Effect)>> {
    prop::collection::vec((arb_decision(), arb_effect()), 0..8)
}

/// Up to eight policy outcomes.
pub fn arb_policies() -> impl Strategy<Value = Vec<Decision>> {
    prop::collection::vec(arb_decision(), 0..8)
}

/// Children with fixed outcomes, recording the order of evaluation.
#[derive(Debug, Clone)]
pub struct Fixed {
    pub decisions: Vec<Decision>,
    pub hints: Vec<Option<Effect>>,
    pub evaluated: Vec<usize>,
}

impl Fixed {
    pub fn rules(rules: &[(Decision, Effect)]) -> Self {
        Self {
            decisions: rules.iter().map(|(d, _)| *d).collect(),
            hints: rules.iter().map(|(_, e)| Some(*e)).collect(),
            evaluated: Vec::new(),
        }
    }

    pub fn policies(decisions: &[Decision]) -> Self {
        Self {
            decisions: decisions.to_vec(),
            hints: vec![None; decisions.len()],
            evaluated: Vec::new(),
        }
    }

    /// The same children with Permit and Deny swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            decisions: self.decisions.iter().map(|d| d.mirrored()).collect(),
            hints: self.hints.iter().map(|h| h.map(Effect::opposite)).collect(),
            evaluated: Vec::new(),
        }
    }
}

impl Children for Fixed {
    fn len(&self) -> usize {
        self.decisions.len()
    }

    fn evaluate(&mut self, index: usize) -> Result<Decision, ConfigError> {
        self.evaluated.push(index);
        Ok(self.decisions[index])
    }

    fn is_applicable(&mut self, index: usize) -> Result<MatchResult, ConfigError> {
        Ok(match self.decisions[index] {
            Decision::NotApplicable => MatchResult::NoMatch,
            d if d.is_indeterminate() => {
                MatchResult::Indeterminate(EvaluationError::processing("fixed"))
            }
            _ => MatchResult::Match,
        })
    }

    fn effect_hint(&self, index: usize) -> Option<Effect> {
        self.hints[index]
    }

    fn parameters(&self, _index: usize) -> &[CombinerParameter] {
        &[]
    }
}

/// Combine `children` with the standard algorithm registered under `uri`.
pub fn combine(uri: &str, children: &mut Fixed, version: XacmlVersion) -> Decision {
    AlgorithmRegistry::standard()
        .require(uri)
        .unwrap()
        .combine(children, &[], version)
        .unwrap()
}
