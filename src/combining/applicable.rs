use super::{indeterminate, Children, CombiningAlgorithm};
use crate::types::{CombinerParameter, ConfigError, Decision, MatchResult, XacmlVersion};

/// The decision of the first child that is not NotApplicable.
#[derive(Debug, Clone, Copy)]
pub struct FirstApplicable;

impl CombiningAlgorithm for FirstApplicable {
    fn combine(
        &self,
        children: &mut dyn Children,
        _parameters: &[CombinerParameter],
        version: XacmlVersion,
    ) -> Result<Decision, ConfigError> {
        for i in 0..children.len() {
            let decision = children.evaluate(i)?;
            if decision != Decision::NotApplicable {
                return Ok(if version.is_v3() {
                    decision
                } else {
                    decision.to_legacy()
                });
            }
        }
        Ok(Decision::NotApplicable)
    }
}

/// Selects the single child whose target applies, judged on targets
/// alone; an ambiguous or undecidable selection is Indeterminate.
#[derive(Debug, Clone, Copy)]
pub struct OnlyOneApplicable;

impl CombiningAlgorithm for OnlyOneApplicable {
    fn combine(
        &self,
        children: &mut dyn Children,
        _parameters: &[CombinerParameter],
        version: XacmlVersion,
    ) -> Result<Decision, ConfigError> {
        let mut selected = None;
        for i in 0..children.len() {
            match children.is_applicable(i)? {
                MatchResult::NoMatch => {}
                MatchResult::Match if selected.is_none() => selected = Some(i),
                MatchResult::Match | MatchResult::Indeterminate(_) => {
                    return Ok(indeterminate(version))
                }
            }
        }
        match selected {
            Some(i) => {
                let decision = children.evaluate(i)?;
                Ok(if version.is_v3() {
                    decision
                } else {
                    decision.to_legacy()
                })
            }
            None => Ok(Decision::NotApplicable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{run, Scripted};
    use crate::types::{Decision, Effect, XacmlVersion};
    use crate::uri::algorithm as alg;

    use Decision::{Deny, IndeterminateD, IndeterminateDP, NotApplicable, Permit};

    #[test]
    fn first_applicable_is_order_sensitive() {
        let mut a = Scripted::rules(&[(Permit, Effect::Permit), (Deny, Effect::Deny)]);
        let mut b = Scripted::rules(&[(Deny, Effect::Deny), (Permit, Effect::Permit)]);
        assert_eq!(run(alg::RULE_FIRST_APPLICABLE, &mut a, XacmlVersion::V3_0), Permit);
        assert_eq!(run(alg::RULE_FIRST_APPLICABLE, &mut b, XacmlVersion::V3_0), Deny);
        assert_eq!(a.evaluated, [0]);
    }

    #[test]
    fn first_applicable_collapses_indeterminate_before_v3() {
        let d = [NotApplicable, IndeterminateD, Permit];
        assert_eq!(
            run(alg::POLICY_FIRST_APPLICABLE, &mut Scripted::policies(&d), XacmlVersion::V3_0),
            IndeterminateD
        );
        assert_eq!(
            run(alg::POLICY_FIRST_APPLICABLE, &mut Scripted::policies(&d), XacmlVersion::V2_0),
            Decision::Indeterminate
        );
        assert_eq!(
            run(alg::POLICY_FIRST_APPLICABLE, &mut Scripted::policies(&[]), XacmlVersion::V3_0),
            NotApplicable
        );
    }

    #[test]
    fn only_one_applicable_counts_targets() {
        let only = |d: &[Decision], version| {
            run(alg::POLICY_ONLY_ONE_APPLICABLE, &mut Scripted::policies(d), version)
        };
        assert_eq!(only(&[NotApplicable, NotApplicable], XacmlVersion::V3_0), NotApplicable);
        assert_eq!(only(&[NotApplicable, Deny], XacmlVersion::V3_0), Deny);
        assert_eq!(only(&[Permit, Deny], XacmlVersion::V3_0), IndeterminateDP);
        assert_eq!(only(&[Permit, Deny], XacmlVersion::V1_0), Decision::Indeterminate);
        assert_eq!(only(&[IndeterminateD, Permit], XacmlVersion::V3_0), IndeterminateDP);
    }

    #[test]
    fn only_one_applicable_evaluates_the_selected_child_once() {
        let mut children = Scripted::policies(&[NotApplicable, Permit, NotApplicable]);
        run(alg::POLICY_ONLY_ONE_APPLICABLE, &mut children, XacmlVersion::V3_0);
        assert_eq!(children.evaluated, [1]);
    }
}
