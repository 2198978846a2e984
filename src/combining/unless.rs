use super::{Children, CombiningAlgorithm};
use crate::types::{CombinerParameter, ConfigError, Decision, Effect, XacmlVersion};

/// deny-unless-permit (`Unless::new(Effect::Permit)`) and
/// permit-unless-deny (`Unless::new(Effect::Deny)`). Never Indeterminate
/// and never NotApplicable.
#[derive(Debug, Clone, Copy)]
pub struct Unless {
    exception: Effect,
}

impl Unless {
    #[must_use]
    pub fn new(exception: Effect) -> Self {
        Self { exception }
    }
}

impl CombiningAlgorithm for Unless {
    fn combine(
        &self,
        children: &mut dyn Children,
        _parameters: &[CombinerParameter],
        _version: XacmlVersion,
    ) -> Result<Decision, ConfigError> {
        let exception = self.exception.decision();
        for i in 0..children.len() {
            if children.evaluate(i)? == exception {
                return Ok(exception);
            }
        }
        Ok(self.exception.opposite().decision())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{run, Scripted};
    use crate::types::{Decision, XacmlVersion};
    use crate::uri::algorithm as alg;

    use Decision::{Deny, Indeterminate, IndeterminateDP, NotApplicable, Permit};

    #[test]
    fn defaults_when_no_exception() {
        let d = [Indeterminate, NotApplicable, IndeterminateDP];
        assert_eq!(
            run(alg::RULE_DENY_UNLESS_PERMIT, &mut Scripted::policies(&d), XacmlVersion::V3_0),
            Deny
        );
        assert_eq!(
            run(alg::POLICY_PERMIT_UNLESS_DENY, &mut Scripted::policies(&d), XacmlVersion::V3_0),
            Permit
        );
    }

    #[test]
    fn exception_short_circuits() {
        let mut children = Scripted::policies(&[NotApplicable, Deny, Permit]);
        let d = run(alg::POLICY_PERMIT_UNLESS_DENY, &mut children, XacmlVersion::V3_0);
        assert_eq!(d, Deny);
        assert_eq!(children.evaluated, [0, 1]);
        assert_eq!(
            run(alg::RULE_DENY_UNLESS_PERMIT, &mut Scripted::policies(&[]), XacmlVersion::V3_0),
            Deny
        );
    }
}
