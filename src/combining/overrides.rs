use super::{Children, CombiningAlgorithm};
use crate::types::{CombinerParameter, ConfigError, Decision, Effect, XacmlVersion};

/// deny-overrides and permit-overrides, in every version and for both
/// rules and policies. The ordered variants share this implementation
/// because children are always visited in list order.
#[derive(Debug, Clone, Copy)]
pub struct Overrides {
    winner: Effect,
}

impl Overrides {
    #[must_use]
    pub fn new(winner: Effect) -> Self {
        Self { winner }
    }

    /// Maps a decision into the frame where Deny is the winning effect.
    /// The mapping is its own inverse.
    fn framed(&self, decision: Decision) -> Decision {
        match self.winner {
            Effect::Deny => decision,
            Effect::Permit => decision.mirrored(),
        }
    }

    fn framed_hint(&self, hint: Option<Effect>) -> Option<Effect> {
        match self.winner {
            Effect::Deny => hint,
            Effect::Permit => hint.map(Effect::opposite),
        }
    }

    /// 3.0: deny-overrides, with the D/P/DP weighting.
    fn extended(&self, children: &mut dyn Children) -> Result<Decision, ConfigError> {
        let (mut permit, mut err_d, mut err_p, mut err_dp) = (false, false, false, false);
        for i in 0..children.len() {
            match self.framed(children.evaluate(i)?) {
                Decision::Deny => return Ok(self.framed(Decision::Deny)),
                Decision::Permit => permit = true,
                Decision::NotApplicable => {}
                Decision::IndeterminateD => err_d = true,
                Decision::IndeterminateP => err_p = true,
                Decision::IndeterminateDP | Decision::Indeterminate => err_dp = true,
            }
        }
        let decision = if err_dp || (err_d && (err_p || permit)) {
            Decision::IndeterminateDP
        } else if err_d {
            Decision::IndeterminateD
        } else if permit {
            Decision::Permit
        } else if err_p {
            Decision::IndeterminateP
        } else {
            Decision::NotApplicable
        };
        Ok(self.framed(decision))
    }

    /// Pre-3.0 form: an indeterminate child blocks a Permit only when it
    /// could have denied. Policies carry no effect hint, so an
    /// indeterminate policy never blocks one.
    fn legacy(&self, children: &mut dyn Children) -> Result<Decision, ConfigError> {
        let (mut permit, mut error, mut potential_deny) = (false, false, false);
        for i in 0..children.len() {
            match self.framed(children.evaluate(i)?) {
                Decision::Deny => return Ok(self.framed(Decision::Deny)),
                Decision::Permit => permit = true,
                Decision::NotApplicable => {}
                _ => {
                    error = true;
                    if self.framed_hint(children.effect_hint(i)) == Some(Effect::Deny) {
                        potential_deny = true;
                    }
                }
            }
        }
        Ok(if potential_deny {
            Decision::Indeterminate
        } else if permit {
            self.framed(Decision::Permit)
        } else if error {
            Decision::Indeterminate
        } else {
            Decision::NotApplicable
        })
    }
}

impl CombiningAlgorithm for Overrides {
    fn combine(
        &self,
        children: &mut dyn Children,
        _parameters: &[CombinerParameter],
        version: XacmlVersion,
    ) -> Result<Decision, ConfigError> {
        if version.is_v3() {
            self.extended(children)
        } else {
            self.legacy(children)
        }
    }
}
