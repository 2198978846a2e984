use std::fmt;

use super::error::EvaluationError;

/// The effect a rule declares, and the key obligations and advice are
/// filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    Permit,
    Deny,
}

impl Effect {
    /// The decision a rule with this effect produces when its condition holds.
    #[must_use]
    pub fn decision(self) -> Decision {
        match self {
            Effect::Permit => Decision::Permit,
            Effect::Deny => Decision::Deny,
        }
    }

    /// The 3.0 indeterminate variant recording this effect.
    #[must_use]
    pub fn indeterminate(self) -> Decision {
        match self {
            Effect::Permit => Decision::IndeterminateP,
            Effect::Deny => Decision::IndeterminateD,
        }
    }

    #[must_use]
    pub fn opposite(self) -> Effect {
        match self {
            Effect::Permit => Effect::Deny,
            Effect::Deny => Effect::Permit,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Permit => write!(f, "Permit"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

/// An authorization decision.
///
/// The `IndeterminateD`, `IndeterminateP` and `IndeterminateDP` variants are
/// produced only when evaluating in 3.0 mode. They record which effect the
/// failed evaluation could have resolved to, so that combining algorithms
/// can weigh the error correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decision {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate,
    IndeterminateD,
    IndeterminateP,
    IndeterminateDP,
}

impl Decision {
    #[must_use]
    pub fn is_indeterminate(self) -> bool {
        matches!(
            self,
            Decision::Indeterminate
                | Decision::IndeterminateD
                | Decision::IndeterminateP
                | Decision::IndeterminateDP
        )
    }

    /// The effect this decision carries, if it is Permit or Deny.
    #[must_use]
    pub fn effect(self) -> Option<Effect> {
        match self {
            Decision::Permit => Some(Effect::Permit),
            Decision::Deny => Some(Effect::Deny),
            _ => None,
        }
    }

    /// Collapse the extended indeterminate variants into plain `Indeterminate`.
    #[must_use]
    pub fn to_legacy(self) -> Decision {
        if self.is_indeterminate() {
            Decision::Indeterminate
        } else {
            self
        }
    }

    /// Swap Permit and Deny, and the D and P indeterminate variants.
    #[must_use]
    pub fn mirrored(self) -> Decision {
        match self {
            Decision::Permit => Decision::Deny,
            Decision::Deny => Decision::Permit,
            Decision::IndeterminateD => Decision::IndeterminateP,
            Decision::IndeterminateP => Decision::IndeterminateD,
            other => other,
        }
    }

    /// The 3.0 promotion applied to a policy's combined decision when its
    /// own target was indeterminate.
    #[must_use]
    pub fn promote_for_indeterminate_target(self) -> Decision {
        match self {
            Decision::Permit => Decision::IndeterminateP,
            Decision::Deny => Decision::IndeterminateD,
            Decision::Indeterminate => Decision::IndeterminateDP,
            other => other,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Permit => write!(f, "Permit"),
            Decision::Deny => write!(f, "Deny"),
            Decision::NotApplicable => write!(f, "NotApplicable"),
            Decision::Indeterminate => write!(f, "Indeterminate"),
            Decision::IndeterminateD => write!(f, "Indeterminate{{D}}"),
            Decision::IndeterminateP => write!(f, "Indeterminate{{P}}"),
            Decision::IndeterminateDP => write!(f, "Indeterminate{{DP}}"),
        }
    }
}

/// Three-valued result of evaluating a target, an `AnyOf`, an `AllOf` or a
/// single `Match`.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Match,
    NoMatch,
    Indeterminate(EvaluationError),
}

impl MatchResult {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match)
    }

    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, MatchResult::Indeterminate(_))
    }
}

/// The XACML dialect a request is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum XacmlVersion {
    V1_0,
    V1_1,
    V2_0,
    #[default]
    V3_0,
}

impl XacmlVersion {
    /// Whether the 3.0 extended-indeterminate semantics apply.
    #[must_use]
    pub fn is_v3(self) -> bool {
        self == XacmlVersion::V3_0
    }
}

impl fmt::Display for XacmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XacmlVersion::V1_0 => write!(f, "1.0"),
            XacmlVersion::V1_1 => write!(f, "1.1"),
            XacmlVersion::V2_0 => write!(f, "2.0"),
            XacmlVersion::V3_0 => write!(f, "3.0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_decisions() {
        assert_eq!(Effect::Permit.decision(), Decision::Permit);
        assert_eq!(Effect::Deny.indeterminate(), Decision::IndeterminateD);
        assert_eq!(Effect::Permit.opposite(), Effect::Deny);
    }

    #[test]
    fn legacy_collapse() {
        for d in [
            Decision::Indeterminate,
            Decision::IndeterminateD,
            Decision::IndeterminateP,
            Decision::IndeterminateDP,
        ] {
            assert!(d.is_indeterminate());
            assert_eq!(d.to_legacy(), Decision::Indeterminate);
        }
        assert_eq!(Decision::Permit.to_legacy(), Decision::Permit);
    }

    #[test]
    fn mirrored_is_an_involution() {
        for d in [
            Decision::Permit,
            Decision::Deny,
            Decision::NotApplicable,
            Decision::IndeterminateD,
            Decision::IndeterminateP,
            Decision::IndeterminateDP,
        ] {
            assert_eq!(d.mirrored().mirrored(), d);
        }
    }

    #[test]
    fn target_promotion() {
        assert_eq!(
            Decision::Permit.promote_for_indeterminate_target(),
            Decision::IndeterminateP
        );
        assert_eq!(
            Decision::Deny.promote_for_indeterminate_target(),
            Decision::IndeterminateD
        );
        assert_eq!(
            Decision::NotApplicable.promote_for_indeterminate_target(),
            Decision::NotApplicable
        );
        assert_eq!(
            Decision::IndeterminateDP.promote_for_indeterminate_target(),
            Decision::IndeterminateDP
        );
    }

    #[test]
    fn display() {
        assert_eq!(Decision::IndeterminateDP.to_string(), "Indeterminate{DP}");
        assert_eq!(XacmlVersion::V2_0.to_string(), "2.0");
    }
}
