use crate::types::XacmlVersion;

/// Settings of a [`Pdp`](crate::Pdp).
///
/// ```
/// use xacml_pdp::{PdpConfig, XacmlVersion};
///
/// let config = PdpConfig::default()
///     .with_default_version(XacmlVersion::V2_0)
///     .with_max_reference_depth(8);
/// assert_eq!(config.max_reference_depth, 8);
/// assert!(config.supply_environment_clock);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdpConfig {
    /// Version of the requests started with [`Pdp::request`](crate::Pdp::request).
    pub default_version: XacmlVersion,
    /// How many policy references may be followed below one another.
    pub max_reference_depth: usize,
    /// List applicable policies even when the request does not ask for it.
    pub return_policy_id_list: bool,
    /// Answer the environment's current-time, current-date and
    /// current-dateTime attributes from the clock when the request omits
    /// them.
    pub supply_environment_clock: bool,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            default_version: XacmlVersion::V3_0,
            max_reference_depth: 32,
            return_policy_id_list: false,
            supply_environment_clock: true,
        }
    }
}

impl PdpConfig {
    #[must_use]
    pub fn with_default_version(mut self, version: XacmlVersion) -> Self {
        self.default_version = version;
        self
    }

    #[must_use]
    pub fn with_max_reference_depth(mut self, depth: usize) -> Self {
        self.max_reference_depth = depth;
        self
    }

    #[must_use]
    pub fn with_policy_id_list(mut self, enabled: bool) -> Self {
        self.return_policy_id_list = enabled;
        self
    }

    #[must_use]
    pub fn with_environment_clock(mut self, enabled: bool) -> Self {
        self.supply_environment_clock = enabled;
        self
    }
}
