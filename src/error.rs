use thiserror::Error;

use crate::parse::ParseError;
use crate::types::ConfigError;

/// Unified error type covering configuration and lexical parsing.
///
/// Returned by [`PdpBuilder::build()`](crate::PdpBuilder::build),
/// [`Pdp::evaluate()`](crate::Pdp::evaluate) and
/// [`AttributeValue::to_value()`](crate::AttributeValue::to_value).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PdpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
