use super::args::{arity, ok, string, typed};
use super::{Function, FunctionContext, FunctionRegistry};
use crate::types::{DataType, Evaluated, EvaluationError};
use crate::uri::function::V3;

/// `<type>-equal`, using the datatype's own equality (case-insensitive
/// domains for rfc822Name, normalized RDNs for x500Name).
#[derive(Clone)]
struct Equal(DataType);

impl Function for Equal {
    fn call(
        &self,
        args: &[Evaluated],
        _ctx: &FunctionContext<'_>,
    ) -> Result<Evaluated, EvaluationError> {
        arity(args, 2)?;
        let a = typed(args, 0, self.0)?;
        let b = typed(args, 1, self.0)?;
        ok(a == b)
    }
}

fn string_equal_ignore_case(
    args: &[Evaluated],
    _ctx: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    ok(string(args, 0)?.to_lowercase() == string(args, 1)?.to_lowercase())
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    for dt in DataType::ALL {
        registry.per_type(dt, "equal", Equal(dt));
    }
    registry.native(
        format!("{V3}string-equal-ignore-case"),
        string_equal_ignore_case,
    );
}
