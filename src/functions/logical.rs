use super::args::{arity, boolean, integer, min_arity, ok};
use super::{FunctionContext, FunctionRegistry};
use crate::types::{Evaluated, EvaluationError};
use crate::uri::function::V1;

/// Stops at the first `true`; arguments after it are not type-checked.
fn or(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    for i in 0..args.len() {
        if boolean(args, i)? {
            return ok(true);
        }
    }
    ok(false)
}

fn and(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    for i in 0..args.len() {
        if !boolean(args, i)? {
            return ok(false);
        }
    }
    ok(true)
}

fn not(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(!boolean(args, 0)?)
}

/// True if at least `n` of the remaining arguments are true.
fn n_of(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    min_arity(args, 1)?;
    let n = integer(args, 0)?;
    let available = args.len() - 1;
    let Ok(needed) = usize::try_from(n) else {
        return Err(EvaluationError::processing(format!("n-of: negative count {n}")));
    };
    if needed > available {
        return Err(EvaluationError::processing(format!(
            "n-of: {needed} required but only {available} arguments"
        )));
    }
    let mut found = 0;
    for i in 1..args.len() {
        if found == needed {
            break;
        }
        if boolean(args, i)? {
            found += 1;
        }
    }
    ok(found == needed)
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.native(format!("{V1}or"), or);
    registry.native(format!("{V1}and"), and);
    registry.native(format!("{V1}not"), not);
    registry.native(format!("{V1}n-of"), n_of);
}
