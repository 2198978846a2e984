use super::args::{arity, double, integer, min_arity, ok};
use super::{FunctionContext, FunctionRegistry};
use crate::types::{Evaluated, EvaluationError};
use crate::uri::function::V1;

fn overflow() -> EvaluationError {
    EvaluationError::processing("integer overflow")
}

fn integer_fold(
    args: &[Evaluated],
    op: fn(i64, i64) -> Option<i64>,
) -> Result<Evaluated, EvaluationError> {
    min_arity(args, 2)?;
    let mut acc = integer(args, 0)?;
    for i in 1..args.len() {
        acc = op(acc, integer(args, i)?).ok_or_else(overflow)?;
    }
    ok(acc)
}

fn double_fold(args: &[Evaluated], op: fn(f64, f64) -> f64) -> Result<Evaluated, EvaluationError> {
    min_arity(args, 2)?;
    let mut acc = double(args, 0)?;
    for i in 1..args.len() {
        acc = op(acc, double(args, i)?);
    }
    ok(acc)
}

fn integer_add(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    integer_fold(args, i64::checked_add)
}

fn integer_multiply(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    integer_fold(args, i64::checked_mul)
}

fn integer_subtract(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    integer_fold(args, i64::checked_sub)
}

fn integer_divide(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    if integer(args, 1)? == 0 {
        return Err(EvaluationError::processing("division by zero"));
    }
    integer_fold(args, i64::checked_div)
}

fn integer_mod(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    if integer(args, 1)? == 0 {
        return Err(EvaluationError::processing("division by zero"));
    }
    integer_fold(args, i64::checked_rem)
}

fn integer_abs(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(integer(args, 0)?.checked_abs().ok_or_else(overflow)?)
}

fn double_add(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    double_fold(args, |a, b| a + b)
}

fn double_multiply(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    double_fold(args, |a, b| a * b)
}

fn double_subtract(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    ok(double(args, 0)? - double(args, 1)?)
}

fn double_divide(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 2)?;
    let divisor = double(args, 1)?;
    if divisor == 0.0 {
        return Err(EvaluationError::processing("division by zero"));
    }
    ok(double(args, 0)? / divisor)
}

fn double_abs(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(double(args, 0)?.abs())
}

fn round(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(double(args, 0)?.round_ties_even())
}

fn floor(args: &[Evaluated], _: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(double(args, 0)?.floor())
}

#[allow(clippy::cast_precision_loss)]
fn integer_to_double(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    ok(integer(args, 0)? as f64)
}

/// Truncates toward zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn double_to_integer(
    args: &[Evaluated],
    _: &FunctionContext<'_>,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 1)?;
    let d = double(args, 0)?.trunc();
    if !d.is_finite() || d < i64::MIN as f64 || d >= i64::MAX as f64 {
        return Err(EvaluationError::processing(format!(
            "{d} is out of integer range"
        )));
    }
    ok(d as i64)
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    let table: [(&str, super::NativeFn); 15] = [
        ("integer-add", integer_add),
        ("integer-subtract", integer_subtract),
        ("integer-multiply", integer_multiply),
        ("integer-divide", integer_divide),
        ("integer-mod", integer_mod),
        ("integer-abs", integer_abs),
        ("double-add", double_add),
        ("double-subtract", double_subtract),
        ("double-multiply", double_multiply),
        ("double-divide", double_divide),
        ("double-abs", double_abs),
        ("round", round),
        ("floor", floor),
        ("integer-to-double", integer_to_double),
        ("double-to-integer", double_to_integer),
    ];
    for (name, f) in table {
        registry.native(format!("{V1}{name}"), f);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{call, call_value, v};
    use crate::types::{StatusCode, Value};

    fn uri(name: &str) -> String {
        format!("urn:oasis:names:tc:xacml:1.0:function:{name}")
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(
            call_value(&uri("integer-add"), vec![v(1_i64), v(2_i64), v(3_i64)]),
            Value::Integer(6)
        );
        assert_eq!(
            call_value(&uri("integer-subtract"), vec![v(1_i64), v(3_i64)]),
            Value::Integer(-2)
        );
        assert_eq!(
            call_value(&uri("integer-divide"), vec![v(7_i64), v(2_i64)]),
            Value::Integer(3)
        );
        assert_eq!(
            call_value(&uri("integer-mod"), vec![v(7_i64), v(3_i64)]),
            Value::Integer(1)
        );
        assert_eq!(call_value(&uri("integer-abs"), vec![v(-4_i64)]), Value::Integer(4));
    }

    #[test]
    fn division_by_zero_is_a_processing_error() {
        for name in ["integer-divide", "integer-mod"] {
            let err = call(&uri(name), vec![v(1_i64), v(0_i64)]).unwrap_err();
            assert_eq!(err.status, StatusCode::ProcessingError);
        }
        let err = call(&uri("double-divide"), vec![v(1.0), v(0.0)]).unwrap_err();
        assert_eq!(err.status, StatusCode::ProcessingError);
    }

    #[test]
    fn overflow_is_reported() {
        assert!(call(&uri("integer-add"), vec![v(i64::MAX), v(1_i64)]).is_err());
        assert!(call(&uri("integer-subtract"), vec![v(1_i64), v(2_i64), v(3_i64)]).is_err());
    }

    #[test]
    fn double_functions() {
        assert_eq!(
            call_value(&uri("double-multiply"), vec![v(1.5), v(2.0)]),
            Value::Double(3.0)
        );
        assert_eq!(call_value(&uri("round"), vec![v(2.5)]), Value::Double(2.0));
        assert_eq!(call_value(&uri("round"), vec![v(2.6)]), Value::Double(3.0));
        assert_eq!(call_value(&uri("floor"), vec![v(-1.5)]), Value::Double(-2.0));
        assert_eq!(
            call_value(&uri("double-to-integer"), vec![v(-3.9)]),
            Value::Integer(-3)
        );
        assert_eq!(
            call_value(&uri("integer-to-double"), vec![v(4_i64)]),
            Value::Double(4.0)
        );
        assert!(call(&uri("double-to-integer"), vec![v(f64::NAN)]).is_err());
    }
}
