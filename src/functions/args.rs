//! Argument checking shared by the standard functions.

use crate::types::{Bag, DataType, Evaluated, EvaluationError, FunctionRef, Value};

pub(crate) fn arity(args: &[Evaluated], expected: usize) -> Result<(), EvaluationError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvaluationError::processing(format!(
            "expected {expected} arguments, got {}",
            args.len()
        )))
    }
}

pub(crate) fn min_arity(args: &[Evaluated], minimum: usize) -> Result<(), EvaluationError> {
    if args.len() >= minimum {
        Ok(())
    } else {
        Err(EvaluationError::processing(format!(
            "expected at least {minimum} arguments, got {}",
            args.len()
        )))
    }
}

fn mismatch(index: usize, expected: &str, got: &Evaluated) -> EvaluationError {
    let got = match got {
        Evaluated::Value(v) => v.data_type().to_string(),
        other => other.kind().to_owned(),
    };
    EvaluationError::processing(format!(
        "argument {}: expected {expected}, got {got}",
        index + 1
    ))
}

/// A single value of any type.
pub(crate) fn value(args: &[Evaluated], index: usize) -> Result<&Value, EvaluationError> {
    match args.get(index) {
        Some(Evaluated::Value(v)) => Ok(v),
        Some(other) => Err(mismatch(index, "a value", other)),
        None => Err(missing(index)),
    }
}

/// A single value of `data_type`.
pub(crate) fn typed(
    args: &[Evaluated],
    index: usize,
    data_type: DataType,
) -> Result<&Value, EvaluationError> {
    let v = value(args, index)?;
    if v.data_type() == data_type {
        Ok(v)
    } else {
        Err(mismatch(index, data_type.short_name(), &args[index]))
    }
}

fn missing(index: usize) -> EvaluationError {
    EvaluationError::processing(format!("missing argument {}", index + 1))
}

macro_rules! scalar {
    ($name:ident, $variant:ident, $ty:ty, $expected:literal) => {
        pub(crate) fn $name(args: &[Evaluated], index: usize) -> Result<$ty, EvaluationError> {
            match args.get(index) {
                Some(Evaluated::Value(Value::$variant(v))) => Ok(*v),
                Some(other) => Err(mismatch(index, $expected, other)),
                None => Err(missing(index)),
            }
        }
    };
}

scalar!(boolean, Boolean, bool, "boolean");
scalar!(integer, Integer, i64, "integer");
scalar!(double, Double, f64, "double");

pub(crate) fn string(args: &[Evaluated], index: usize) -> Result<&str, EvaluationError> {
    match args.get(index) {
        Some(Evaluated::Value(Value::String(s))) => Ok(s),
        Some(other) => Err(mismatch(index, "string", other)),
        None => Err(missing(index)),
    }
}

pub(crate) fn bag(
    args: &[Evaluated],
    index: usize,
    data_type: DataType,
) -> Result<&Bag, EvaluationError> {
    match args.get(index) {
        Some(Evaluated::Bag(b)) if b.data_type == data_type => Ok(b),
        Some(other) => Err(mismatch(
            index,
            &format!("a bag of {}", data_type.short_name()),
            other,
        )),
        None => Err(missing(index)),
    }
}

/// A bag of any type.
pub(crate) fn any_bag(args: &[Evaluated], index: usize) -> Result<&Bag, EvaluationError> {
    match args.get(index) {
        Some(Evaluated::Bag(b)) => Ok(b),
        Some(other) => Err(mismatch(index, "a bag", other)),
        None => Err(missing(index)),
    }
}

pub(crate) fn function(args: &[Evaluated], index: usize) -> Result<&FunctionRef, EvaluationError> {
    match args.get(index) {
        Some(Evaluated::Function(f)) => Ok(f),
        Some(other) => Err(mismatch(index, "a function", other)),
        None => Err(missing(index)),
    }
}

pub(crate) fn ok(value: impl Into<Value>) -> Result<Evaluated, EvaluationError> {
    Ok(Evaluated::Value(value.into()))
}
