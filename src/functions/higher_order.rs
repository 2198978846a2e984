//! Functions that apply another function over bags.
//!
//! The 3.0 variadic forms of `any-of`, `all-of`, `any-of-any` and `map`
//! accept the 1.0 argument lists unchanged, so both URIs share one
//! implementation.

use super::args::{any_bag, arity, function, min_arity, value};
use super::{FunctionContext, FunctionRegistry};
use crate::types::{Bag, Evaluated, EvaluationError, FunctionRef, Value};
use crate::uri::function::{V1, V3};

fn predicate(
    f: &FunctionRef,
    args: &[Evaluated],
    ctx: &FunctionContext<'_>,
) -> Result<bool, EvaluationError> {
    match f.function.call(args, ctx)? {
        Evaluated::Value(Value::Boolean(b)) => Ok(b),
        other => Err(EvaluationError::processing(format!(
            "{} returned {} where a boolean was expected",
            f.uri,
            other.kind()
        ))),
    }
}

/// Splits `f, v1, .., vn, bag` into its parts.
fn fixed_and_bag(args: &[Evaluated]) -> Result<(&FunctionRef, &[Evaluated], &Bag), EvaluationError> {
    min_arity(args, 2)?;
    let f = function(args, 0)?;
    let last = args.len() - 1;
    for i in 1..last {
        value(args, i)?;
    }
    Ok((f, &args[1..last], any_bag(args, last)?))
}

fn with_last(fixed: &[Evaluated], item: &Value) -> Vec<Evaluated> {
    let mut call_args = fixed.to_vec();
    call_args.push(Evaluated::Value(item.clone()));
    call_args
}

fn any_of(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    let (f, fixed, bag) = fixed_and_bag(args)?;
    for item in &bag.values {
        if predicate(f, &with_last(fixed, item), ctx)? {
            return Ok(Evaluated::Value(true.into()));
        }
    }
    Ok(Evaluated::Value(false.into()))
}

fn all_of(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    let (f, fixed, bag) = fixed_and_bag(args)?;
    for item in &bag.values {
        if !predicate(f, &with_last(fixed, item), ctx)? {
            return Ok(Evaluated::Value(false.into()));
        }
    }
    Ok(Evaluated::Value(true.into()))
}

fn map(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    let (f, fixed, bag) = fixed_and_bag(args)?;
    let mut results = Vec::with_capacity(bag.len());
    for item in &bag.values {
        match f.function.call(&with_last(fixed, item), ctx)? {
            Evaluated::Value(v) => results.push(v),
            other => {
                return Err(EvaluationError::processing(format!(
                    "{} returned {} inside map",
                    f.uri,
                    other.kind()
                )))
            }
        }
    }
    let data_type = results.first().map_or(bag.data_type, Value::data_type);
    Ok(Evaluated::Bag(Bag::new(data_type, results)))
}

/// True if `f` holds for some combination drawing one member from every
/// bag argument, with plain values used as they are.
fn any_of_any(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    min_arity(args, 2)?;
    let f = function(args, 0)?;
    let columns: Vec<Vec<Value>> = args[1..]
        .iter()
        .map(|arg| match arg {
            Evaluated::Value(v) => Ok(vec![v.clone()]),
            Evaluated::Bag(b) => Ok(b.values.clone()),
            Evaluated::Function(_) => Err(EvaluationError::processing(
                "any-of-any: unexpected function argument",
            )),
        })
        .collect::<Result<_, _>>()?;
    if columns.iter().any(Vec::is_empty) {
        return Ok(Evaluated::Value(false.into()));
    }

    let mut cursor = vec![0_usize; columns.len()];
    loop {
        let call_args: Vec<Evaluated> = cursor
            .iter()
            .zip(&columns)
            .map(|(&i, column)| Evaluated::Value(column[i].clone()))
            .collect();
        if predicate(f, &call_args, ctx)? {
            return Ok(Evaluated::Value(true.into()));
        }
        // Advance the odometer, rightmost column fastest.
        let mut position = columns.len();
        loop {
            if position == 0 {
                return Ok(Evaluated::Value(false.into()));
            }
            position -= 1;
            cursor[position] += 1;
            if cursor[position] < columns[position].len() {
                break;
            }
            cursor[position] = 0;
        }
    }
}

#[derive(Clone, Copy)]
enum Quantifier {
    All,
    Any,
}

impl Quantifier {
    fn over(
        self,
        items: &[Value],
        mut test: impl FnMut(&Value) -> Result<bool, EvaluationError>,
    ) -> Result<bool, EvaluationError> {
        for item in items {
            let holds = test(item)?;
            match self {
                Quantifier::All if !holds => return Ok(false),
                Quantifier::Any if holds => return Ok(true),
                _ => {}
            }
        }
        Ok(matches!(self, Quantifier::All))
    }
}

/// `f, bag1, bag2` with an outer quantifier over `bag1` and an inner one
/// over `bag2`.
fn nested(
    args: &[Evaluated],
    ctx: &FunctionContext<'_>,
    outer: Quantifier,
    inner: Quantifier,
) -> Result<Evaluated, EvaluationError> {
    arity(args, 3)?;
    let f = function(args, 0)?;
    let first = any_bag(args, 1)?;
    let second = any_bag(args, 2)?;
    let result = outer.over(&first.values, |a| {
        inner.over(&second.values, |b| {
            predicate(
                f,
                &[Evaluated::Value(a.clone()), Evaluated::Value(b.clone())],
                ctx,
            )
        })
    })?;
    Ok(Evaluated::Value(result.into()))
}

fn all_of_any(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    nested(args, ctx, Quantifier::All, Quantifier::Any)
}

fn any_of_all(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    nested(args, ctx, Quantifier::Any, Quantifier::All)
}

fn all_of_all(args: &[Evaluated], ctx: &FunctionContext<'_>) -> Result<Evaluated, EvaluationError> {
    nested(args, ctx, Quantifier::All, Quantifier::All)
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    let variadic: [(&str, super::NativeFn); 4] = [
        ("any-of", any_of),
        ("all-of", all_of),
        ("any-of-any", any_of_any),
        ("map", map),
    ];
    for (name, f) in variadic {
        registry.native(format!("{V1}{name}"), f);
        registry.native(format!("{V3}{name}"), f);
    }
    registry.native(format!("{V1}all-of-any"), all_of_any);
    registry.native(format!("{V1}any-of-all"), any_of_all);
    registry.native(format!("{V1}all-of-all"), all_of_all);
}

#[cfg(test)]
mod tests {
    use super::super::testing::{call, call_value, v};
    use super::*;
    use crate::types::DataType;

    fn uri(name: &str) -> String {
        format!("urn:oasis:names:tc:xacml:1.0:function:{name}")
    }

    fn f(name: &str) -> Evaluated {
        let uri = uri(name);
        let function = FunctionRegistry::standard().get(&uri).unwrap();
        Evaluated::Function(FunctionRef { uri, function })
    }

    fn ints(values: &[i64]) -> Evaluated {
        Evaluated::Bag(Bag::new(
            DataType::Integer,
            values.iter().copied().map(Value::from).collect(),
        ))
    }

    #[test]
    fn any_of_and_all_of() {
        let gt = f("integer-greater-than");
        assert_eq!(
            call_value(&uri("any-of"), vec![gt.clone(), v(5_i64), ints(&[7, 3])]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_value(&uri("all-of"), vec![gt.clone(), v(5_i64), ints(&[7, 3])]),
            Value::Boolean(false)
        );
        assert_eq!(
            call_value(&uri("all-of"), vec![gt, v(5_i64), ints(&[])]),
            Value::Boolean(true)
        );
    }

    #[test]
    fn variadic_any_of_any() {
        let eq = f("integer-equal");
        let v3 = "urn:oasis:names:tc:xacml:3.0:function:any-of-any";
        assert_eq!(
            call_value(v3, vec![eq.clone(), ints(&[1, 2]), ints(&[3, 2])]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_value(v3, vec![eq.clone(), v(4_i64), ints(&[3, 2])]),
            Value::Boolean(false)
        );
        assert_eq!(
            call_value(v3, vec![eq, ints(&[]), ints(&[1])]),
            Value::Boolean(false)
        );
    }

    #[test]
    fn nested_quantifiers() {
        let lt = f("integer-less-than");
        let small = ints(&[1, 2]);
        let large = ints(&[2, 10]);
        assert_eq!(
            call_value(&uri("all-of-any"), vec![lt.clone(), small.clone(), large.clone()]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_value(&uri("any-of-all"), vec![lt.clone(), small.clone(), large.clone()]),
            Value::Boolean(true)
        );
        assert_eq!(
            call_value(&uri("all-of-all"), vec![lt, small, large]),
            Value::Boolean(false)
        );
    }

    #[test]
    fn map_applies_to_each_member() {
        let mapped = call(
            &uri("map"),
            vec![f("integer-abs"), ints(&[-1, 2])],
        )
        .unwrap();
        assert_eq!(mapped, ints(&[1, 2]));
    }

    #[test]
    fn non_boolean_predicate_is_an_error() {
        assert!(call(&uri("any-of"), vec![f("integer-abs"), ints(&[1])]).is_err());
    }
}
