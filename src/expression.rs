//! The expression interpreter.
//!
//! Expressions evaluate to a value, a bag or a function. Recoverable
//! failures surface as [`Fault::Indeterminate`] and are turned into an
//! indeterminate result by the enclosing rule or policy; unknown functions
//! and datatypes are [`Fault::Config`].

use std::sync::Arc;

use crate::evaluate::{EvaluationContext, Memo};
use crate::functions::{Function, FunctionContext};
use crate::types::{
    Apply, AttributeDesignator, AttributeSelector, Bag, ConfigError, DataType, Evaluated,
    EvaluationError, Expression, Fault, FunctionRef, Policy, Value,
};
use crate::uri::{attribute, category};

/// Evaluate `expr`. Variable references resolve against `scope`, the
/// policy the expression appears in.
pub(crate) fn evaluate(
    expr: &Expression,
    scope: Option<&Policy>,
    ctx: &mut EvaluationContext<'_>,
) -> Result<Evaluated, Fault> {
    match expr {
        Expression::Value(literal) => Ok(literal.resolve()?.into()),
        Expression::Designator(d) => Ok(designate(d, ctx)?.into()),
        Expression::Selector(s) => Ok(select(s, ctx)?.into()),
        Expression::VariableReference(id) => variable(id, scope, ctx),
        Expression::Function(uri) => Ok(Evaluated::Function(FunctionRef {
            uri: uri.clone(),
            function: lookup(uri, ctx)?,
        })),
        Expression::Apply(a) => apply(a, scope, ctx),
    }
}

/// Evaluate a condition, which must produce a single boolean.
pub(crate) fn condition(
    expr: &Expression,
    scope: Option<&Policy>,
    ctx: &mut EvaluationContext<'_>,
) -> Result<bool, Fault> {
    match evaluate(expr, scope, ctx)? {
        Evaluated::Value(Value::Boolean(b)) => Ok(b),
        other => Err(EvaluationError::processing(format!(
            "condition evaluated to {} instead of a boolean",
            describe(&other)
        ))
        .into()),
    }
}

fn describe(evaluated: &Evaluated) -> String {
    match evaluated {
        Evaluated::Value(v) => v.data_type().to_string(),
        other => other.kind().to_owned(),
    }
}

pub(crate) fn lookup(uri: &str, ctx: &EvaluationContext<'_>) -> Result<Arc<dyn Function>, ConfigError> {
    ctx.functions
        .get(uri)
        .ok_or_else(|| ConfigError::UnknownFunction {
            uri: uri.to_owned(),
        })
}

pub(crate) fn data_type(uri: &str) -> Result<DataType, ConfigError> {
    DataType::from_uri(uri).ok_or_else(|| ConfigError::UnknownDataType {
        uri: uri.to_owned(),
    })
}

fn to_bag(data_type: DataType, raw: &[String]) -> Result<Bag, EvaluationError> {
    let values = raw
        .iter()
        .map(|text| data_type.parse(text))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Bag::new(data_type, values))
}

/// The environment attributes the evaluation clock can answer for.
fn from_clock(d: &AttributeDesignator, dt: DataType, ctx: &EvaluationContext<'_>) -> Option<Value> {
    let now = ctx.clock?;
    if d.category != category::ENVIRONMENT {
        return None;
    }
    match (d.attribute_id.as_str(), dt) {
        (attribute::CURRENT_TIME, DataType::Time) => Some(Value::Time(now.time_part())),
        (attribute::CURRENT_DATE, DataType::Date) => Some(Value::Date(now.date_part())),
        (attribute::CURRENT_DATE_TIME, DataType::DateTime) => Some(Value::DateTime(now)),
        _ => None,
    }
}

pub(crate) fn designate(d: &AttributeDesignator, ctx: &EvaluationContext<'_>) -> Result<Bag, Fault> {
    let dt = data_type(&d.data_type)?;
    let raw = ctx
        .source
        .values(&d.category, &d.attribute_id, &d.data_type, d.issuer.as_deref())?;
    let mut bag = to_bag(dt, &raw)?;
    if bag.is_empty() {
        if let Some(now) = from_clock(d, dt, ctx) {
            bag.values.push(now);
        }
    }
    if bag.is_empty() && d.must_be_present {
        return Err(EvaluationError::missing_attribute(format!(
            "{} ({}) in {}",
            d.attribute_id, d.data_type, d.category
        ))
        .into());
    }
    Ok(bag)
}

pub(crate) fn select(s: &AttributeSelector, ctx: &EvaluationContext<'_>) -> Result<Bag, Fault> {
    let dt = data_type(&s.data_type)?;
    let raw = ctx.source.values_by_xpath(
        ctx.version,
        &s.path,
        &s.category,
        s.context_selector_id.as_deref(),
        &s.namespaces,
    )?;
    let bag = to_bag(dt, &raw)?;
    if bag.is_empty() && s.must_be_present {
        return Err(
            EvaluationError::missing_attribute(format!("no nodes selected by '{}'", s.path)).into(),
        );
    }
    Ok(bag)
}

fn variable(
    id: &str,
    scope: Option<&Policy>,
    ctx: &mut EvaluationContext<'_>,
) -> Result<Evaluated, Fault> {
    let definition = scope
        .and_then(|policy| policy.variable(id))
        .ok_or_else(|| EvaluationError::processing(format!("undefined variable '{id}'")))?;
    match ctx.variables.get(id) {
        Some(Memo::Done(result)) => return Ok(result.clone()?),
        Some(Memo::Pending) => {
            return Err(EvaluationError::processing(format!(
                "variable '{id}' depends on itself"
            ))
            .into())
        }
        None => {}
    }
    ctx.variables.insert(id.to_owned(), Memo::Pending);
    let result = match evaluate(&definition.expression, scope, ctx) {
        Ok(value) => Ok(value),
        Err(fault) => Err(fault.into_recoverable()?),
    };
    ctx.variables.insert(id.to_owned(), Memo::Done(result.clone()));
    Ok(result?)
}

fn apply(a: &Apply, scope: Option<&Policy>, ctx: &mut EvaluationContext<'_>) -> Result<Evaluated, Fault> {
    let function = lookup(&a.function, ctx)?;
    let mut args = Vec::with_capacity(a.arguments.len());
    for argument in &a.arguments {
        args.push(evaluate(argument, scope, ctx)?);
    }
    let fctx = FunctionContext {
        version: ctx.version,
        source: ctx.source,
    };
    function.call(&args, &fctx).map_err(|err| {
        EvaluationError::new(err.status, format!("{}: {}", a.function, err.message)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::testing::with_context;
    use crate::types::{
        apply, designator, function, literal, variable as var, Request, StatusCode,
    };
    use crate::uri::data_type as dt;

    const INTEGER_ADD: &str = "urn:oasis:names:tc:xacml:1.0:function:integer-add";
    const ONE_AND_ONLY: &str = "urn:oasis:names:tc:xacml:1.0:function:integer-one-and-only";

    fn request() -> Request {
        Request::builder(crate::XacmlVersion::V3_0)
            .attribute(category::ACCESS_SUBJECT, "age", 30_i64)
            .build()
    }

    fn age() -> Expression {
        designator(category::ACCESS_SUBJECT, "age", dt::INTEGER).into()
    }

    #[test]
    fn apply_over_designator() {
        let expr = apply(
            INTEGER_ADD,
            [apply(ONE_AND_ONLY, [age()]), literal(12_i64)],
        );
        let result = with_context(&request(), |ctx| evaluate(&expr, None, ctx));
        assert_eq!(result, Ok(Evaluated::Value(Value::Integer(42))));
    }

    #[test]
    fn missing_attribute_with_must_be_present() {
        let expr: Expression = designator(category::ACCESS_SUBJECT, "role", dt::STRING)
            .must_be_present()
            .into();
        let result = with_context(&request(), |ctx| evaluate(&expr, None, ctx));
        match result {
            Err(Fault::Indeterminate(err)) => assert_eq!(err.status, StatusCode::MissingAttribute),
            other => panic!("expected missing attribute, got {other:?}"),
        }
        let optional: Expression = designator(category::ACCESS_SUBJECT, "role", dt::STRING).into();
        let result = with_context(&request(), |ctx| evaluate(&optional, None, ctx));
        assert_eq!(result, Ok(Evaluated::Bag(Bag::empty(DataType::String))));
    }

    #[test]
    fn unknown_function_is_fatal() {
        let expr = apply("urn:example:nope", [literal(1_i64)]);
        let result = with_context(&request(), |ctx| evaluate(&expr, None, ctx));
        assert!(matches!(
            result,
            Err(Fault::Config(ConfigError::UnknownFunction { .. }))
        ));
    }

    #[test]
    fn function_errors_name_the_function() {
        let expr = apply(
            "urn:oasis:names:tc:xacml:1.0:function:integer-divide",
            [literal(1_i64), literal(0_i64)],
        );
        let result = with_context(&request(), |ctx| evaluate(&expr, None, ctx));
        match result {
            Err(Fault::Indeterminate(err)) => {
                assert_eq!(err.status, StatusCode::ProcessingError);
                assert!(err.message.starts_with("urn:oasis:names:tc:xacml:1.0:function:integer-divide: "));
            }
            other => panic!("expected a processing error, got {other:?}"),
        }
    }

    #[test]
    fn variables_are_memoized() {
        let policy = Policy::builder("p", crate::uri::algorithm::RULE_DENY_OVERRIDES)
            .variable("next", apply(INTEGER_ADD, [apply(ONE_AND_ONLY, [age()]), literal(1_i64)]))
            .build();
        let twice = apply(INTEGER_ADD, [var("next"), var("next")]);
        let (result, memo) = with_context(&request(), |ctx| {
            let result = evaluate(&twice, Some(&policy), ctx);
            (result, ctx.variables.len())
        });
        assert_eq!(result, Ok(Evaluated::Value(Value::Integer(62))));
        assert_eq!(memo, 1);
    }

    #[test]
    fn undefined_variable_is_indeterminate() {
        let result = with_context(&request(), |ctx| evaluate(&var("ghost"), None, ctx));
        assert!(matches!(result, Err(Fault::Indeterminate(_))));
    }

    #[test]
    fn function_expression_yields_function_value() {
        let result = with_context(&request(), |ctx| evaluate(&function(INTEGER_ADD), None, ctx));
        assert!(matches!(result, Ok(Evaluated::Function(f)) if f.uri == INTEGER_ADD));
    }

    #[test]
    fn non_boolean_condition() {
        let result = with_context(&request(), |ctx| condition(&literal(3_i64), None, ctx));
        assert!(matches!(result, Err(Fault::Indeterminate(_))));
        let result = with_context(&request(), |ctx| condition(&literal(true), None, ctx));
        assert_eq!(result, Ok(true));
    }

    #[test]
    fn clock_supplies_current_date_time() {
        let expr: Expression =
            designator(category::ENVIRONMENT, attribute::CURRENT_DATE_TIME, dt::DATE_TIME)
                .must_be_present()
                .into();
        let result = with_context(&request(), |ctx| evaluate(&expr, None, ctx));
        match result {
            Ok(Evaluated::Bag(bag)) => assert_eq!(bag.len(), 1),
            other => panic!("expected the clock value, got {other:?}"),
        }
    }
}
