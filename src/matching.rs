//! Three-valued target matching.

use crate::evaluate::EvaluationContext;
use crate::expression::{designate, lookup, select};
use crate::functions::FunctionContext;
use crate::types::{
    AllOf, AnyOf, ConfigError, Evaluated, EvaluationError, Match, MatchResult, MatchSource,
    Target, Value,
};

/// Match `target` against the request. An absent or empty target matches.
///
/// # Errors
///
/// Only fatal configuration errors, such as an unknown match function.
pub(crate) fn match_target(
    target: Option<&Target>,
    ctx: &mut EvaluationContext<'_>,
) -> Result<MatchResult, ConfigError> {
    let Some(target) = target else {
        return Ok(MatchResult::Match);
    };
    let mut result = MatchResult::Match;
    for any_of in &target.any_of {
        match match_any_of(any_of, ctx)? {
            MatchResult::Match => {}
            MatchResult::NoMatch => {
                if result.is_match() {
                    result = MatchResult::NoMatch;
                }
            }
            indeterminate => return Ok(indeterminate),
        }
    }
    Ok(result)
}

fn match_any_of(any_of: &AnyOf, ctx: &mut EvaluationContext<'_>) -> Result<MatchResult, ConfigError> {
    if any_of.all_of.is_empty() {
        return Ok(MatchResult::Match);
    }
    let mut error = None;
    for all_of in &any_of.all_of {
        match match_all_of(all_of, ctx)? {
            MatchResult::Match => return Ok(MatchResult::Match),
            MatchResult::NoMatch => {}
            MatchResult::Indeterminate(err) => {
                error.get_or_insert(err);
            }
        }
    }
    Ok(error.map_or(MatchResult::NoMatch, MatchResult::Indeterminate))
}

fn match_all_of(all_of: &AllOf, ctx: &mut EvaluationContext<'_>) -> Result<MatchResult, ConfigError> {
    let mut error = None;
    for m in &all_of.matches {
        match match_one(m, ctx)? {
            MatchResult::Match => {}
            MatchResult::NoMatch => return Ok(MatchResult::NoMatch),
            MatchResult::Indeterminate(err) => {
                error.get_or_insert(err);
            }
        }
    }
    Ok(error.map_or(MatchResult::Match, MatchResult::Indeterminate))
}

/// Applies the match function to the literal and each member of the
/// attribute bag. One true comparison matches even if another failed.
fn match_one(m: &Match, ctx: &mut EvaluationContext<'_>) -> Result<MatchResult, ConfigError> {
    let function = lookup(&m.function, ctx)?;
    let literal = match m.value.resolve() {
        Ok(value) => value,
        Err(fault) => return Ok(MatchResult::Indeterminate(fault.into_recoverable()?)),
    };
    let bag = match &m.source {
        MatchSource::Designator(d) => designate(d, ctx),
        MatchSource::Selector(s) => select(s, ctx),
    };
    let bag = match bag {
        Ok(bag) => bag,
        Err(fault) => return Ok(MatchResult::Indeterminate(fault.into_recoverable()?)),
    };

    let fctx = FunctionContext {
        version: ctx.version,
        source: ctx.source,
    };
    let mut error = None;
    for candidate in bag.values {
        let args = [Evaluated::Value(literal.clone()), Evaluated::Value(candidate)];
        match function.call(&args, &fctx) {
            Ok(Evaluated::Value(Value::Boolean(true))) => return Ok(MatchResult::Match),
            Ok(Evaluated::Value(Value::Boolean(false))) => {}
            Ok(other) => {
                error.get_or_insert_with(|| {
                    EvaluationError::processing(format!(
                        "{} returned {} in a match",
                        m.function,
                        other.kind()
                    ))
                });
            }
            Err(err) => {
                error.get_or_insert(EvaluationError::new(
                    err.status,
                    format!("{}: {}", m.function, err.message),
                ));
            }
        }
    }
    Ok(error.map_or(MatchResult::NoMatch, MatchResult::Indeterminate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::testing::with_context;
    use crate::types::{designator, Request, StatusCode};
    use crate::uri::{category, data_type as dt};
    use crate::XacmlVersion;

    const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";

    fn request() -> Request {
        Request::builder(XacmlVersion::V3_0)
            .attribute(category::ACCESS_SUBJECT, "role", "admin")
            .attribute(category::ACCESS_SUBJECT, "role", "auditor")
            .attribute(category::ACTION, "action-id", "read")
            .build()
    }

    fn role_is(role: &str) -> Match {
        Match::new(
            STRING_EQUAL,
            role,
            designator(category::ACCESS_SUBJECT, "role", dt::STRING),
        )
    }

    fn action_is(action: &str) -> Match {
        Match::new(
            STRING_EQUAL,
            action,
            designator(category::ACTION, "action-id", dt::STRING),
        )
    }

    fn missing() -> Match {
        Match::new(
            STRING_EQUAL,
            "x",
            designator(category::RESOURCE, "owner", dt::STRING).must_be_present(),
        )
    }

    fn run(target: &Target) -> MatchResult {
        with_context(&request(), |ctx| match_target(Some(target), ctx)).unwrap()
    }

    #[test]
    fn empty_target_matches() {
        assert_eq!(run(&Target::new()), MatchResult::Match);
        let absent = with_context(&request(), |ctx| match_target(None, ctx));
        assert_eq!(absent, Ok(MatchResult::Match));
        assert_eq!(run(&Target::new().any_of(AnyOf::new())), MatchResult::Match);
    }

    #[test]
    fn any_bag_member_can_match() {
        assert_eq!(run(&Target::single(role_is("auditor"))), MatchResult::Match);
        assert_eq!(run(&Target::single(role_is("guest"))), MatchResult::NoMatch);
    }

    #[test]
    fn all_of_requires_every_match() {
        let both = AllOf::new().matching(role_is("admin")).matching(action_is("read"));
        let target = Target::new().any_of(AnyOf::new().all_of(both));
        assert_eq!(run(&target), MatchResult::Match);

        let mismatch = AllOf::new().matching(missing()).matching(action_is("write"));
        let target = Target::new().any_of(AnyOf::new().all_of(mismatch));
        assert_eq!(run(&target), MatchResult::NoMatch);
    }

    #[test]
    fn indeterminate_propagates_unless_something_matches() {
        let target = Target::new().any_of(
            AnyOf::new()
                .all_of(AllOf::new().matching(missing()))
                .all_of(AllOf::new().matching(role_is("admin"))),
        );
        assert_eq!(run(&target), MatchResult::Match);

        match run(&Target::single(missing())) {
            MatchResult::Indeterminate(err) => assert_eq!(err.status, StatusCode::MissingAttribute),
            other => panic!("expected indeterminate, got {other:?}"),
        }
    }

    #[test]
    fn target_indeterminate_beats_no_match() {
        let target = Target::new()
            .any_of(AnyOf::new().all_of(AllOf::new().matching(role_is("guest"))))
            .any_of(AnyOf::new().all_of(AllOf::new().matching(missing())));
        assert!(run(&target).is_indeterminate());
    }

    #[test]
    fn legacy_categories_with_absent_sections() {
        let target = Target::legacy(
            vec![AllOf::new().matching(role_is("admin"))],
            Vec::new(),
            vec![AllOf::new().matching(action_is("read"))],
            Vec::new(),
        );
        assert_eq!(run(&target), MatchResult::Match);
    }

    #[test]
    fn unknown_match_function_is_fatal() {
        let m = Match::new(
            "urn:example:similar",
            "admin",
            designator(category::ACCESS_SUBJECT, "role", dt::STRING),
        );
        let result = with_context(&request(), |ctx| match_target(Some(&Target::single(m)), ctx));
        assert!(matches!(result, Err(ConfigError::UnknownFunction { .. })));
    }
}
