use xacml_pdp::uri::{algorithm as alg, category, data_type as dt, function};
use xacml_pdp::{
    apply, designator, literal, variable, Attribute, Attributes, ConfigError, Decision, Effect,
    EvaluationResult, Expression, Match, ObligationExpression, Pdp, PdpBuilder, PdpConfig,
    PdpError, Policy, PolicySet, Request, StatusCode, Target, XacmlVersion,
};

fn string_is_in(role: &str, must_be_present: bool) -> Expression {
    let roles = designator(category::ACCESS_SUBJECT, "role", dt::STRING);
    let roles = if must_be_present {
        roles.must_be_present()
    } else {
        roles
    };
    apply(
        format!("{}string-is-in", function::V1),
        [literal(role), roles.into()],
    )
}

fn role_target(role: &str) -> Target {
    Target::single(Match::new(
        format!("{}string-equal", function::V1),
        role,
        designator(category::ACCESS_SUBJECT, "role", dt::STRING),
    ))
}

fn evaluate(pdp: &Pdp, request: &Request) -> EvaluationResult {
    let mut results = pdp.evaluate(request).unwrap();
    assert_eq!(results.len(), 1);
    results.remove(0)
}

fn as_role(version: XacmlVersion, role: &str) -> Request {
    Request::builder(version)
        .attribute(category::ACCESS_SUBJECT, "role", role)
        .build()
}

#[test]
fn unconditional_permit_carries_permit_obligations_only() {
    let policy = Policy::builder("records", alg::RULE_DENY_OVERRIDES)
        .rule("allow", Effect::Permit, |r| {
            r.when(literal(true))
                .obligation(ObligationExpression::new("rule-log", Effect::Permit))
                .obligation(ObligationExpression::new("rule-alarm", Effect::Deny))
        })
        .obligation(
            ObligationExpression::new("audit", Effect::Permit)
                .assign("reason", literal("unconditional")),
        )
        .obligation(ObligationExpression::new("notify", Effect::Deny))
        .build();
    let pdp = PdpBuilder::new().root_policy(policy).build().unwrap();

    let result = evaluate(&pdp, &pdp.request().build());
    assert_eq!(result.decision, Decision::Permit);
    assert_eq!(result.status.code, StatusCode::Ok);
    let ids: Vec<&str> = result.obligations.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["rule-log", "audit"]);
    assert!(result.obligations.iter().all(|o| o.effect == Effect::Permit));
    assert_eq!(result.obligations[1].assignments.len(), 1);
}

fn doctors_policy() -> Policy {
    Policy::builder("ward", alg::RULE_DENY_OVERRIDES)
        .rule("deny-guests", Effect::Deny, |r| r.target(role_target("guest")))
        .rule("permit-doctors", Effect::Permit, |r| {
            r.when(string_is_in("doctor", true))
        })
        .build()
}

#[test]
fn deny_overrides_with_unmatched_deny_rule_permits() {
    let pdp = PdpBuilder::new().root_policy(doctors_policy()).build().unwrap();
    for version in [XacmlVersion::V1_0, XacmlVersion::V2_0, XacmlVersion::V3_0] {
        let result = evaluate(&pdp, &as_role(version, "doctor"));
        assert_eq!(result.decision, Decision::Permit, "version {version}");
    }
}

#[test]
fn missing_required_attribute_is_indeterminate() {
    let pdp = PdpBuilder::new().root_policy(doctors_policy()).build().unwrap();

    let legacy = evaluate(&pdp, &Request::builder(XacmlVersion::V2_0).build());
    assert_eq!(legacy.decision, Decision::Indeterminate);
    assert_eq!(legacy.status.code, StatusCode::MissingAttribute);

    let current = evaluate(&pdp, &Request::builder(XacmlVersion::V3_0).build());
    assert_eq!(current.decision, Decision::IndeterminateP);
    assert_eq!(current.status.code, StatusCode::MissingAttribute);
}

#[test]
fn permit_overrides_over_inapplicable_policies_is_not_applicable() {
    let nobody = |id: &str| {
        Policy::builder(id, alg::RULE_DENY_OVERRIDES)
            .target(role_target("nobody"))
            .rule("r", Effect::Permit, |r| r)
            .build()
    };
    let set = PolicySet::builder("root", alg::POLICY_PERMIT_OVERRIDES)
        .child(nobody("a"))
        .child(nobody("b"))
        .build();
    let pdp = PdpBuilder::new().root_policy_set(set).build().unwrap();
    for version in [XacmlVersion::V1_1, XacmlVersion::V3_0] {
        let result = evaluate(&pdp, &as_role(version, "doctor"));
        assert_eq!(result.decision, Decision::NotApplicable);
    }
}

#[test]
fn variable_used_twice_matches_direct_evaluation() {
    let via_variable = Policy::builder("via-variable", alg::RULE_DENY_OVERRIDES)
        .variable("is-doctor", string_is_in("doctor", false))
        .rule("r", Effect::Permit, |r| {
            r.when(apply(
                format!("{}and", function::V1),
                [variable("is-doctor"), variable("is-doctor")],
            ))
        })
        .build();
    let direct = Policy::builder("direct", alg::RULE_DENY_OVERRIDES)
        .rule("r", Effect::Permit, |r| r.when(string_is_in("doctor", false)))
        .build();
    let via_variable = PdpBuilder::new().root_policy(via_variable).build().unwrap();
    let direct = PdpBuilder::new().root_policy(direct).build().unwrap();

    for role in ["doctor", "nurse"] {
        let request = as_role(XacmlVersion::V3_0, role);
        assert_eq!(
            evaluate(&via_variable, &request).decision,
            evaluate(&direct, &request).decision,
            "role {role}"
        );
    }
}

#[test]
fn parent_deny_discards_child_permit_obligations() {
    let permitting = Policy::builder("permitting", alg::RULE_DENY_OVERRIDES)
        .rule("allow", Effect::Permit, |r| r)
        .obligation(ObligationExpression::new("permit-log", Effect::Permit))
        .build();
    let denying = Policy::builder("denying", alg::RULE_DENY_OVERRIDES)
        .rule("deny", Effect::Deny, |r| r)
        .obligation(ObligationExpression::new("deny-log", Effect::Deny))
        .build();
    let set = PolicySet::builder("root", alg::POLICY_DENY_OVERRIDES)
        .child(permitting)
        .child(denying)
        .obligation(ObligationExpression::new("root-deny", Effect::Deny))
        .build();
    let pdp = PdpBuilder::new()
        .root_policy_set(set)
        .config(PdpConfig::default().with_policy_id_list(true))
        .build()
        .unwrap();

    let result = evaluate(&pdp, &pdp.request().build());
    assert_eq!(result.decision, Decision::Deny);
    let ids: Vec<&str> = result.obligations.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["deny-log", "root-deny"]);
    let policies: Vec<&str> = result
        .applicable_policies
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(policies, ["denying", "root"]);
}

#[test]
fn untargeted_rules_inherit_an_indeterminate_policy_target() {
    let department = Target::single(Match::new(
        format!("{}string-equal", function::V1),
        "cardiology",
        designator(category::RESOURCE, "department", dt::STRING).must_be_present(),
    ));
    let policy = Policy::builder("ward", alg::RULE_DENY_OVERRIDES)
        .target(department)
        .rule("allow", Effect::Permit, |r| r)
        .rule("refuse", Effect::Deny, |r| r)
        .build();
    let pdp = PdpBuilder::new().root_policy(policy).build().unwrap();

    let result = evaluate(&pdp, &as_role(XacmlVersion::V3_0, "doctor"));
    assert_eq!(result.decision, Decision::IndeterminateDP);
    assert_eq!(result.status.code, StatusCode::MissingAttribute);

    let legacy = evaluate(&pdp, &as_role(XacmlVersion::V2_0, "doctor"));
    assert_eq!(legacy.decision, Decision::Indeterminate);
}

#[test]
fn first_applicable_depends_on_rule_order() {
    let ordered = |first: Effect, second: Effect| {
        let policy = Policy::builder("p", alg::RULE_FIRST_APPLICABLE)
            .rule("first", first, |r| r)
            .rule("second", second, |r| r)
            .build();
        PdpBuilder::new().root_policy(policy).build().unwrap()
    };
    let request = Request::builder(XacmlVersion::V3_0).build();
    let pd = ordered(Effect::Permit, Effect::Deny);
    let dp = ordered(Effect::Deny, Effect::Permit);
    assert_eq!(evaluate(&pd, &request).decision, Decision::Permit);
    assert_eq!(evaluate(&dp, &request).decision, Decision::Deny);
}

#[test]
fn only_one_applicable_policy_selection() {
    let for_role = |id: &str, role: &str, effect: Effect| {
        Policy::builder(id, alg::RULE_DENY_OVERRIDES)
            .target(role_target(role))
            .rule("r", effect, |r| r)
            .build()
    };
    let set = PolicySet::builder("root", alg::POLICY_ONLY_ONE_APPLICABLE)
        .child(for_role("doctors", "doctor", Effect::Permit))
        .child(for_role("guests", "guest", Effect::Deny))
        .build();
    let pdp = PdpBuilder::new().root_policy_set(set).build().unwrap();

    let doctor = evaluate(&pdp, &as_role(XacmlVersion::V3_0, "doctor"));
    assert_eq!(doctor.decision, Decision::Permit);
    let nobody = evaluate(&pdp, &as_role(XacmlVersion::V3_0, "nurse"));
    assert_eq!(nobody.decision, Decision::NotApplicable);

    let both = Request::builder(XacmlVersion::V3_0)
        .with_attribute(
            category::ACCESS_SUBJECT,
            Attribute::new("role", "doctor").value("guest"),
        )
        .build();
    let ambiguous = evaluate(&pdp, &both);
    assert_eq!(ambiguous.decision, Decision::IndeterminateDP);
    let legacy = Request {
        version: XacmlVersion::V2_0,
        ..both
    };
    assert_eq!(evaluate(&pdp, &legacy).decision, Decision::Indeterminate);
}

#[test]
fn multiple_decisions_by_reference() {
    let pdp = PdpBuilder::new().root_policy(doctors_policy()).build().unwrap();
    let request = Request::builder(XacmlVersion::V3_0)
        .block(
            Attributes::new(category::ACCESS_SUBJECT)
                .id("alice")
                .attribute(Attribute::new("role", "doctor").include_in_result()),
        )
        .block(
            Attributes::new(category::ACCESS_SUBJECT)
                .id("bob")
                .attribute(Attribute::new("role", "guest").include_in_result()),
        )
        .multi_request(["alice"])
        .multi_request(["bob"])
        .multi_request(["carol"])
        .build();

    let results = pdp.evaluate(&request).unwrap();
    let decisions: Vec<Decision> = results.iter().map(|r| r.decision).collect();
    assert_eq!(
        decisions,
        [Decision::Permit, Decision::Deny, Decision::Indeterminate]
    );
    assert_eq!(results[0].attributes[0].id.as_deref(), Some("alice"));
    assert_eq!(results[1].attributes[0].id.as_deref(), Some("bob"));
    assert_eq!(results[2].status.code, StatusCode::SyntaxError);
}

#[test]
fn combined_decision_collapses_agreement() {
    let pdp = PdpBuilder::new().root_policy(doctors_policy()).build().unwrap();
    let request = Request::builder(XacmlVersion::V3_0)
        .block(
            Attributes::new(category::ACCESS_SUBJECT).attribute(Attribute::new("role", "doctor")),
        )
        .block(
            Attributes::new(category::ACCESS_SUBJECT)
                .attribute(Attribute::new("role", "doctor").value("nurse")),
        )
        .combined_decision(true)
        .build();
    let results = pdp.evaluate(&request).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].decision, Decision::Permit);
    assert_eq!(results[0].status.code, StatusCode::Ok);
}

#[test]
fn validation_rejects_broken_policies() {
    let undefined = Policy::builder("p", alg::RULE_DENY_OVERRIDES)
        .rule("r", Effect::Permit, |r| r.when(variable("nowhere")))
        .build();
    assert!(matches!(
        PdpBuilder::new().root_policy(undefined).build(),
        Err(PdpError::Config(ConfigError::UndefinedVariable { .. }))
    ));

    let duplicate = Policy::builder("p", alg::RULE_DENY_OVERRIDES)
        .rule("r", Effect::Permit, |r| r)
        .rule("r", Effect::Deny, |r| r)
        .build();
    assert!(matches!(
        PdpBuilder::new().root_policy(duplicate).build(),
        Err(PdpError::Config(ConfigError::DuplicateRule { .. }))
    ));

    let cyclic = Policy::builder("p", alg::RULE_DENY_OVERRIDES)
        .variable("a", variable("b"))
        .variable("b", variable("a"))
        .build();
    assert!(matches!(
        PdpBuilder::new().root_policy(cyclic).build(),
        Err(PdpError::Config(ConfigError::CyclicVariable { .. }))
    ));

    let unknown = Policy::builder("p", alg::RULE_DENY_OVERRIDES)
        .rule("r", Effect::Permit, |r| {
            r.when(apply("urn:example:telepathy", [literal(true)]))
        })
        .build();
    assert!(matches!(
        PdpBuilder::new().root_policy(unknown).build(),
        Err(PdpError::Config(ConfigError::UnknownFunction { .. }))
    ));

    let bad_reference = PolicySet::builder("shared", alg::POLICY_DENY_OVERRIDES)
        .child(
            Policy::builder("inner", "urn:example:majority-vote")
                .rule("r", Effect::Permit, |r| r)
                .build(),
        )
        .build();
    assert!(matches!(
        PdpBuilder::new()
            .root_policy_set(PolicySet::builder("root", alg::POLICY_DENY_OVERRIDES).build())
            .policy_set(bad_reference)
            .build(),
        Err(PdpError::Config(ConfigError::UnknownCombiningAlgorithm { .. }))
    ));
}
