use std::sync::Arc;
use std::thread;

use xacml_pdp::uri::{algorithm as alg, category, data_type as dt, function};
use xacml_pdp::{
    apply, designator, literal, variable, Decision, Effect, ObligationExpression, Pdp,
    PdpBuilder, Policy, PolicySet, Request, XacmlVersion,
};

fn role_is(role: &str) -> xacml_pdp::Expression {
    apply(
        format!("{}string-is-in", function::V1),
        [
            literal(role),
            designator(category::ACCESS_SUBJECT, "role", dt::STRING).into(),
        ],
    )
}

fn ward() -> Pdp {
    let clinicians = Policy::builder("clinicians", alg::RULE_PERMIT_OVERRIDES)
        .variable(
            "clinical",
            apply(
                format!("{}or", function::V1),
                [role_is("doctor"), role_is("nurse")],
            ),
        )
        .rule("clinical-staff", Effect::Permit, |r| r.when(variable("clinical")))
        .obligation(
            ObligationExpression::new("log-access", Effect::Permit).assign(
                "role",
                designator(category::ACCESS_SUBJECT, "role", dt::STRING).into(),
            ),
        )
        .build();
    let banned = Policy::builder("banned", alg::RULE_DENY_OVERRIDES)
        .rule("banned", Effect::Deny, |r| r.when(role_is("banned")))
        .build();
    let root = PolicySet::builder("ward", alg::POLICY_DENY_OVERRIDES)
        .child(banned)
        .child(clinicians)
        .build();
    PdpBuilder::new().root_policy_set(root).build().unwrap()
}

fn with_roles(version: XacmlVersion, roles: &[&str]) -> Request {
    roles
        .iter()
        .fold(Request::builder(version), |b, role| {
            b.attribute(category::ACCESS_SUBJECT, "role", *role)
        })
        .build()
}

#[test]
fn evaluate_across_threads() {
    let pdp = Arc::new(ward());

    let cases: Vec<(Vec<&'static str>, XacmlVersion, Decision, usize)> = vec![
        (vec!["doctor"], XacmlVersion::V3_0, Decision::Permit, 1),
        (vec!["nurse"], XacmlVersion::V2_0, Decision::Permit, 1),
        (vec!["doctor", "banned"], XacmlVersion::V3_0, Decision::Deny, 0),
        (vec!["visitor"], XacmlVersion::V3_0, Decision::NotApplicable, 0),
        (vec!["visitor"], XacmlVersion::V1_0, Decision::NotApplicable, 0),
    ];

    let handles: Vec<_> = cases
        .into_iter()
        .map(|(roles, version, expected, obligations)| {
            let pdp = Arc::clone(&pdp);
            thread::spawn(move || {
                for _ in 0..200 {
                    let result = pdp.evaluate(&with_roles(version, &roles)).unwrap().remove(0);
                    assert_eq!(result.decision, expected, "roles {roles:?} in {version}");
                    assert_eq!(result.obligations.len(), obligations);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn per_request_state_does_not_leak() {
    let pdp = Arc::new(ward());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pdp = Arc::clone(&pdp);
            thread::spawn(move || {
                let role = if i % 2 == 0 { "doctor" } else { "nurse" };
                let result = pdp
                    .evaluate(&with_roles(XacmlVersion::V3_0, &[role]))
                    .unwrap()
                    .remove(0);
                let assignment = &result.obligations[0].assignments[0];
                assert_eq!(assignment.value.to_string(), role);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
