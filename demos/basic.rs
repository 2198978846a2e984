use tracing_subscriber::EnvFilter;
use xacml_pdp::uri::{algorithm as alg, attribute, category, data_type as dt, function};
use xacml_pdp::{
    apply, designator, literal, Effect, Match, ObligationExpression, PdpBuilder, Policy, Target,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xacml_pdp=debug")),
        )
        .with_target(false)
        .init();

    // Doctors may read medical records; everyone else is denied.
    let records = Policy::builder("medical-records", alg::RULE_DENY_UNLESS_PERMIT)
        .target(Target::single(Match::new(
            format!("{}string-equal", function::V1),
            "medical-record",
            designator(category::RESOURCE, attribute::RESOURCE_ID, dt::STRING),
        )))
        .rule("doctors-read", Effect::Permit, |r| {
            r.when(apply(
                format!("{}and", function::V1),
                [
                    apply(
                        format!("{}string-is-in", function::V1),
                        [
                            literal("doctor"),
                            designator(category::ACCESS_SUBJECT, "role", dt::STRING).into(),
                        ],
                    ),
                    apply(
                        format!("{}string-is-in", function::V1),
                        [
                            literal("read"),
                            designator(category::ACTION, attribute::ACTION_ID, dt::STRING).into(),
                        ],
                    ),
                ],
            ))
        })
        .obligation(
            ObligationExpression::new("urn:example:obligation:audit", Effect::Permit).assign(
                "reader",
                designator(category::ACCESS_SUBJECT, attribute::SUBJECT_ID, dt::STRING).into(),
            ),
        )
        .build();

    let pdp = PdpBuilder::new()
        .root_policy(records)
        .build()
        .expect("failed to build the PDP");

    for (subject, role, action) in [("alice", "doctor", "read"), ("bob", "clerk", "read")] {
        let request = pdp
            .request()
            .attribute(category::ACCESS_SUBJECT, attribute::SUBJECT_ID, subject)
            .attribute(category::ACCESS_SUBJECT, "role", role)
            .attribute(category::RESOURCE, attribute::RESOURCE_ID, "medical-record")
            .attribute(category::ACTION, attribute::ACTION_ID, action)
            .build();

        for result in pdp.evaluate(&request).expect("evaluation failed") {
            println!("{subject} ({role}) {action}: {} [{}]", result.decision, result.status);
            for obligation in &result.obligations {
                for assignment in &obligation.assignments {
                    println!("  {} {} = {}", obligation.id, assignment.attribute_id, assignment.value);
                }
            }
        }
    }
}
