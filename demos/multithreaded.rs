use std::sync::Arc;
use std::thread;

use tracing_subscriber::EnvFilter;
use xacml_pdp::uri::{algorithm as alg, category, data_type as dt, function};
use xacml_pdp::{apply, designator, literal, Effect, PdpBuilder, Policy, XacmlVersion};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xacml_pdp=info")),
        )
        .with_target(false)
        .init();

    let adults = Policy::builder("adults", alg::RULE_FIRST_APPLICABLE)
        .rule("adult", Effect::Permit, |r| {
            r.when(apply(
                format!("{}integer-greater-than-or-equal", function::V1),
                [
                    apply(
                        format!("{}integer-one-and-only", function::V1),
                        [designator(category::ACCESS_SUBJECT, "age", dt::INTEGER).into()],
                    ),
                    literal(18_i64),
                ],
            ))
        })
        .rule("otherwise", Effect::Deny, |r| r)
        .build();

    let pdp = Arc::new(
        PdpBuilder::new()
            .root_policy(adults)
            .build()
            .expect("failed to build the PDP"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pdp = Arc::clone(&pdp);
            thread::spawn(move || {
                let age = 16_i64 + i64::from(i);
                let version = if i % 2 == 0 {
                    XacmlVersion::V3_0
                } else {
                    XacmlVersion::V2_0
                };
                let request = xacml_pdp::Request::builder(version)
                    .attribute(category::ACCESS_SUBJECT, "age", age)
                    .build();
                let results = pdp.evaluate(&request).expect("evaluation failed");
                println!("Thread {i} (age {age}, XACML {version}): {}", results[0].decision);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
