//! Multiple Decision Profile: splitting a request into individual requests
//! and folding their results back into one.

use crate::types::{Attributes, EvaluationError, EvaluationResult, Request, Status};

/// Individual requests of `request`, in evaluation order.
///
/// Only 3.0 requests are split. Explicit references select blocks by id;
/// without them, categories repeated over several blocks expand into the
/// cartesian product of their blocks.
pub(crate) fn split(request: &Request) -> Vec<Result<Request, EvaluationError>> {
    if !request.version.is_v3() {
        return vec![Ok(request.clone())];
    }
    if !request.multi_requests.is_empty() {
        return request
            .multi_requests
            .iter()
            .map(|reference| {
                reference
                    .attributes_ids
                    .iter()
                    .map(|id| {
                        request
                            .attributes
                            .iter()
                            .find(|block| block.id.as_deref() == Some(id.as_str()))
                            .cloned()
                            .ok_or_else(|| {
                                EvaluationError::syntax(format!(
                                    "request reference names unknown attributes '{id}'"
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|blocks| individual(request, blocks))
            })
            .collect();
    }

    let mut categories: Vec<(&str, Vec<&Attributes>)> = Vec::new();
    for block in &request.attributes {
        match categories.iter_mut().find(|(c, _)| *c == block.category) {
            Some((_, blocks)) => blocks.push(block),
            None => categories.push((block.category.as_str(), vec![block])),
        }
    }
    if categories.iter().all(|(_, blocks)| blocks.len() <= 1) {
        return vec![Ok(request.clone())];
    }

    let mut combinations: Vec<Vec<Attributes>> = vec![Vec::new()];
    for (_, blocks) in &categories {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                blocks.iter().map(move |block| {
                    let mut next = prefix.clone();
                    next.push((*block).clone());
                    next
                })
            })
            .collect();
    }
    combinations
        .into_iter()
        .map(|blocks| Ok(individual(request, blocks)))
        .collect()
}

fn individual(request: &Request, attributes: Vec<Attributes>) -> Request {
    Request {
        version: request.version,
        attributes,
        return_policy_id_list: request.return_policy_id_list,
        combined_decision: false,
        multi_requests: Vec::new(),
    }
}

/// Blocks holding only the attributes flagged `include_in_result`.
pub(crate) fn echoed(request: &Request) -> Vec<Attributes> {
    request
        .attributes
        .iter()
        .filter_map(|block| {
            let attributes: Vec<_> = block
                .attributes
                .iter()
                .filter(|a| a.include_in_result)
                .cloned()
                .collect();
            (!attributes.is_empty()).then(|| Attributes {
                category: block.category.clone(),
                id: block.id.clone(),
                attributes,
            })
        })
        .collect()
}

/// Merge the results of individual requests into a single combined one.
///
/// Agreeing decisions without obligations or advice collapse into that
/// decision. Anything else cannot be combined and is Indeterminate.
pub(crate) fn combine(results: Vec<EvaluationResult>) -> EvaluationResult {
    let Some(first) = results.first() else {
        return EvaluationResult::indeterminate(&EvaluationError::processing(
            "no individual request to combine",
        ));
    };
    let decision = first.decision;
    let combinable = results.iter().all(|r| {
        r.decision == decision && r.obligations.is_empty() && r.advice.is_empty()
    });
    if !combinable {
        return EvaluationResult::indeterminate(&EvaluationError::processing(
            "individual decisions differ or carry obligations",
        ));
    }

    let status = if decision.is_indeterminate() {
        first.status.clone()
    } else {
        Status::ok()
    };
    let mut combined = EvaluationResult::new(decision, status);
    for result in results {
        for policy in result.applicable_policies {
            if !combined.applicable_policies.contains(&policy) {
                combined.applicable_policies.push(policy);
            }
        }
    }
    combined
}
