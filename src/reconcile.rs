//! Reconcile requested keywords against the rows a service actually returned

use crate::types::KeywordResult;
use std::collections::HashSet;

/// Complete `obtained` so that every requested keyword appears exactly once.
///
/// Service rows come first, in service order, keeping only the first row per
/// keyword. Requested keywords with no row follow in request order as
/// placeholders; their figures are `Some(0)` when `null_to_zero` is set and
/// `None` otherwise. Keyword equality is exact, so `requested` must already be
/// normalized.
pub fn reconcile(
    requested: &[String],
    obtained: Vec<KeywordResult>,
    null_to_zero: bool,
    with_monthly_history: bool,
) -> Vec<KeywordResult> {
    let mut present: HashSet<String> = HashSet::with_capacity(obtained.len());
    let mut results = Vec::with_capacity(requested.len().max(obtained.len()));

    for row in obtained {
        if present.insert(row.keyword.clone()) {
            results.push(row);
        } else {
            log::debug!("Dropping duplicate row for keyword '{}'", row.keyword);
        }
    }

    let missing: Vec<&String> = requested
        .iter()
        .filter(|keyword| !present.contains(keyword.as_str()))
        .collect();

    if !missing.is_empty() {
        log::debug!(
            "{} of {} requested keywords had no data, adding placeholders",
            missing.len(),
            requested.len()
        );
    }

    results.extend(
        missing
            .into_iter()
            .map(|keyword| KeywordResult::placeholder(keyword, null_to_zero, with_monthly_history)),
    );

    results
}
