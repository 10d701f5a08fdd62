//! Tagged resource inventory
//!
//! Counts account resources by the service segment of their ARN
//! (`arn:partition:service:region:account:resource`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of resources owned by one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCount {
    pub service: String,
    pub count: u32,
}

/// Service segment of an ARN, if it has one
pub fn arn_service(arn: &str) -> Option<&str> {
    arn.split(':').nth(2)
}

/// Count ARNs per service, largest first. Equal counts keep service order.
pub fn count_by_service<I, S>(arns: I) -> Vec<ResourceCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for arn in arns {
        if let Some(service) = arn_service(arn.as_ref()) {
            *counts.entry(service.to_string()).or_default() += 1;
        }
    }

    let mut ranked: Vec<ResourceCount> = counts
        .into_iter()
        .map(|(service, count)| ResourceCount { service, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
