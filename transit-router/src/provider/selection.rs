//! Ranking providers by coverage of a query's endpoints.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::domain::Place;

use super::descriptor::ProviderDescriptor;

/// A provider covering both ends of a query, with the priority it ranks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub provider: &'a ProviderDescriptor,
    pub priority: Option<i64>,
}

/// Orders priorities ascending with `None` after every value.
pub fn compare_priority(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn better(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match compare_priority(a, b) {
        Ordering::Greater => b,
        _ => a,
    }
}

/// The priority `provider` has at `place`, or `None` if no area matches.
///
/// An area's own priority overrides the provider's; with several matching
/// areas the best one counts.
pub fn priority_at(provider: &ProviderDescriptor, place: &Place) -> Option<Option<i64>> {
    provider
        .areas
        .iter()
        .filter(|area| area.matches(place.country_code.as_deref(), &place.coordinate))
        .map(|area| area.priority.or(provider.priority))
        .reduce(better)
}

/// Providers covering both `origin` and `destination`, best first.
///
/// Each candidate ranks at the better of its two endpoint priorities.
/// Candidates without any priority come last, and ties keep configuration
/// order.
pub fn rank_providers<'a>(
    providers: &'a [ProviderDescriptor],
    origin: &Place,
    destination: &Place,
) -> Vec<Candidate<'a>> {
    let mut candidates: Vec<Candidate<'a>> = providers
        .iter()
        .filter_map(|provider| {
            if provider.areas.is_empty() {
                debug!(provider = %provider.name, "no coverage areas");
                return None;
            }
            let at_origin = priority_at(provider, origin)?;
            let at_destination = priority_at(provider, destination)?;
            Some(Candidate {
                provider,
                priority: better(at_origin, at_destination),
            })
        })
        .collect();

    candidates.sort_by(|a, b| compare_priority(a.priority, b.priority));
    trace!(
        candidates = ?candidates.iter().map(|c| &c.provider.name).collect::<Vec<_>>(),
        "ranked providers"
    );
    candidates
}
