//! Walking-leg recalculation for itineraries from transit-only backends.
//!
//! A backend that only knows the timetable graph connects the query
//! endpoints to stops with straight lines, and sometimes rides a vehicle for
//! a stop or two where walking would be quicker. This pass rewrites the
//! boundary and interior walks of each itinerary with routed paths, and
//! drops short boundary rides in favour of walking.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::domain::{Itinerary, Leg, Place, Query};
use crate::walking::WalkingRouteRefiner;

use super::config::RecalculationConfig;
use super::filter::{is_realistic, retain_walking_only};

/// Rewrites walking legs and filters out implausible itineraries.
#[derive(Debug, Clone, Default)]
pub struct Recalculator {
    config: RecalculationConfig,
}

impl Recalculator {
    pub fn new(config: RecalculationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecalculationConfig {
        &self.config
    }

    /// Recalculates a batch of itineraries for `query`.
    ///
    /// Walking-only input is dropped up front (unless allowed). Each
    /// remaining itinerary is recalculated in order, then the results are
    /// filtered for plausibility and re-timed. The returned list may be
    /// empty.
    pub async fn recalculate_itineraries(
        &self,
        mut itineraries: Vec<Itinerary>,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) -> Vec<Itinerary> {
        let received = itineraries.len();
        retain_walking_only(&mut itineraries, &self.config);

        let mut recalculated = Vec::with_capacity(itineraries.len());
        for itinerary in itineraries {
            recalculated.push(self.recalculate_itinerary(itinerary, query, walking).await);
        }

        recalculated.retain(|it| is_realistic(it, &self.config));
        retain_walking_only(&mut recalculated, &self.config);
        for itinerary in &mut recalculated {
            itinerary.adjust_timings();
        }

        debug!(
            received,
            kept = recalculated.len(),
            "recalculated itineraries"
        );
        recalculated
    }

    /// Recalculates a single itinerary.
    pub async fn recalculate_itinerary(
        &self,
        mut itinerary: Itinerary,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) -> Itinerary {
        let start = query.origin();
        let end = query.destination();
        let min_walk = self.config.min_walk_routing_distance;

        let legs = match itinerary.legs() {
            [only] if !only.is_transit => {
                trace!("walking-only itinerary, routing between query endpoints");
                let mut walk = walk_between(walking, start, end).await;
                walk.departure = Some(itinerary.departure());
                vec![walk]
            }
            [only] => {
                let ride = only.clone();
                let start_walk = start.coordinate.distance_to(&ride.from);
                let end_walk = ride.to.distance_to(&end.coordinate);

                if start_walk >= min_walk && end_walk >= min_walk {
                    let first = walking
                        .refined_walking_leg(&start.coordinate, &ride.from, &start.name, &ride.from_name)
                        .await;
                    let last = walking
                        .refined_walking_leg(&ride.to, &end.coordinate, &ride.to_name, &end.name)
                        .await;
                    vec![first, ride, last]
                } else if end_walk >= min_walk {
                    let last = walking
                        .refined_walking_leg(&ride.to, &end.coordinate, &ride.to_name, &end.name)
                        .await;
                    vec![ride, last]
                } else {
                    self.recalculate_legs(vec![ride], query, walking).await
                }
            }
            legs => {
                let legs = legs.to_vec();
                self.recalculate_legs(legs, query, walking).await
            }
        };

        if let Err(e) = itinerary.replace_legs(legs) {
            warn!(error = %e, "recalculation produced no legs, keeping original");
        }
        itinerary
    }

    /// Processes legs left to right into a new sequence.
    async fn recalculate_legs(
        &self,
        legs: Vec<Leg>,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) -> Vec<Leg> {
        let total = legs.len();
        let mut input: VecDeque<Leg> = legs.into();
        let mut output = Vec::with_capacity(total + 2);
        let mut first = true;

        while let Some(leg) = input.pop_front() {
            if first {
                first = false;
                self.first_leg(leg, total, &mut input, &mut output, query, walking)
                    .await;
            } else if input.is_empty() {
                self.last_leg(leg, &mut output, query, walking).await;
            } else {
                self.interior_leg(leg, &mut input, &mut output, query, walking)
                    .await;
            }
        }

        output
    }

    async fn first_leg(
        &self,
        leg: Leg,
        total: usize,
        input: &mut VecDeque<Leg>,
        output: &mut Vec<Leg>,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) {
        let config = &self.config;
        let start = query.origin();
        let to_leg_start = start.coordinate.distance_to(&leg.from);
        let to_leg_end = start.coordinate.distance_to(&leg.to);

        let replace = if leg.is_transit {
            total > 1
                && (leg.distance <= config.min_transit_leg_distance
                    || (to_leg_end <= config.max_walk_optimization_distance
                        && to_leg_end - to_leg_start
                            <= config.max_walk_optimization_distance_difference))
        } else {
            leg.distance >= config.min_walk_routing_distance
        };

        if replace {
            let (mut to, mut to_name) = (leg.to, leg.to_name);
            if input.front().is_some_and(|next| !next.is_transit) {
                if let Some(next) = input.pop_front() {
                    trace!("folding second leg into leading walk");
                    to = next.to;
                    to_name = next.to_name;
                }
            }
            trace!(transit = leg.is_transit, "replacing first leg with walk");
            let walk = walking
                .refined_walking_leg(&start.coordinate, &to, &start.name, &to_name)
                .await;
            output.push(walk);
        } else {
            if to_leg_start >= config.min_walk_routing_distance {
                trace!(distance = to_leg_start, "prepending walk from query start");
                let walk = walking
                    .refined_walking_leg(&start.coordinate, &leg.from, &start.name, &leg.from_name)
                    .await;
                output.push(walk);
            }
            output.push(leg);
        }
    }

    async fn last_leg(
        &self,
        leg: Leg,
        output: &mut Vec<Leg>,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) {
        let config = &self.config;
        let end = query.destination();
        let from_leg_end = end.coordinate.distance_to(&leg.to);
        let from_leg_start = end.coordinate.distance_to(&leg.from);

        let replace = if leg.is_transit {
            leg.distance <= config.min_transit_leg_distance
                || (from_leg_start <= config.max_walk_optimization_distance
                    && from_leg_start - from_leg_end
                        <= config.max_walk_optimization_distance_difference)
        } else {
            leg.distance >= config.min_walk_routing_distance
        };

        if replace {
            let previous_is_walk = output.last().is_some_and(|previous| !previous.is_transit);
            let (from, from_name) = match output.pop() {
                Some(previous) if leg.is_transit && previous_is_walk => {
                    trace!("folding final ride and preceding walk into one walk");
                    (previous.from, previous.from_name)
                }
                Some(previous) => {
                    output.push(previous);
                    (leg.from, leg.from_name)
                }
                None => (leg.from, leg.from_name),
            };
            let walk = walking
                .refined_walking_leg(&from, &end.coordinate, &from_name, &end.name)
                .await;
            output.push(walk);
        } else {
            let remaining = leg.to.distance_to(&end.coordinate);
            let (to, to_name) = (leg.to, leg.to_name.clone());
            output.push(leg);
            if remaining >= config.min_walk_routing_distance {
                trace!(distance = remaining, "appending walk to query end");
                let walk = walking
                    .refined_walking_leg(&to, &end.coordinate, &to_name, &end.name)
                    .await;
                output.push(walk);
            }
        }
    }

    async fn interior_leg(
        &self,
        leg: Leg,
        input: &mut VecDeque<Leg>,
        output: &mut Vec<Leg>,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) {
        let config = &self.config;
        if leg.is_transit || leg.distance < config.min_walk_routing_distance {
            output.push(leg);
            return;
        }

        let (mut to, mut to_name) = (leg.to, leg.to_name);
        let final_is_short = input.len() == 1
            && input
                .front()
                .is_some_and(|next| next.distance <= config.min_transit_leg_distance);
        if final_is_short {
            trace!("walking past short final leg to query end");
            let end = query.destination();
            input.clear();
            to = end.coordinate;
            to_name = end.name.clone();
        }

        let walk = walking
            .refined_walking_leg(&leg.from, &to, &leg.from_name, &to_name)
            .await;
        output.push(walk);
    }
}

async fn walk_between(walking: &mut WalkingRouteRefiner, from: &Place, to: &Place) -> Leg {
    walking
        .refined_walking_leg(&from.coordinate, &to.coordinate, &from.name, &to.name)
        .await
}
