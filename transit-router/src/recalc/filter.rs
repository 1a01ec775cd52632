//! Plausibility filtering for recalculated itineraries.

use crate::domain::Itinerary;

use super::config::RecalculationConfig;

/// Returns true if every walk in the itinerary can be done.
///
/// An itinerary is rejected when:
/// 1. Any walk is longer than the maximum walking distance
/// 2. An interior walk doesn't fit, with slack, between the arrival of the
///    leg before it and the departure of the leg after it
///
/// Gaps with unknown times are not checked.
pub fn is_realistic(itinerary: &Itinerary, config: &RecalculationConfig) -> bool {
    let legs = itinerary.legs();

    for (i, leg) in legs.iter().enumerate() {
        if leg.is_transit {
            continue;
        }

        if leg.distance > config.max_walking_distance {
            return false;
        }

        if i >= 1 && i + 1 < legs.len() {
            let (Some(arrival), Some(departure)) = (legs[i - 1].arrival, legs[i + 1].departure)
            else {
                continue;
            };
            let available = (departure - arrival).num_milliseconds() as f64 / 1000.0;
            if available < leg.duration + config.min_intermediate_walking_slack_secs {
                return false;
            }
        }
    }

    true
}

/// Drops walking-only itineraries unless the configuration allows them.
pub fn retain_walking_only(itineraries: &mut Vec<Itinerary>, config: &RecalculationConfig) {
    if !config.allow_walking_only {
        itineraries.retain(|it| !it.is_walking_only());
    }
}
