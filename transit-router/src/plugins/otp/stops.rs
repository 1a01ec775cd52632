//! Snapping query places to transit stops.
//!
//! A router loaded with timetable data only cannot link arbitrary
//! coordinates to the network, so every query place is replaced by a stop
//! from the router's stop index before planning. Candidates within
//! [`STOP_SEARCH_RADIUS`] are ranked by straight-line distance; for the
//! start and the end the shortlist is re-ranked by walking distance.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::domain::{Coordinate, Query, RouteType, TransitOptions};
use crate::walking::WalkingRouteRefiner;

use super::types::{OtpStop, StopRoute};
use super::{OpenTripPlanner, get_json, mode_param};
use crate::plugins::PluginError;

/// Search radius around a query place, in meters.
pub const STOP_SEARCH_RADIUS: u32 = 2000;

/// Candidates kept per place.
pub const NUM_STOPS_TO_TRY: usize = 5;

/// A nearest stop closer than this is taken as is, in meters.
const NO_REFINEMENT_BELOW: f64 = 100.0;

/// Stop chosen to stand in for a query place.
#[derive(Debug, Clone, PartialEq)]
pub struct StopCandidate {
    pub id: String,
    pub name: Option<String>,
    pub coordinate: Coordinate,
    /// Meters from the query place; walking distance once refined.
    pub distance: f64,
}

impl StopCandidate {
    fn from_index(stop: OtpStop, place: &Coordinate) -> Self {
        let coordinate = Coordinate::new(stop.lat, stop.lon);
        Self {
            distance: stop.dist.unwrap_or_else(|| place.distance_to(&coordinate)),
            id: stop.id,
            name: stop.name,
            coordinate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    Via,
    End,
}

impl OpenTripPlanner {
    pub(super) fn index_url(&self) -> String {
        format!(
            "{}/routers/{}/index",
            self.base_url.trim_end_matches('/'),
            self.router
        )
    }

    /// Picks a stop for every query place, in query order.
    ///
    /// `None` means there is nothing to plan: some place has no suitable
    /// stop nearby, or a query without via points snaps its start and end
    /// to the same stop.
    pub(super) async fn snap_to_stops(
        &self,
        query: &Query,
        walking: &mut WalkingRouteRefiner,
    ) -> Result<Option<Vec<StopCandidate>>, PluginError> {
        let places = query.places();
        let last = places.len() - 1;
        let mut selected = Vec::with_capacity(places.len());

        for (index, place) in places.iter().enumerate() {
            let mut candidates = self.nearby_stops(&place.coordinate).await?;
            if let TransitOptions::Only(types) = &query.transit_options {
                candidates = self.stops_serving(candidates, types).await?;
            }
            sort_by_distance(&mut candidates);
            candidates.truncate(NUM_STOPS_TO_TRY);

            let position = match index {
                0 => Position::Start,
                i if i == last => Position::End,
                _ => Position::Via,
            };
            let Some(stop) =
                select_best_stop(candidates, &place.coordinate, position, walking).await
            else {
                debug!(place = %place.name, "no suitable stop nearby");
                return Ok(None);
            };
            trace!(
                place = %place.name,
                stop = %stop.id,
                stop_name = ?stop.name,
                distance = stop.distance,
                "snapped to stop"
            );
            selected.push(stop);
        }

        if let [start, end] = selected.as_slice() {
            if start.id == end.id {
                debug!(stop = %start.id, "start and end snap to the same stop");
                return Ok(None);
            }
        }
        Ok(Some(selected))
    }

    async fn nearby_stops(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<StopCandidate>, PluginError> {
        let params = vec![
            ("lat", coordinate.latitude.to_string()),
            ("lon", coordinate.longitude.to_string()),
            ("radius", STOP_SEARCH_RADIUS.to_string()),
        ];
        let url = format!("{}/stops", self.index_url());
        let stops: Vec<OtpStop> = self
            .inflight
            .run(get_json(self.http.clone(), url, params))
            .await?;
        Ok(stops
            .into_iter()
            .map(|stop| StopCandidate::from_index(stop, coordinate))
            .collect())
    }

    /// Keeps the candidates served by at least one of the selected types.
    async fn stops_serving(
        &self,
        candidates: Vec<StopCandidate>,
        types: &BTreeSet<RouteType>,
    ) -> Result<Vec<StopCandidate>, PluginError> {
        let mut serving = Vec::with_capacity(candidates.len());
        for stop in candidates {
            let url = format!("{}/stops/{}/routes", self.index_url(), stop.id);
            let routes: Vec<StopRoute> = self
                .inflight
                .run(get_json(self.http.clone(), url, Vec::new()))
                .await?;
            if routes.iter().any(|route| serves_selected_type(types, &route.mode)) {
                serving.push(stop);
            } else {
                trace!(stop = %stop.id, "stop not served by selected types");
            }
        }
        Ok(serving)
    }
}

fn serves_selected_type(types: &BTreeSet<RouteType>, mode: &str) -> bool {
    types.iter().any(|&route_type| {
        mode_param(route_type) == Some(mode) || (route_type == RouteType::Bus && mode == "TAXI")
    })
}

fn sort_by_distance(candidates: &mut [StopCandidate]) {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Picks the closest of `candidates`, which must be sorted by distance.
///
/// Unless the nearest stop is already very close, start and end candidates
/// are re-ranked by walking distance. A candidate without a walking route
/// keeps its straight-line distance. Via points are not refined.
async fn select_best_stop(
    mut candidates: Vec<StopCandidate>,
    place: &Coordinate,
    position: Position,
    walking: &mut WalkingRouteRefiner,
) -> Option<StopCandidate> {
    let nearest = candidates.first()?.distance;
    if nearest >= NO_REFINEMENT_BELOW && position != Position::Via {
        for stop in &mut candidates {
            let route = if position == Position::Start {
                walking.fetch_walking_route(place, &stop.coordinate).await
            } else {
                walking.fetch_walking_route(&stop.coordinate, place).await
            };
            if let Some(route) = route {
                stop.distance = route.distance;
            }
        }
        sort_by_distance(&mut candidates);
    }
    candidates.into_iter().next()
}
