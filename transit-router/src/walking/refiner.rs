//! Session-scoped walking-route cache and refinement of walking legs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::domain::{Coordinate, Itinerary, Leg, seconds};

use super::{Route, RoutingBackend, RoutingError, TravelMode};

/// Cache key: the exact ordered coordinate pair, compared bitwise.
type RouteKey = ((u64, u64), (u64, u64));

/// Configuration for the walking-route cache.
#[derive(Debug, Clone)]
pub struct WalkingCacheConfig {
    /// Number of remembered routes above which the cache is cleared.
    pub max_entries: usize,
}

impl Default for WalkingCacheConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

impl WalkingCacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

/// Fetches routed walks and rewrites estimated walking legs with them.
///
/// Every lookup, including one that found no route, is remembered for the
/// rest of the session. All work is sequential: one backend request is in
/// flight at a time and the cache fills in a deterministic order.
#[derive(Debug)]
pub struct WalkingRouteRefiner {
    backend: Arc<dyn RoutingBackend>,
    routes: HashMap<RouteKey, Option<Arc<Route>>>,
    config: WalkingCacheConfig,
}

impl WalkingRouteRefiner {
    pub fn new(backend: Arc<dyn RoutingBackend>, config: WalkingCacheConfig) -> Self {
        Self {
            backend,
            routes: HashMap::new(),
            config,
        }
    }

    /// Number of remembered lookups.
    pub fn cached_routes(&self) -> usize {
        self.routes.len()
    }

    /// Forgets every remembered route.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Returns a pedestrian route from `from` to `to`, or `None` when the
    /// backend has none or failed.
    pub async fn fetch_walking_route(
        &mut self,
        from: &Coordinate,
        to: &Coordinate,
    ) -> Option<Arc<Route>> {
        let key = (from.bits(), to.bits());
        if let Some(cached) = self.routes.get(&key) {
            trace!(?from, ?to, hit = cached.is_some(), "walking route cache hit");
            return cached.clone();
        }

        let route = match self
            .backend
            .fetch_route(&[*from, *to], TravelMode::Pedestrian)
            .await
        {
            Ok(route) => Some(Arc::new(route)),
            Err(RoutingError::NoPath) => {
                debug!(?from, ?to, "no walking route");
                None
            }
            Err(e) => {
                warn!(?from, ?to, error = %e, "walking route request failed");
                None
            }
        };

        if self.routes.len() >= self.config.max_entries {
            debug!(entries = self.routes.len(), "walking route cache full, clearing");
            self.routes.clear();
        }
        self.routes.insert(key, route.clone());
        route
    }

    /// Builds a walking leg from `from` to `to`.
    ///
    /// With a route the leg takes its path, distance, duration and
    /// directions unchanged. Without one the leg is a straight line whose
    /// duration in seconds equals its length in meters, a deliberately slow
    /// 1 m/s estimate.
    pub fn create_walking_leg(
        from: &Coordinate,
        to: &Coordinate,
        from_name: &str,
        to_name: &str,
        route: Option<&Route>,
    ) -> Leg {
        match route {
            Some(route) => {
                let mut leg = Leg::walk(
                    from_name,
                    *from,
                    to_name,
                    *to,
                    route.distance,
                    route.duration_secs(),
                )
                .with_polyline(route.path.clone());
                leg.walking_instructions = route.turn_points.clone();
                leg
            }
            None => {
                let distance = from.distance_to(to);
                Leg::walk(from_name, *from, to_name, *to, distance, distance)
                    .with_polyline(vec![*from, *to])
            }
        }
    }

    /// Fetches a route and builds the walking leg for it in one step.
    pub async fn refined_walking_leg(
        &mut self,
        from: &Coordinate,
        to: &Coordinate,
        from_name: &str,
        to_name: &str,
    ) -> Leg {
        let route = self.fetch_walking_route(from, to).await;
        Self::create_walking_leg(from, to, from_name, to_name, route.as_deref())
    }

    /// Refines every non-transit leg of every itinerary in place.
    ///
    /// First and last legs always take the refined route. Interior legs
    /// take it only when it is no slower than the estimate. A replaced leg
    /// keeps the time at which it meets transit: a leading walk keeps its
    /// arrival, a trailing walk keeps its departure and an interior walk
    /// keeps both.
    pub async fn add_walking_to_itineraries(&mut self, itineraries: &mut [Itinerary]) {
        for itinerary in itineraries.iter_mut() {
            let count = itinerary.legs().len();

            for index in 0..count {
                let estimate = &itinerary.legs()[index];
                if estimate.is_transit {
                    continue;
                }

                let (from, to) = (estimate.from, estimate.to);
                let route = self.fetch_walking_route(&from, &to).await;

                let estimate = &itinerary.legs()[index];
                let mut refined = Self::create_walking_leg(
                    &from,
                    &to,
                    &estimate.from_name,
                    &estimate.to_name,
                    route.as_deref(),
                );

                let is_first = index == 0;
                let is_last = index + 1 == count;
                if !is_first && !is_last && refined.duration > estimate.duration {
                    trace!(index, "refined interior walk is slower, keeping estimate");
                    continue;
                }

                let walk = seconds(refined.duration);
                match (is_first, is_last) {
                    (true, false) => {
                        refined.arrival = estimate.arrival;
                        refined.departure = estimate.arrival.map(|t| t - walk);
                    }
                    (false, true) | (true, true) => {
                        refined.departure = estimate.departure;
                        refined.arrival = estimate.departure.map(|t| t + walk);
                    }
                    (false, false) => {
                        refined.departure = estimate.departure;
                        refined.arrival = estimate.arrival;
                    }
                }

                itinerary.legs_mut()[index] = refined;
            }

            itinerary.refresh_times_from_legs();
        }
    }
}
