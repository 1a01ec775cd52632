//! Walking routes for itineraries.
//!
//! Timetable backends usually describe walks as straight lines with a rough
//! duration. This module turns such estimates into routed paths with
//! turn-by-turn directions, using a pluggable [`RoutingBackend`] and a
//! per-session cache.

mod error;
mod graphhopper;
mod refiner;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{BoundingBox, Coordinate, TurnPoint};

pub use error::RoutingError;
pub use graphhopper::{GraphHopperClient, GraphHopperConfig};
pub use refiner::{WalkingCacheConfig, WalkingRouteRefiner};

/// How the route will be travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelMode {
    Pedestrian,
    Bicycle,
    Car,
}

/// A routed path returned by a [`RoutingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<Coordinate>,
    pub turn_points: Vec<TurnPoint>,
    /// Length in meters.
    pub distance: f64,
    /// Travel time in milliseconds.
    pub time_ms: u64,
    pub bbox: Option<BoundingBox>,
}

impl Route {
    /// Travel time in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// A street-routing service.
#[async_trait]
pub trait RoutingBackend: Send + Sync + Debug {
    /// Routes through `points` in order.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NoPath`] when the backend has no route, and
    /// other variants for transport or decoding failures.
    async fn fetch_route(&self, points: &[Coordinate], mode: TravelMode)
    -> Result<Route, RoutingError>;
}
