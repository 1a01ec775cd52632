//! Shared fixtures for unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use parking_lot::Mutex;

use crate::domain::{Coordinate, TurnKind, TurnPoint};
use crate::walking::{Route, RoutingBackend, RoutingError, TravelMode};

/// Length of one degree of longitude on the equator, in meters.
const METERS_PER_DEGREE: f64 = 111_194.926_644_558_73;

/// A point on the equator.
pub fn origin() -> Coordinate {
    Coordinate::new(0.0, 10.0)
}

/// The point `meters` due east of `c` (exact on the equator).
pub fn east_of(c: &Coordinate, meters: f64) -> Coordinate {
    Coordinate::new(c.latitude, c.longitude + meters / METERS_PER_DEGREE)
}

/// The point `meters` due north of `c`.
pub fn north_of(c: &Coordinate, meters: f64) -> Coordinate {
    Coordinate::new(c.latitude + meters / METERS_PER_DEGREE, c.longitude)
}

/// A time on 2024-03-15 in UTC+01:00.
pub fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 15, h, m, 0)
        .unwrap()
}

type Key = ((u64, u64), (u64, u64));

/// Routing backend serving canned routes and counting requests.
///
/// Unknown pairs yield `NoPath`, or an API error when built with
/// [`FakeRoutingBackend::failing`].
#[derive(Debug, Default)]
pub struct FakeRoutingBackend {
    routes: Mutex<HashMap<Key, Route>>,
    requests: Mutex<Vec<(Coordinate, Coordinate)>>,
    fail: bool,
}

impl FakeRoutingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn route_between(from: &Coordinate, to: &Coordinate, distance: f64, time_ms: u64) -> Route {
        let mid = Coordinate::new(
            (from.latitude + to.latitude) / 2.0 + 0.0001,
            (from.longitude + to.longitude) / 2.0,
        );
        let turn = |coordinate, kind| TurnPoint {
            coordinate,
            kind: Some(kind),
            distance: 0.0,
            time_ms: 0,
            instruction: String::new(),
            turn_angle: None,
        };
        Route {
            path: vec![*from, mid, *to],
            turn_points: vec![turn(*from, TurnKind::Start), turn(*to, TurnKind::End)],
            distance,
            time_ms,
            bbox: None,
        }
    }

    pub fn add_route(&self, from: &Coordinate, to: &Coordinate, distance: f64, time_ms: u64) {
        self.routes.lock().insert(
            (from.bits(), to.bits()),
            Self::route_between(from, to, distance, time_ms),
        );
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests received, in order.
    pub fn requests(&self) -> Vec<(Coordinate, Coordinate)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RoutingBackend for FakeRoutingBackend {
    async fn fetch_route(
        &self,
        points: &[Coordinate],
        _mode: TravelMode,
    ) -> Result<Route, RoutingError> {
        let (from, to) = (points[0], points[points.len() - 1]);
        self.requests.lock().push((from, to));

        if self.fail {
            return Err(RoutingError::Api {
                status: 503,
                message: "unavailable".into(),
            });
        }

        self.routes
            .lock()
            .get(&(from.bits(), to.bits()))
            .cloned()
            .ok_or(RoutingError::NoPath)
    }
}
