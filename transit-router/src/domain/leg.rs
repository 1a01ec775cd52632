//! Leg, stop and turn-point types.
//!
//! A `Leg` is one uninterrupted segment of an itinerary: either a ride on
//! a scheduled transit line or a walk. Walking legs produced by the timetable
//! backends are rough straight-line estimates until they are refined with a
//! routed path.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};

use super::{BoundingBox, Coordinate, RouteType};

/// Route colour used when the backend doesn't provide one.
pub const DEFAULT_ROUTE_COLOR: &str = "4c4c4c";

/// Route text colour used when the backend doesn't provide one.
pub const DEFAULT_ROUTE_TEXT_COLOR: &str = "ffffff";

/// An intermediate stop on a transit leg.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub name: String,
    pub coordinate: Coordinate,
    pub arrival: Option<DateTime<FixedOffset>>,
    pub departure: Option<DateTime<FixedOffset>>,
}

impl Stop {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinate,
            arrival: None,
            departure: None,
        }
    }
}

/// Kind of manoeuvre at a turn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    SharpLeft,
    Left,
    SlightLeft,
    Continue,
    SlightRight,
    Right,
    SharpRight,
    End,
    Via,
    Roundabout,
    Start,
}

impl TurnKind {
    /// Maps a GraphHopper instruction `sign` (-3 ..= 6).
    ///
    /// Returns `None` for signs outside the known range.
    pub fn from_graphhopper_sign(sign: i64) -> Option<Self> {
        let kind = match sign {
            -3 => TurnKind::SharpLeft,
            -2 => TurnKind::Left,
            -1 => TurnKind::SlightLeft,
            0 => TurnKind::Continue,
            1 => TurnKind::SlightRight,
            2 => TurnKind::Right,
            3 => TurnKind::SharpRight,
            4 => TurnKind::End,
            5 => TurnKind::Via,
            6 => TurnKind::Roundabout,
            _ => return None,
        };
        Some(kind)
    }
}

/// One step of turn-by-turn walking directions.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPoint {
    pub coordinate: Coordinate,
    pub kind: Option<TurnKind>,
    /// Distance to the next turn point, in meters.
    pub distance: f64,
    /// Time to the next turn point, in milliseconds.
    pub time_ms: u64,
    pub instruction: String,
    pub turn_angle: Option<f64>,
}

/// A leg of an itinerary.
///
/// Times are optional because estimated walking legs only receive concrete
/// times once the surrounding itinerary has been re-timed.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub is_transit: bool,
    pub route_id: Option<String>,
    /// Human readable route name, e.g. "43" or "Pendeltåg 43".
    pub route: Option<String>,
    pub route_type: Option<RouteType>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub headsign: Option<String>,
    pub agency_name: Option<String>,
    pub agency_url: Option<String>,
    pub trip_short_name: Option<String>,
    pub from_name: String,
    pub from: Coordinate,
    pub to_name: String,
    pub to: Coordinate,
    pub departure: Option<DateTime<FixedOffset>>,
    pub arrival: Option<DateTime<FixedOffset>>,
    /// Travelled distance in meters.
    pub distance: f64,
    /// Travel time in seconds.
    pub duration: f64,
    polyline: Option<Vec<Coordinate>>,
    pub intermediate_stops: Vec<Stop>,
    pub walking_instructions: Vec<TurnPoint>,
}

impl Leg {
    /// Creates a walking leg with no times and no path.
    pub fn walk(
        from_name: impl Into<String>,
        from: Coordinate,
        to_name: impl Into<String>,
        to: Coordinate,
        distance: f64,
        duration: f64,
    ) -> Self {
        Self {
            is_transit: false,
            route_id: None,
            route: None,
            route_type: None,
            color: None,
            text_color: None,
            headsign: None,
            agency_name: None,
            agency_url: None,
            trip_short_name: None,
            from_name: from_name.into(),
            from,
            to_name: to_name.into(),
            to,
            departure: None,
            arrival: None,
            distance,
            duration,
            polyline: None,
            intermediate_stops: Vec::new(),
            walking_instructions: Vec::new(),
        }
    }

    /// Creates a transit leg between two stops.
    ///
    /// Distance defaults to the great-circle distance between the stops and
    /// duration to the scheduled travel time.
    pub fn transit(
        route: impl Into<String>,
        from_name: impl Into<String>,
        from: Coordinate,
        to_name: impl Into<String>,
        to: Coordinate,
        departure: DateTime<FixedOffset>,
        arrival: DateTime<FixedOffset>,
    ) -> Self {
        let mut leg = Self::walk(from_name, from, to_name, to, from.distance_to(&to), 0.0);
        leg.is_transit = true;
        leg.route = Some(route.into());
        leg.departure = Some(departure);
        leg.arrival = Some(arrival);
        leg.duration = (arrival - departure).num_milliseconds() as f64 / 1000.0;
        leg
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_times(
        mut self,
        departure: DateTime<FixedOffset>,
        arrival: DateTime<FixedOffset>,
    ) -> Self {
        self.departure = Some(departure);
        self.arrival = Some(arrival);
        self
    }

    pub fn with_route_type(mut self, route_type: RouteType) -> Self {
        self.route_type = Some(route_type);
        self
    }

    pub fn with_agency(mut self, name: impl Into<String>) -> Self {
        self.agency_name = Some(name.into());
        self
    }

    pub fn with_stops(mut self, stops: Vec<Stop>) -> Self {
        self.intermediate_stops = stops;
        self
    }

    /// Sets an explicit path. An empty path is treated as absent.
    pub fn with_polyline(mut self, polyline: Vec<Coordinate>) -> Self {
        self.set_polyline(polyline);
        self
    }

    pub fn set_polyline(&mut self, polyline: Vec<Coordinate>) {
        self.polyline = (!polyline.is_empty()).then_some(polyline);
    }

    /// Returns true if the leg carries a path from the backend or router.
    pub fn has_explicit_polyline(&self) -> bool {
        self.polyline.is_some()
    }

    /// The leg's path.
    ///
    /// Without an explicit path this is derived from the endpoints and any
    /// intermediate stops.
    pub fn polyline(&self) -> Cow<'_, [Coordinate]> {
        match &self.polyline {
            Some(path) => Cow::Borrowed(path.as_slice()),
            None => {
                let mut path = Vec::with_capacity(self.intermediate_stops.len() + 2);
                path.push(self.from);
                path.extend(self.intermediate_stops.iter().map(|s| s.coordinate));
                path.push(self.to);
                Cow::Owned(path)
            }
        }
    }

    /// Bounding box of the leg's path.
    pub fn bbox(&self) -> BoundingBox {
        // the path always has at least the two endpoints
        BoundingBox::from_coordinates(self.polyline().iter()).unwrap_or_default()
    }

    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_ROUTE_COLOR)
    }

    pub fn text_color(&self) -> &str {
        self.text_color.as_deref().unwrap_or(DEFAULT_ROUTE_TEXT_COLOR)
    }

    /// A short route label suitable for an overview.
    ///
    /// Prefers the agency name when the route name merely repeats it, or
    /// when it is shorter than the trip number. Otherwise uses a short trip
    /// number (up to six characters), falling back to the route name.
    pub fn compact_route(&self) -> Option<&str> {
        let route = self.route.as_deref();
        let agency = self.agency_name.as_deref();
        let trip = self.trip_short_name.as_deref();

        match (route, agency, trip) {
            (Some(route), Some(agency), _) if route.starts_with(agency) => Some(agency),
            (_, Some(agency), Some(trip)) if agency.chars().count() < trip.chars().count() => {
                Some(agency)
            }
            (_, _, Some(trip)) if trip.chars().count() <= 6 => Some(trip),
            _ => route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, h, m, 0)
            .unwrap()
    }

    #[test]
    fn transit_duration_from_times() {
        let leg = Leg::transit(
            "43",
            "A",
            Coordinate::new(0.0, 0.0),
            "B",
            Coordinate::new(0.0, 0.01),
            at(10, 0),
            at(10, 25),
        );
        assert!(leg.is_transit);
        assert_eq!(leg.duration, 1500.0);
        assert!(leg.distance > 1000.0);
    }

    #[test]
    fn derived_polyline_uses_stops() {
        let leg = Leg::transit(
            "43",
            "A",
            Coordinate::new(0.0, 0.0),
            "C",
            Coordinate::new(0.0, 0.02),
            at(10, 0),
            at(10, 10),
        )
        .with_stops(vec![Stop::new("B", Coordinate::new(0.01, 0.01))]);

        assert!(!leg.has_explicit_polyline());
        let path = leg.polyline();
        assert_eq!(path.len(), 3);
        assert_eq!(path[1], Coordinate::new(0.01, 0.01));

        let bbox = leg.bbox();
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 0.01, 0.02));
    }

    #[test]
    fn explicit_polyline_wins() {
        let path = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.5, 0.5),
            Coordinate::new(0.0, 1.0),
        ];
        let leg = Leg::walk("A", path[0], "B", path[2], 1.0, 1.0).with_polyline(path.clone());
        assert_eq!(leg.polyline().as_ref(), path.as_slice());

        let leg = leg.with_polyline(Vec::new());
        assert_eq!(leg.polyline().len(), 2);
    }

    #[test]
    fn default_colors() {
        let leg = Leg::walk("A", Coordinate::new(0.0, 0.0), "B", Coordinate::new(0.0, 0.0), 0.0, 0.0);
        assert_eq!(leg.color(), DEFAULT_ROUTE_COLOR);
        assert_eq!(leg.text_color(), DEFAULT_ROUTE_TEXT_COLOR);
    }

    #[test]
    fn compact_route_prefers_agency_prefix() {
        let mut leg = Leg::walk("A", Coordinate::new(0.0, 0.0), "B", Coordinate::new(0.0, 0.0), 0.0, 0.0);
        leg.route = Some("SL Pendeltåg".into());
        leg.agency_name = Some("SL".into());
        assert_eq!(leg.compact_route(), Some("SL"));

        leg.route = Some("Regional 4711".into());
        leg.agency_name = Some("Västtrafik".into());
        leg.trip_short_name = Some("4711".into());
        assert_eq!(leg.compact_route(), Some("4711"));

        leg.trip_short_name = Some("Nattåget mot Narvik".into());
        assert_eq!(leg.compact_route(), Some("Västtrafik"));

        leg.agency_name = None;
        leg.trip_short_name = None;
        assert_eq!(leg.compact_route(), Some("Regional 4711"));
    }

    #[test]
    fn graphhopper_signs() {
        assert_eq!(TurnKind::from_graphhopper_sign(-3), Some(TurnKind::SharpLeft));
        assert_eq!(TurnKind::from_graphhopper_sign(4), Some(TurnKind::End));
        assert_eq!(TurnKind::from_graphhopper_sign(6), Some(TurnKind::Roundabout));
        assert_eq!(TurnKind::from_graphhopper_sign(-7), None);
    }
}
