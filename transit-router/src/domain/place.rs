//! Query types: places, transit filters and the search query itself.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};

use super::Coordinate;

/// A named location taking part in a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
    /// ISO 3166-1 alpha-2 code, upper case, if already known.
    pub country_code: Option<String>,
}

impl Place {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinate,
            country_code: None,
        }
    }

    /// Attaches a known country code, normalised to upper case.
    pub fn with_country_code(mut self, code: impl AsRef<str>) -> Self {
        self.country_code = Some(code.as_ref().to_ascii_uppercase());
        self
    }
}

/// Vehicle classes a route can belong to.
///
/// The numbering of the basic classes follows the GTFS `route_type` field.
/// Extended (hierarchical vehicle type) codes are carried as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RouteType {
    Tram,
    Subway,
    Train,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Other(u16),
}

impl RouteType {
    /// Maps a GTFS `route_type` code.
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => RouteType::Tram,
            1 => RouteType::Subway,
            2 => RouteType::Train,
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            5 => RouteType::CableCar,
            6 => RouteType::Gondola,
            7 => RouteType::Funicular,
            other => RouteType::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            RouteType::Tram => 0,
            RouteType::Subway => 1,
            RouteType::Train => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableCar => 5,
            RouteType::Gondola => 6,
            RouteType::Funicular => 7,
            RouteType::Other(code) => code,
        }
    }

    /// Parses the lower-case tag used in requests (`"bus"`, `"train"` ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "tram" => Some(RouteType::Tram),
            "subway" => Some(RouteType::Subway),
            "train" => Some(RouteType::Train),
            "bus" => Some(RouteType::Bus),
            "ferry" => Some(RouteType::Ferry),
            "cable_car" => Some(RouteType::CableCar),
            "gondola" => Some(RouteType::Gondola),
            "funicular" => Some(RouteType::Funicular),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            RouteType::Tram => "tram",
            RouteType::Subway => "subway",
            RouteType::Train => "train",
            RouteType::Bus => "bus",
            RouteType::Ferry => "ferry",
            RouteType::CableCar => "cable_car",
            RouteType::Gondola => "gondola",
            RouteType::Funicular => "funicular",
            RouteType::Other(_) => "other",
        }
    }
}

/// Which transit modes a query accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransitOptions {
    #[default]
    All,
    Only(BTreeSet<RouteType>),
}

impl TransitOptions {
    pub fn allows(&self, route_type: RouteType) -> bool {
        match self {
            TransitOptions::All => true,
            TransitOptions::Only(types) => types.contains(&route_type),
        }
    }
}

/// A routing query: origin, optional via points and destination.
///
/// # Invariants
///
/// - At least two places (origin and destination)
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    places: Vec<Place>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub arrive_by: bool,
    pub transit_options: TransitOptions,
}

impl Query {
    /// Creates a query from origin to destination, leaving now.
    pub fn new(origin: Place, destination: Place) -> Self {
        Self {
            places: vec![origin, destination],
            date: None,
            time: None,
            arrive_by: false,
            transit_options: TransitOptions::All,
        }
    }

    /// Inserts a via point just before the destination.
    pub fn with_via(mut self, place: Place) -> Self {
        let at = self.places.len() - 1;
        self.places.insert(at, place);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_arrive_by(mut self, arrive_by: bool) -> Self {
        self.arrive_by = arrive_by;
        self
    }

    pub fn with_transit_options(mut self, options: TransitOptions) -> Self {
        self.transit_options = options;
        self
    }

    /// All places in travel order.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Mutable access for filling in resolved country codes.
    pub(crate) fn places_mut(&mut self) -> &mut [Place] {
        &mut self.places
    }

    pub fn origin(&self) -> &Place {
        &self.places[0]
    }

    pub fn destination(&self) -> &Place {
        &self.places[self.places.len() - 1]
    }

    /// Via points between origin and destination.
    pub fn via(&self) -> &[Place] {
        &self.places[1..self.places.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, lat: f64, lon: f64) -> Place {
        Place::new(name, Coordinate::new(lat, lon))
    }

    #[test]
    fn via_points_go_before_destination() {
        let q = Query::new(place("a", 0.0, 0.0), place("c", 0.0, 2.0))
            .with_via(place("b", 0.0, 1.0));

        let names: Vec<_> = q.places().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(q.origin().name, "a");
        assert_eq!(q.destination().name, "c");
        assert_eq!(q.via().len(), 1);
    }

    #[test]
    fn country_code_is_upper_cased() {
        let p = place("x", 0.0, 0.0).with_country_code("se");
        assert_eq!(p.country_code.as_deref(), Some("SE"));
    }

    #[test]
    fn route_type_codes() {
        for code in 0..8 {
            assert_eq!(RouteType::from_code(code).code(), code);
        }
        assert_eq!(RouteType::from_code(700), RouteType::Other(700));
        assert_eq!(RouteType::from_tag("cable_car"), Some(RouteType::CableCar));
        assert_eq!(RouteType::from_tag("rocket"), None);
    }

    #[test]
    fn transit_options_filter() {
        assert!(TransitOptions::All.allows(RouteType::Ferry));

        let only = TransitOptions::Only([RouteType::Bus].into_iter().collect());
        assert!(only.allows(RouteType::Bus));
        assert!(!only.allows(RouteType::Train));
    }
}
