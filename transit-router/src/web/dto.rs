//! Data transfer objects for web requests and responses.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BoundingBox, Coordinate, Itinerary, Leg, Place, Plan, PlanSignal, Query, RouteType, Stop,
    TransitOptions, TurnPoint,
};

/// A place in a plan request.
#[derive(Debug, Deserialize)]
pub struct PlaceRequest {
    pub name: String,
    pub lat: f64,
    pub lon: f64,

    /// ISO country code, looked up from the coordinate when absent
    pub country_code: Option<String>,
}

impl PlaceRequest {
    fn to_place(&self) -> Result<Place, String> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(format!("invalid coordinate for {}", self.name));
        }
        let place = Place::new(&self.name, Coordinate::new(self.lat, self.lon));
        Ok(match &self.country_code {
            Some(code) => place.with_country_code(code),
            None => place,
        })
    }
}

/// Request to plan a trip.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub origin: PlaceRequest,
    pub destination: PlaceRequest,

    #[serde(default)]
    pub via: Vec<PlaceRequest>,

    /// Date in YYYY-MM-DD format (defaults to today)
    pub date: Option<String>,

    /// Time in HH:MM format (defaults to now)
    pub time: Option<String>,

    #[serde(default)]
    pub arrive_by: bool,

    /// Transit mode tags (`"bus"`, `"train"` ...); all modes when absent
    pub modes: Option<Vec<String>>,
}

impl PlanRequest {
    /// Validates the request and builds the query.
    pub fn to_query(&self) -> Result<Query, String> {
        let mut query = Query::new(self.origin.to_place()?, self.destination.to_place()?)
            .with_arrive_by(self.arrive_by);

        for via in &self.via {
            query = query.with_via(via.to_place()?);
        }

        if let Some(date) = &self.date {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| format!("invalid date: {date}"))?;
            query = query.with_date(date);
        }

        if let Some(time) = &self.time {
            let time = NaiveTime::parse_from_str(time, "%H:%M")
                .map_err(|_| format!("invalid time: {time}"))?;
            query = query.with_time(time);
        }

        if let Some(modes) = &self.modes {
            let types = modes
                .iter()
                .map(|tag| RouteType::from_tag(tag).ok_or_else(|| format!("unknown mode: {tag}")))
                .collect::<Result<BTreeSet<_>, _>>()?;
            query = query.with_transit_options(TransitOptions::Only(types));
        }

        Ok(query)
    }
}

/// A plan snapshot.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    /// `ok`, or the signal raised by the last search
    pub status: &'static str,

    /// Name of the provider that served the results
    pub provider: Option<String>,

    pub attribution: Option<String>,
    pub attribution_url: Option<String>,

    pub bbox: Option<BboxResult>,

    pub itineraries: Vec<ItineraryResult>,
}

impl PlanResponse {
    pub fn from_plan(plan: &Plan, provider: Option<&str>) -> Self {
        Self {
            status: plan.outcome().map_or("ok", signal_status),
            provider: provider.map(str::to_string),
            attribution: plan.attribution.clone(),
            attribution_url: plan.attribution_url.clone(),
            bbox: plan.bbox().map(BboxResult::from),
            itineraries: plan
                .itineraries()
                .iter()
                .map(ItineraryResult::from_itinerary)
                .collect(),
        }
    }
}

fn signal_status(signal: PlanSignal) -> &'static str {
    match signal {
        PlanSignal::NoProvider => "no_provider",
        PlanSignal::NoRouteFound => "no_route_found",
        PlanSignal::NoMoreResults => "no_more_results",
        PlanSignal::RequestFailed => "request_failed",
    }
}

#[derive(Debug, Serialize)]
pub struct BboxResult {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl From<BoundingBox> for BboxResult {
    fn from(b: BoundingBox) -> Self {
        Self {
            south: b.south,
            west: b.west,
            north: b.north,
            east: b.east,
        }
    }
}

/// An itinerary option.
#[derive(Debug, Serialize)]
pub struct ItineraryResult {
    /// RFC 3339 timestamps with the local offset
    pub departure: String,
    pub arrival: String,

    pub duration_secs: f64,
    pub transfers: u32,
    pub walking_only: bool,
    pub legs: Vec<LegResult>,
}

impl ItineraryResult {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            departure: itinerary.departure().to_rfc3339(),
            arrival: itinerary.arrival().to_rfc3339(),
            duration_secs: itinerary.duration(),
            transfers: itinerary.transfers(),
            walking_only: itinerary.is_walking_only(),
            legs: itinerary.legs().iter().map(LegResult::from_leg).collect(),
        }
    }
}

/// One leg of an itinerary.
#[derive(Debug, Serialize)]
pub struct LegResult {
    /// `transit` or `walk`
    pub mode: &'static str,

    pub route: Option<String>,
    pub route_type: Option<&'static str>,
    pub color: String,
    pub text_color: String,
    pub headsign: Option<String>,
    pub agency: Option<String>,

    pub from: StopResult,
    pub to: StopResult,

    /// Meters
    pub distance: f64,
    /// Seconds
    pub duration: f64,

    /// `[lat, lon]` pairs
    pub polyline: Vec<[f64; 2]>,

    pub stops: Vec<StopResult>,
    pub instructions: Vec<InstructionResult>,
}

impl LegResult {
    pub fn from_leg(leg: &Leg) -> Self {
        Self {
            mode: if leg.is_transit { "transit" } else { "walk" },
            route: leg.compact_route().map(str::to_string),
            route_type: leg.route_type.map(RouteType::tag),
            color: leg.color().to_string(),
            text_color: leg.text_color().to_string(),
            headsign: leg.headsign.clone(),
            agency: leg.agency_name.clone(),
            from: StopResult::new(&leg.from_name, &leg.from, None, leg.departure),
            to: StopResult::new(&leg.to_name, &leg.to, leg.arrival, None),
            distance: leg.distance,
            duration: leg.duration,
            polyline: leg
                .polyline()
                .iter()
                .map(|c| [c.latitude, c.longitude])
                .collect(),
            stops: leg.intermediate_stops.iter().map(StopResult::from_stop).collect(),
            instructions: leg
                .walking_instructions
                .iter()
                .map(InstructionResult::from_turn_point)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StopResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub arrival: Option<String>,
    pub departure: Option<String>,
}

impl StopResult {
    fn new(
        name: &str,
        coordinate: &Coordinate,
        arrival: Option<DateTime<FixedOffset>>,
        departure: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            name: name.to_string(),
            lat: coordinate.latitude,
            lon: coordinate.longitude,
            arrival: arrival.map(|t| t.to_rfc3339()),
            departure: departure.map(|t| t.to_rfc3339()),
        }
    }

    fn from_stop(stop: &Stop) -> Self {
        Self::new(&stop.name, &stop.coordinate, stop.arrival, stop.departure)
    }
}

/// A turn-by-turn walking instruction.
#[derive(Debug, Serialize)]
pub struct InstructionResult {
    pub text: String,
    pub lat: f64,
    pub lon: f64,
    pub distance: f64,
    pub time_ms: u64,
}

impl InstructionResult {
    fn from_turn_point(turn: &TurnPoint) -> Self {
        Self {
            text: turn.instruction.clone(),
            lat: turn.coordinate.latitude,
            lon: turn.coordinate.longitude,
            distance: turn.distance,
            time_ms: turn.time_ms,
        }
    }
}

/// Response for cancel requests.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Whether a provider was active to cancel
    pub cancelled: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
