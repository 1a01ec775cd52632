//! OpenTripPlanner 1.x plan response types.
//!
//! Timestamps are milliseconds since the epoch; `agencyTimeZoneOffset` is
//! the agency's UTC offset in milliseconds.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub plan: Option<TripPlan>,
    #[serde(default)]
    pub error: Option<PlannerError>,
}

/// Error document OTP returns alongside a 200 status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerError {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub no_path: bool,
}

#[derive(Debug, Deserialize)]
pub struct TripPlan {
    #[serde(default)]
    pub itineraries: Vec<OtpItinerary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpItinerary {
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub transfers: Option<u32>,
    pub legs: Vec<OtpLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpLeg {
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub transit_leg: bool,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub route_type: Option<u16>,
    #[serde(default)]
    pub route_color: Option<String>,
    #[serde(default)]
    pub route_text_color: Option<String>,
    #[serde(default)]
    pub headsign: Option<String>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub agency_url: Option<String>,
    #[serde(default)]
    pub agency_time_zone_offset: i64,
    #[serde(default)]
    pub trip_short_name: Option<String>,
    pub distance: f64,
    pub duration: f64,
    pub from: OtpPlace,
    pub to: OtpPlace,
    #[serde(default)]
    pub leg_geometry: Option<EncodedPolyline>,
    #[serde(default)]
    pub intermediate_stops: Vec<OtpPlace>,
}

#[derive(Debug, Deserialize)]
pub struct OtpPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub arrival: Option<i64>,
    #[serde(default)]
    pub departure: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EncodedPolyline {
    pub points: String,
}

/// Entry of the stop index, as returned by a radius search.
#[derive(Debug, Deserialize)]
pub struct OtpStop {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the search point in meters.
    #[serde(default)]
    pub dist: Option<f64>,
}

/// Route serving a stop; only the mode matters here.
#[derive(Debug, Deserialize)]
pub struct StopRoute {
    #[serde(default)]
    pub mode: String,
}
