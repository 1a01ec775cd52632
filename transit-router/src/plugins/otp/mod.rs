//! OpenTripPlanner 1.x plugin.
//!
//! Queries the REST `plan` endpoint of a router. Deployments that load only
//! timetable data (no street network) are flagged with `onlyTransitData`:
//! query places are first snapped to nearby stops (see [`stops`]), planned
//! between stop ids, and the straight-line walks of the answer are passed
//! through the [`Recalculator`] before they are published.
//!
//! Parameters:
//!
//! - `baseUrl` (required): API root, e.g. `https://otp.example.org/otp`
//! - `router`: router id, `default` if absent
//! - `onlyTransitData`: router has no street network, `false` if absent

mod convert;
mod stops;
mod types;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::domain::{Plan, Query, RouteType, TransitOptions};
use crate::recalc::{RecalculationConfig, Recalculator};

use super::{InFlight, PluginError, PluginParams, PluginSession, TransitPlugin};

use stops::StopCandidate;
use types::PlanResponse;

/// Registry identifier.
pub const OPEN_TRIP_PLANNER: &str = "OpenTripPlanner";

const DEFAULT_ROUTER: &str = "default";

const NUM_ITINERARIES: u32 = 5;

/// Gap between the last shown itinerary and the next search, in seconds.
const GAP_BEFORE_MORE_RESULTS_SECS: i64 = 120;

/// Walk speed in m/s when planning between stops.
const STOP_WALK_SPEED: &str = "1.0";

const TIMEOUT_SECS: u64 = 30;

/// OpenTripPlanner plugin.
#[derive(Debug)]
pub struct OpenTripPlanner {
    http: reqwest::Client,
    base_url: String,
    router: String,
    only_transit_data: bool,
    recalculator: Recalculator,
    inflight: InFlight,
}

impl OpenTripPlanner {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PluginError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            router: DEFAULT_ROUTER.to_string(),
            only_transit_data: false,
            recalculator: Recalculator::default(),
            inflight: InFlight::new(),
        })
    }

    pub fn from_params(params: &PluginParams) -> Result<Self, PluginError> {
        let mut plugin = Self::new(params.require_text("baseUrl")?)?;
        if let Some(router) = params.text("router").filter(|r| !r.is_empty()) {
            plugin.router = router.to_string();
        }
        if let Some(only_transit_data) = params.flag("onlyTransitData") {
            plugin.only_transit_data = only_transit_data;
        }
        Ok(plugin)
    }

    pub fn with_recalculation(mut self, config: RecalculationConfig) -> Self {
        self.recalculator = Recalculator::new(config);
        self
    }

    fn plan_url(&self) -> String {
        format!(
            "{}/routers/{}/plan",
            self.base_url.trim_end_matches('/'),
            self.router
        )
    }

    async fn fetch(&self, session: &mut PluginSession<'_>, extend_previous: bool) {
        let cursor = if extend_previous {
            let Some(cursor) = continuation(session.plan, session.query.arrive_by) else {
                debug!("no itineraries to continue from");
                session.plan.no_more_results();
                return;
            };
            Some(cursor)
        } else {
            None
        };

        let places = if self.only_transit_data {
            match self.snap_to_stops(session.query, session.walking).await {
                Ok(Some(stops)) => stop_params(&stops),
                Ok(None) => {
                    session.publish(Ok(Vec::new()), extend_previous);
                    return;
                }
                Err(err) => {
                    session.publish(Err(err), extend_previous);
                    return;
                }
            }
        } else {
            location_params(session.query)
        };

        let params = plan_params(places, session.query, cursor, Local::now().date_naive());
        let request = request_plan(self.http.clone(), self.plan_url(), params);
        let result = match self.inflight.run(request).await {
            Ok(itineraries) if self.only_transit_data => Ok(self
                .recalculator
                .recalculate_itineraries(itineraries, session.query, session.walking)
                .await),
            other => other,
        };

        session.publish(result, extend_previous);
    }
}

#[async_trait]
impl TransitPlugin for OpenTripPlanner {
    async fn fetch_first_results(&self, session: &mut PluginSession<'_>) {
        self.fetch(session, false).await;
    }

    async fn fetch_more_results(&self, session: &mut PluginSession<'_>) {
        self.fetch(session, true).await;
    }

    fn cancel_current_request(&self) {
        if self.inflight.cancel() {
            debug!("cancelled OpenTripPlanner request");
        }
    }
}

/// Where the next page of results should start.
///
/// Leave-by searches continue shortly after the last itinerary's first
/// transit departure; arrive-by searches shortly before its last transit
/// arrival.
fn continuation(plan: &Plan, arrive_by: bool) -> Option<DateTime<FixedOffset>> {
    let last = plan.itineraries().last()?;
    let gap = Duration::seconds(GAP_BEFORE_MORE_RESULTS_SECS);
    Some(if arrive_by {
        last.transit_arrival().unwrap_or_else(|| last.arrival()) - gap
    } else {
        last.transit_departure().unwrap_or_else(|| last.departure()) + gap
    })
}

fn place_param(coordinate: &crate::domain::Coordinate) -> String {
    format!("{},{}", coordinate.latitude, coordinate.longitude)
}

fn mode_param(route_type: RouteType) -> Option<&'static str> {
    match route_type {
        RouteType::Tram => Some("TRAM"),
        RouteType::Subway => Some("SUBWAY"),
        RouteType::Train => Some("RAIL"),
        RouteType::Bus => Some("BUS"),
        RouteType::Ferry => Some("FERRY"),
        RouteType::CableCar => Some("CABLE_CAR"),
        RouteType::Gondola => Some("GONDOLA"),
        RouteType::Funicular => Some("FUNICULAR"),
        RouteType::Other(_) => None,
    }
}

/// Endpoints given as coordinates.
fn location_params(query: &Query) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("fromPlace", place_param(&query.origin().coordinate)),
        ("toPlace", place_param(&query.destination().coordinate)),
    ];
    for via in query.via() {
        params.push(("intermediatePlaces", place_param(&via.coordinate)));
    }
    params
}

/// Endpoints given as stop ids, one stop per query place in order.
fn stop_params(stops: &[StopCandidate]) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(stops.len() + 1);
    if let [first, intermediate @ .., last] = stops {
        params.push(("fromPlace", first.id.clone()));
        params.push(("toPlace", last.id.clone()));
        for stop in intermediate {
            params.push(("intermediatePlaces", stop.id.clone()));
        }
    }
    params.push(("walkSpeed", STOP_WALK_SPEED.to_string()));
    params
}

/// Appends the common plan endpoint parameters to the endpoint `params`.
///
/// `today` fills in the date when the query has a time but no date.
fn plan_params(
    mut params: Vec<(&'static str, String)>,
    query: &Query,
    cursor: Option<DateTime<FixedOffset>>,
    today: NaiveDate,
) -> Vec<(&'static str, String)> {
    params.push(("numItineraries", NUM_ITINERARIES.to_string()));
    params.push(("showIntermediateStops", "true".to_string()));

    if let Some(cursor) = cursor {
        params.push(("time", cursor.format("%H:%M").to_string()));
        params.push(("date", cursor.format("%Y-%m-%d").to_string()));
    } else {
        if let Some(time) = query.time {
            params.push(("time", time.format("%H:%M").to_string()));
        }
        match (query.date, query.time) {
            (Some(date), _) => params.push(("date", date.format("%Y-%m-%d").to_string())),
            (None, Some(_)) => params.push(("date", today.format("%Y-%m-%d").to_string())),
            (None, None) => {}
        }
    }

    if query.arrive_by {
        params.push(("arriveBy", "true".to_string()));
    }

    if let TransitOptions::Only(types) = &query.transit_options {
        let mut modes: Vec<&str> = types.iter().copied().filter_map(mode_param).collect();
        // without walking only trips starting and ending at a stop are found
        modes.push("WALK");
        params.push(("mode", modes.join(",")));
    }

    params
}

async fn get_json<T>(
    http: reqwest::Client,
    url: String,
    params: Vec<(&'static str, String)>,
) -> Result<T, PluginError>
where
    T: DeserializeOwned,
{
    trace!(%url, "requesting");
    let response = http
        .get(&url)
        .query(&params)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PluginError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(PluginError::json)
}

async fn request_plan(
    http: reqwest::Client,
    url: String,
    params: Vec<(&'static str, String)>,
) -> Result<Vec<crate::domain::Itinerary>, PluginError> {
    let parsed: PlanResponse = get_json(http, url, params).await?;

    if let Some(error) = parsed.error {
        if error.no_path || error.id == Some(404) {
            debug!(message = ?error.msg, "no trip found");
            return Ok(Vec::new());
        }
        return Err(PluginError::Api {
            status: error.id.and_then(|id| u16::try_from(id).ok()).unwrap_or(0),
            message: error.msg.unwrap_or_default(),
        });
    }

    Ok(parsed.plan.map(convert::convert_plan).unwrap_or_default())
}
