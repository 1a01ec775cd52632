//! MOTIS 1.x intermodal routing plugin.
//!
//! MOTIS routes the walks to and from stops itself but reports them as
//! straight lines, so walking legs are refined with the session's
//! [`WalkingRouteRefiner`](crate::walking::WalkingRouteRefiner) before the
//! results are published. Via points are not supported.
//!
//! Parameters:
//!
//! - `baseUrl` (required): URL the routing request is posted to
//! - `timezone`: IANA zone used for displayed times, `UTC` if absent

mod convert;
mod types;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::domain::{Itinerary, Plan, Query, TransitOptions};

use super::{InFlight, PluginError, PluginParams, PluginSession, TransitPlugin};

use types::{Connection, RoutingResponse};

/// Registry identifier.
pub const MOTIS: &str = "Motis";

/// Longest walk to or from a stop, in seconds.
const MAX_WALKING_DURATION: u32 = 20 * 60;

const MIN_CONNECTIONS: u32 = 5;

/// Gap between the last shown itinerary and the next search, in seconds.
const GAP_BEFORE_MORE_RESULTS_SECS: i64 = 60;

const TIMEOUT_SECS: u64 = 30;

/// MOTIS plugin.
#[derive(Debug)]
pub struct Motis {
    http: reqwest::Client,
    base_url: String,
    timezone: Tz,
    inflight: InFlight,
}

impl Motis {
    pub fn new(base_url: impl Into<String>, timezone: Tz) -> Result<Self, PluginError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            timezone,
            inflight: InFlight::new(),
        })
    }

    pub fn from_params(params: &PluginParams) -> Result<Self, PluginError> {
        let base_url = params.require_text("baseUrl")?;
        let timezone = match params.text("timezone") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| PluginError::InvalidParams(format!("timezone: unknown zone {name}")))?,
            None => Tz::UTC,
        };
        Self::new(base_url, timezone)
    }

    async fn fetch(&self, session: &mut PluginSession<'_>, extend_previous: bool) {
        if !session.query.via().is_empty() {
            debug!("via points are not supported");
            session.publish(Ok(Vec::new()), extend_previous);
            return;
        }

        let start = if extend_previous {
            let Some(cursor) = continuation(session.plan, session.query.arrive_by) else {
                debug!("no itineraries to continue from");
                session.plan.no_more_results();
                return;
            };
            cursor
        } else {
            start_time(session.query, self.timezone, Utc::now())
        };

        let body = request_body(session.query, start);
        trace!(%body, "routing request");
        let request = request_connections(self.http.clone(), self.base_url.clone(), body);

        let connections = match self.inflight.run(request).await {
            Ok(connections) => connections,
            Err(e) => {
                session.publish(Err(e), extend_previous);
                return;
            }
        };

        let mut itineraries = self.convert(&connections, session.query, extend_previous);
        session.walking.add_walking_to_itineraries(&mut itineraries).await;
        session.publish(Ok(itineraries), extend_previous);
    }

    fn convert(&self, connections: &[Connection], query: &Query, extend_previous: bool) -> Vec<Itinerary> {
        let origin = query.origin();
        let destination = query.destination();

        connections
            .iter()
            // a walk-only option was already shown with the first results
            .filter(|c| !(extend_previous && c.is_walking_only()))
            .filter_map(|c| {
                convert::convert_connection(c, origin, destination, self.timezone)
                    .inspect_err(|e| warn!(error = %e, "skipping connection"))
                    .ok()
            })
            .collect()
    }
}

#[async_trait]
impl TransitPlugin for Motis {
    async fn fetch_first_results(&self, session: &mut PluginSession<'_>) {
        self.fetch(session, false).await;
    }

    async fn fetch_more_results(&self, session: &mut PluginSession<'_>) {
        self.fetch(session, true).await;
    }

    fn cancel_current_request(&self) {
        if self.inflight.cancel() {
            debug!("cancelled MOTIS request");
        }
    }
}

fn continuation(plan: &Plan, arrive_by: bool) -> Option<DateTime<Utc>> {
    let last = plan.itineraries().last()?;
    let gap = Duration::seconds(GAP_BEFORE_MORE_RESULTS_SECS);
    Some(if arrive_by {
        last.arrival().to_utc() - gap
    } else {
        last.departure().to_utc() + gap
    })
}

/// The search start for a first fetch: the query's date and time in `tz`,
/// with today's date or the current time filling whatever is missing.
fn start_time(query: &Query, tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    if query.date.is_none() && query.time.is_none() {
        return now;
    }
    let local_now = now.with_timezone(&tz);
    let date = query.date.unwrap_or_else(|| local_now.date_naive());
    let time = query.time.unwrap_or_else(|| local_now.time());

    // a time skipped by a DST change falls back to now
    tz.from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|local| local.to_utc())
        .unwrap_or(now)
}

fn foot_mode() -> Value {
    json!({
        "mode_type": "FootPPR",
        "mode": {
            "search_options": {
                "duration_limit": MAX_WALKING_DURATION,
                "profile": "default"
            }
        }
    })
}

fn request_body(query: &Query, start: DateTime<Utc>) -> Value {
    let timestamp = start.timestamp();
    let arrive_by = query.arrive_by;
    let origin = query.origin().coordinate;
    let destination = query.destination().coordinate;
    let (end, search_dir) = if arrive_by {
        (timestamp - 1, "Backward")
    } else {
        (timestamp + 1, "Forward")
    };

    let mut body = json!({
        "destination": { "type": "Module", "target": "/intermodal" },
        "content_type": "IntermodalRoutingRequest",
        "content": {
            "start_type": "IntermodalPretripStart",
            "start": {
                "position": { "lat": origin.latitude, "lng": origin.longitude },
                "min_connection_count": MIN_CONNECTIONS,
                "interval": {
                    "begin": timestamp,
                    "end": end
                },
                "extend_interval_later": !arrive_by,
                "extend_interval_earlier": arrive_by
            },
            "start_modes": [foot_mode()],
            "destination_type": "InputPosition",
            "destination": { "lat": destination.latitude, "lng": destination.longitude },
            "destination_modes": [foot_mode()],
            "search_type": "Default",
            "search_dir": search_dir,
            "router": ""
        }
    });

    if let TransitOptions::Only(types) = &query.transit_options {
        let claszes: Vec<u8> = types
            .iter()
            .flat_map(|t| convert::claszes(*t).iter().copied())
            .collect();
        body["content"]["allowed_claszes"] = json!(claszes);
    }

    body
}

async fn request_connections(
    http: reqwest::Client,
    url: String,
    body: Value,
) -> Result<Vec<Connection>, PluginError> {
    let response = http.post(&url).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PluginError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = response.text().await?;
    let parsed: RoutingResponse = serde_json::from_str(&body).map_err(PluginError::json)?;
    Ok(parsed.content.map(|c| c.connections).unwrap_or_default())
}
