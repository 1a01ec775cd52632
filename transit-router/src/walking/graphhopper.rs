//! GraphHopper routing client.
//!
//! Talks to the GraphHopper `/route` endpoint and converts the first
//! returned path into a [`Route`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::domain::{BoundingBox, Coordinate, TurnKind, TurnPoint, decode_path};

use super::{Route, RoutingBackend, RoutingError, TravelMode};

/// Default base URL for the public GraphHopper API.
const DEFAULT_BASE_URL: &str = "https://graphhopper.com/api/1";

/// Configuration for the GraphHopper client.
#[derive(Debug, Clone)]
pub struct GraphHopperConfig {
    /// API key, sent as the `key` query parameter when present
    pub api_key: Option<String>,
    /// Base URL for the API (without the trailing `/route`)
    pub base_url: String,
    /// Locale for instruction texts
    pub locale: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GraphHopperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: "en".to_string(),
            timeout_secs: 20,
        }
    }
}

impl GraphHopperConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL (for self-hosted instances and testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    paths: Vec<ResponsePath>,
}

#[derive(Debug, Deserialize)]
struct ResponsePath {
    distance: f64,
    time: u64,
    points: String,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(default)]
    bbox: Option<[f64; 4]>,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    distance: f64,
    sign: i64,
    interval: [usize; 2],
    text: String,
    time: u64,
    #[serde(default)]
    turn_angle: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// GraphHopper routing API client.
#[derive(Debug, Clone)]
pub struct GraphHopperClient {
    http: reqwest::Client,
    config: GraphHopperConfig,
}

impl GraphHopperClient {
    pub fn new(config: GraphHopperConfig) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    fn profile(mode: TravelMode) -> &'static str {
        match mode {
            TravelMode::Pedestrian => "foot",
            TravelMode::Bicycle => "bike",
            TravelMode::Car => "car",
        }
    }

    fn convert_path(path: ResponsePath) -> Result<Route, RoutingError> {
        let coords = decode_path(&path.points).map_err(|message| RoutingError::Json {
            message,
            body: Some(path.points.clone()),
        })?;

        let mut turn_points = Vec::with_capacity(path.instructions.len() + 1);
        if let Some(start) = coords.first() {
            turn_points.push(TurnPoint {
                coordinate: *start,
                kind: Some(TurnKind::Start),
                distance: 0.0,
                time_ms: 0,
                instruction: String::new(),
                turn_angle: None,
            });
        }
        for instr in path.instructions {
            // an interval past the decoded path means a malformed response
            let Some(coordinate) = coords.get(instr.interval[0]) else {
                return Err(RoutingError::Json {
                    message: format!("instruction interval {} out of range", instr.interval[0]),
                    body: None,
                });
            };
            turn_points.push(TurnPoint {
                coordinate: *coordinate,
                kind: TurnKind::from_graphhopper_sign(instr.sign),
                distance: instr.distance,
                time_ms: instr.time,
                instruction: instr.text,
                turn_angle: instr.turn_angle,
            });
        }

        let bbox = path
            .bbox
            .map(|[min_lon, min_lat, max_lon, max_lat]| {
                BoundingBox::new(min_lat, min_lon, max_lat, max_lon)
            });

        Ok(Route {
            path: coords,
            turn_points,
            distance: path.distance,
            time_ms: path.time,
            bbox,
        })
    }
}

#[async_trait]
impl RoutingBackend for GraphHopperClient {
    async fn fetch_route(
        &self,
        points: &[Coordinate],
        mode: TravelMode,
    ) -> Result<Route, RoutingError> {
        let url = format!("{}/route", self.config.base_url);

        let mut query: Vec<(&str, String)> = points
            .iter()
            .map(|p| ("point", format!("{},{}", p.latitude, p.longitude)))
            .collect();
        query.push(("profile", Self::profile(mode).to_string()));
        query.push(("locale", self.config.locale.clone()));
        query.push(("instructions", "true".to_string()));
        if let Some(key) = &self.config.api_key {
            query.push(("key", key.clone()));
        }

        trace!(%url, points = points.len(), "requesting route");
        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();

        // GraphHopper reports unroutable points as a bad request
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            debug!(%message, "graphhopper found no route");
            return Err(RoutingError::NoPath);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed: RouteResponse =
            serde_json::from_str(&body).map_err(|e| RoutingError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        let path = parsed.paths.into_iter().next().ok_or(RoutingError::NoPath)?;
        Self::convert_path(path)
    }
}
