//! Nominatim reverse-geocoding client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::trace;

use crate::domain::Coordinate;

use super::{CountryResolver, GeocodeError};

/// Default base URL for the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

const DEFAULT_USER_AGENT: &str = concat!("transit-router/", env!("CARGO_PKG_VERSION"));

/// Zoom level 3 resolves to the country.
const COUNTRY_ZOOM: u8 = 3;

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL for the API (without the trailing `/reverse`)
    pub base_url: String,
    /// Sent as `User-Agent`, which the public instance requires
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl NominatimConfig {
    /// Set a custom base URL (for self-hosted instances and testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
    /// Set instead of `address` when nothing is found, e.g. at sea
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    country_code: Option<String>,
}

/// Client for the Nominatim `/reverse` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimCountryResolver {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimCountryResolver {
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| GeocodeError::Api {
            status: 0,
            message: "invalid user agent".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl CountryResolver for NominatimCountryResolver {
    async fn resolve_country_code(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<String>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let query = [
            ("format", "jsonv2".to_string()),
            ("lat", coordinate.latitude.to_string()),
            ("lon", coordinate.longitude.to_string()),
            ("zoom", COUNTRY_ZOOM.to_string()),
        ];

        trace!(%url, %coordinate, "reverse geocoding");
        let response = self.http.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed: ReverseResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Json {
                message: e.to_string(),
            })?;

        if let Some(error) = parsed.error {
            trace!(%error, "no reverse geocoding result");
            return Ok(None);
        }

        Ok(parsed
            .address
            .and_then(|a| a.country_code)
            .filter(|code| !code.is_empty())
            .map(|code| code.to_ascii_uppercase()))
    }
}
