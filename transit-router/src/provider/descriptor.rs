//! Provider descriptors and their coverage areas.
//!
//! Descriptors are read from a JSON array of the form
//!
//! ```json
//! [
//!   {
//!     "provider": {
//!       "name": "Resrobot",
//!       "priority": 10,
//!       "plugin": "OpenTripPlanner",
//!       "params": { "baseUrl": "https://otp.example.se/otp" },
//!       "attribution": "Trafiklab",
//!       "attribution:sv": "Trafiklab",
//!       "attributionUrl": "https://www.trafiklab.se",
//!       "areas": [{ "countries": ["SE"] }, { "bbox": [55.0, 10.0, 60.0, 13.0], "priority": 5 }]
//!     }
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{BoundingBox, Coordinate};

use super::error::ProviderConfigError;

/// One coverage area of a provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Area {
    /// ISO 3166-1 alpha-2 codes
    #[serde(default)]
    pub countries: Option<Vec<String>>,
    /// `[south, west, north, east]`
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    /// Overrides the provider's priority where this area matches
    #[serde(default)]
    pub priority: Option<i64>,
}

impl Area {
    pub fn countries(codes: &[&str]) -> Self {
        Self {
            countries: Some(codes.iter().map(|c| c.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn bbox(bbox: BoundingBox) -> Self {
        Self {
            bbox: Some(vec![bbox.south, bbox.west, bbox.north, bbox.east]),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Whether a place with this country code and coordinate lies in the
    /// area.
    ///
    /// A malformed bounding box never matches, but the country list still
    /// applies.
    pub fn matches(&self, country_code: Option<&str>, coordinate: &Coordinate) -> bool {
        let in_country = match (&self.countries, country_code) {
            (Some(countries), Some(code)) => countries.iter().any(|c| c.eq_ignore_ascii_case(code)),
            _ => false,
        };
        if in_country {
            return true;
        }

        match self.bbox.as_deref().map(BoundingBox::from_slice) {
            Some(Ok(bbox)) => bbox.covers(coordinate),
            Some(Err(e)) => {
                debug!(error = %e, "ignoring malformed area bounding box");
                false
            }
            None => false,
        }
    }
}

/// A configured timetable provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub name: String,
    /// Lower wins; providers without one rank last
    #[serde(default)]
    pub priority: Option<i64>,
    /// Registry identifier of the plugin
    pub plugin: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub attribution: Option<String>,
    #[serde(default)]
    pub attribution_url: Option<String>,
    #[serde(default)]
    pub areas: Vec<Area>,
    /// Remaining keys, holding the `attribution:<lang>` variants
    #[serde(flatten)]
    other: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider: ProviderDescriptor,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, plugin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: None,
            plugin: plugin.into(),
            params: None,
            attribution: None,
            attribution_url: None,
            areas: Vec::new(),
            other: BTreeMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.areas.push(area);
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    pub fn with_localized_attribution(
        mut self,
        language: &str,
        attribution: impl Into<String>,
    ) -> Self {
        self.other.insert(
            format!("attribution:{language}"),
            Value::String(attribution.into()),
        );
        self
    }

    pub fn with_attribution_url(mut self, url: impl Into<String>) -> Self {
        self.attribution_url = Some(url.into());
        self
    }

    /// Attribution text, preferring the variant for `language`.
    pub fn attribution_for(&self, language: &str) -> Option<&str> {
        self.other
            .get(&format!("attribution:{language}"))
            .and_then(Value::as_str)
            .or(self.attribution.as_deref())
    }
}

/// Parses a JSON array of `{"provider": {...}}` entries.
pub fn parse_providers(json: &str) -> Result<Vec<ProviderDescriptor>, ProviderConfigError> {
    let entries: Vec<ProviderEntry> = serde_json::from_str(json)?;
    Ok(entries.into_iter().map(|e| e.provider).collect())
}

/// Reads provider descriptors from a file.
pub fn load_providers(path: impl AsRef<Path>) -> Result<Vec<ProviderDescriptor>, ProviderConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_providers(&contents)
}
