//! Country lookup for query places.
//!
//! Provider coverage is mostly declared per country, so places without a
//! known country code are resolved from their coordinate first.

mod cache;
mod error;
mod nominatim;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{BoundingBox, Coordinate};

pub use cache::{CacheConfig, CachedCountryResolver};
pub use error::GeocodeError;
pub use nominatim::{NominatimConfig, NominatimCountryResolver};

/// Resolves a coordinate to an ISO 3166-1 alpha-2 country code.
#[async_trait]
pub trait CountryResolver: Send + Sync + Debug {
    /// Returns the upper-case country code, or `None` if the coordinate is
    /// not in any country the resolver knows.
    async fn resolve_country_code(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<String>, GeocodeError>;
}

/// Resolves countries from a fixed table of bounding boxes.
///
/// Boxes are checked in insertion order; the first covering one wins.
#[derive(Debug, Clone, Default)]
pub struct StaticCountryResolver {
    regions: Vec<(BoundingBox, String)>,
}

impl StaticCountryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, bbox: BoundingBox, country_code: impl AsRef<str>) -> Self {
        self.regions
            .push((bbox, country_code.as_ref().to_ascii_uppercase()));
        self
    }

    pub fn lookup(&self, coordinate: &Coordinate) -> Option<&str> {
        self.regions
            .iter()
            .find(|(bbox, _)| bbox.covers(coordinate))
            .map(|(_, code)| code.as_str())
    }
}

#[async_trait]
impl CountryResolver for StaticCountryResolver {
    async fn resolve_country_code(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<String>, GeocodeError> {
        Ok(self.lookup(coordinate).map(str::to_string))
    }
}
