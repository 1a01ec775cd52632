//! Caching layer for country-code lookups.
//!
//! Coordinates are snapped to a grid before lookup so nearby queries share
//! an entry. Negative answers are cached too; failed lookups are not.
//!
//! This is an approximation: a cell that straddles a border answers with the
//! country of whichever point was looked up first. The default 0.001° cells
//! (about 110 m north-south) keep that to points very close to the border.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::Coordinate;

use super::{CountryResolver, GeocodeError};

/// Cache key: latitude and longitude in grid cells.
type CellKey = (i32, i32);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,

    /// Grid cell size in degrees. Coarser cells save lookups but widen
    /// the strip along a border where a cached answer can be wrong.
    pub cell_degrees: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
            cell_degrees: 0.001,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_cell_degrees(mut self, cell_degrees: f64) -> Self {
        self.cell_degrees = cell_degrees;
        self
    }
}

/// Country resolver with caching.
///
/// Wraps any [`CountryResolver`] and caches its answers per grid cell.
#[derive(Debug)]
pub struct CachedCountryResolver<R> {
    inner: R,
    cells: MokaCache<CellKey, Option<Arc<str>>>,
    cell_degrees: f64,
}

impl<R: CountryResolver> CachedCountryResolver<R> {
    pub fn new(inner: R, config: &CacheConfig) -> Self {
        let cells = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            cells,
            cell_degrees: config.cell_degrees,
        }
    }

    fn cell(&self, coordinate: &Coordinate) -> CellKey {
        (
            (coordinate.latitude / self.cell_degrees).floor() as i32,
            (coordinate.longitude / self.cell_degrees).floor() as i32,
        )
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.cells.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.cells.invalidate_all();
    }
}

#[async_trait]
impl<R: CountryResolver> CountryResolver for CachedCountryResolver<R> {
    async fn resolve_country_code(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Option<String>, GeocodeError> {
        let key = self.cell(coordinate);

        if let Some(cached) = self.cells.get(&key).await {
            return Ok(cached.map(|code| code.to_string()));
        }

        let resolved = self.inner.resolve_country_code(coordinate).await?;
        self.cells
            .insert(key, resolved.as_deref().map(Arc::from))
            .await;
        Ok(resolved)
    }
}
