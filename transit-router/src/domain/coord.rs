//! Geographic primitives: coordinates and bounding boxes.

use std::fmt;

use super::DomainError;

/// Mean earth radius used for great-circle distances, in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance to `other`, in meters.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::Coordinate;
    ///
    /// let a = Coordinate::new(59.3293, 18.0686);
    /// assert_eq!(a.distance_to(&a), 0.0);
    /// ```
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Bit-exact key for hashing. Two coordinates share a key only if
    /// both components are bitwise identical.
    pub(crate) fn bits(&self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Decodes an encoded polyline (precision 5, as used by GraphHopper and
/// OpenTripPlanner) into coordinates.
pub fn decode_path(encoded: &str) -> Result<Vec<Coordinate>, String> {
    let line = polyline::decode_polyline(encoded, 5).map_err(|e| e.to_string())?;
    Ok(line.0.into_iter().map(|c| Coordinate::new(c.y, c.x)).collect())
}

/// An axis-aligned latitude/longitude rectangle.
///
/// The default box is "inverted" (covers nothing) so that extending it with
/// a single coordinate collapses it onto that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            south: 90.0,
            west: 180.0,
            north: -90.0,
            east: -180.0,
        }
    }
}

impl BoundingBox {
    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Parses the `[south, west, north, east]` form used in provider
    /// coverage definitions.
    pub fn from_slice(values: &[f64]) -> Result<Self, DomainError> {
        match values {
            [south, west, north, east] => Ok(Self::new(*south, *west, *north, *east)),
            _ => Err(DomainError::MalformedBoundingBox(values.len())),
        }
    }

    /// Smallest box containing every coordinate, or `None` for an empty input.
    pub fn from_coordinates<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut bbox = Self::default();
        let mut any = false;
        for coord in coords {
            bbox.extend(coord);
            any = true;
        }
        any.then_some(bbox)
    }

    /// Returns true if `coord` lies inside the box, edges included.
    pub fn covers(&self, coord: &Coordinate) -> bool {
        coord.latitude >= self.south
            && coord.latitude <= self.north
            && coord.longitude >= self.west
            && coord.longitude <= self.east
    }

    /// Grows the box to cover `coord`.
    pub fn extend(&mut self, coord: &Coordinate) {
        self.south = self.south.min(coord.latitude);
        self.north = self.north.max(coord.latitude);
        self.west = self.west.min(coord.longitude);
        self.east = self.east.max(coord.longitude);
    }

    /// Grows the box to cover everything `other` covers.
    pub fn compose(&mut self, other: &BoundingBox) {
        self.south = self.south.min(other.south);
        self.north = self.north.max(other.north);
        self.west = self.west.min(other.west);
        self.east = self.east.max(other.east);
    }

    /// Union of a sequence of boxes, or `None` if there are none.
    pub fn union<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Option<Self> {
        boxes.into_iter().fold(None, |acc, bbox| {
            let mut acc = acc.unwrap_or(*bbox);
            acc.compose(bbox);
            Some(acc)
        })
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}
