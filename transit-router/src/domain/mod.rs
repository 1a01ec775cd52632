//! Domain types for the transit router.
//!
//! This module contains the itinerary model: coordinates, places and
//! queries, legs, itineraries and the plan that collects them. These are
//! pure data types with no I/O; itineraries enforce their invariants at
//! construction time.

mod coord;
mod error;
mod itinerary;
mod leg;
mod place;
mod plan;

pub use coord::{BoundingBox, Coordinate, decode_path};
pub use error::DomainError;
pub use itinerary::{Itinerary, WALK_SLACK_SECS};
pub(crate) use itinerary::seconds;
pub use leg::{DEFAULT_ROUTE_COLOR, DEFAULT_ROUTE_TEXT_COLOR, Leg, Stop, TurnKind, TurnPoint};
pub use place::{Place, Query, RouteType, TransitOptions};
pub use plan::{Plan, PlanEvent, PlanSignal, compare_itineraries};
