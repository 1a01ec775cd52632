//! Provider descriptors and provider selection.
//!
//! A descriptor names a plugin, its parameters and the areas it covers.
//! For a query the router ranks the descriptors covering both endpoints
//! and instantiates the best one that accepts its parameters.

mod descriptor;
mod error;
mod selection;

pub use descriptor::{Area, ProviderDescriptor, load_providers, parse_providers};
pub use error::ProviderConfigError;
pub use selection::{Candidate, compare_priority, priority_at, rank_providers};
