//! Transit trip planning across multiple timetable providers.
//!
//! A query is matched against the coverage areas of configured providers,
//! answered by the best provider's plugin, and its walking legs are
//! upgraded with routed walking paths before the results are published.

pub mod domain;
pub mod geocode;
pub mod plugins;
pub mod provider;
pub mod recalc;
pub mod router;
pub mod walking;
pub mod web;

#[cfg(test)]
mod testing;
