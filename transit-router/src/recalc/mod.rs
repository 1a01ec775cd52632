//! Itinerary recalculation for transit-only backends.
//!
//! Backends that route on a timetable graph without street data return
//! itineraries whose walks are straight-line guesses. The [`Recalculator`]
//! replaces those walks with routed ones, turns very short boundary rides
//! into walks, and discards itineraries that cannot physically be done.

mod config;
mod filter;
mod recalculate;


pub use config::RecalculationConfig;
pub use filter::{is_realistic, retain_walking_only};
pub use recalculate::Recalculator;
