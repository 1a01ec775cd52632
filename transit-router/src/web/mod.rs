//! Web layer for the transit router.
//!
//! Provides a JSON API for planning trips and paging through results.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
