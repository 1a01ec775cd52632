//! Transit provider plugins.
//!
//! A plugin wraps one timetable backend. The router picks a plugin per
//! query and drives it through the [`TransitPlugin`] contract; the plugin
//! publishes what it found into the session's [`Plan`].
//!
//! Plugins are instantiated by identifier through a [`PluginRegistry`].
//! The built-in registry knows:
//!
//! - `OpenTripPlanner`: OpenTripPlanner 1.x REST API
//! - `Motis`: MOTIS 1.x intermodal routing

mod convert;
mod error;
mod motis;
mod otp;
mod params;
mod request;

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{Itinerary, Plan, Query};
use crate::walking::WalkingRouteRefiner;

pub use convert::ConversionError;
pub use error::PluginError;
pub use motis::{MOTIS, Motis};
pub use otp::{OPEN_TRIP_PLANNER, OpenTripPlanner};
pub use params::{MAX_PARAM_LEN, ParamValue, PluginParams};
pub use request::InFlight;

/// What a plugin gets to work with for one fetch.
#[derive(Debug)]
pub struct PluginSession<'a> {
    pub query: &'a Query,
    pub plan: &'a mut Plan,
    pub walking: &'a mut WalkingRouteRefiner,
}

impl PluginSession<'_> {
    /// Publishes the outcome of a backend request.
    ///
    /// Results go to [`Plan::present_results`]. A cancelled request
    /// publishes nothing; any other failure signals `RequestFailed`.
    pub fn publish(&mut self, result: Result<Vec<Itinerary>, PluginError>, extend_previous: bool) {
        match result {
            Ok(itineraries) => {
                self.plan
                    .present_results(itineraries, self.query.arrive_by, extend_previous);
            }
            Err(PluginError::Cancelled) => debug!("request cancelled, plan left as is"),
            Err(e) => {
                warn!(error = %e, "transit request failed");
                self.plan.request_failed();
            }
        }
    }
}

/// The contract every timetable backend implements.
#[async_trait]
pub trait TransitPlugin: Send + Sync + Debug {
    /// Fetches results for the session's query, replacing the plan.
    async fn fetch_first_results(&self, session: &mut PluginSession<'_>);

    /// Fetches later results (earlier ones for arrive-by queries) and
    /// appends them to the plan.
    async fn fetch_more_results(&self, session: &mut PluginSession<'_>);

    /// Aborts the request in flight, if any. The aborted fetch publishes
    /// nothing.
    fn cancel_current_request(&self);
}

/// Builds a plugin from validated parameters.
pub type PluginConstructor =
    Arc<dyn Fn(&PluginParams) -> Result<Arc<dyn TransitPlugin>, PluginError> + Send + Sync>;

/// Allow-list of plugin identifiers and their constructors.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    constructors: BTreeMap<String, PluginConstructor>,
}

impl Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of bundled plugins.
    pub fn builtin() -> Self {
        Self::new()
            .with(OPEN_TRIP_PLANNER, |params| {
                Ok(Arc::new(OpenTripPlanner::from_params(params)?) as Arc<dyn TransitPlugin>)
            })
            .with(MOTIS, |params| {
                Ok(Arc::new(Motis::from_params(params)?) as Arc<dyn TransitPlugin>)
            })
    }

    /// Registers `constructor` under `id`, replacing any previous entry.
    pub fn with<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&PluginParams) -> Result<Arc<dyn TransitPlugin>, PluginError> + Send + Sync + 'static,
    {
        self.constructors.insert(id.into(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Creates a plugin instance.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownPlugin`] for an unregistered
    /// identifier, or whatever the constructor rejects.
    pub fn instantiate(
        &self,
        id: &str,
        params: &PluginParams,
    ) -> Result<Arc<dyn TransitPlugin>, PluginError> {
        let constructor = self
            .constructors
            .get(id)
            .ok_or_else(|| PluginError::UnknownPlugin(id.to_string()))?;
        constructor(params)
    }
}
