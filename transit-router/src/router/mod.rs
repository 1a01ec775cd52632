//! Query session orchestration.
//!
//! A [`Router`] owns one query session: the current [`Query`], the shared
//! [`Plan`], the walking-route cache and the plugin instances created so
//! far. For each query it picks the best covering provider, instantiates
//! its plugin through the registry and drives it.

mod config;
mod error;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{Plan, PlanEvent, Query};
use crate::geocode::CountryResolver;
use crate::plugins::{PluginParams, PluginRegistry, PluginSession, TransitPlugin};
use crate::provider::{ProviderDescriptor, rank_providers};
use crate::walking::{RoutingBackend, WalkingRouteRefiner};

pub use config::{PluginOverride, RouterConfig};
pub use error::RouterError;

/// Long-lived collaborators shared by every session.
#[derive(Debug, Clone)]
pub struct RouterServices {
    pub providers: Arc<[ProviderDescriptor]>,
    pub registry: Arc<PluginRegistry>,
    pub resolver: Arc<dyn CountryResolver>,
    pub routing: Arc<dyn RoutingBackend>,
    pub config: RouterConfig,
}

/// Cancels the active plugin's request without access to the router.
///
/// The router keeps the handle pointed at whichever plugin it selected
/// last, so a clone taken before a fetch still reaches it.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    active: Arc<Mutex<Option<Arc<dyn TransitPlugin>>>>,
}

impl CancelHandle {
    /// Cancels the active plugin's request. Returns false if no plugin has
    /// been selected.
    pub fn cancel(&self) -> bool {
        let active = self.active.lock().clone();
        match active {
            Some(plugin) => {
                plugin.cancel_current_request();
                true
            }
            None => false,
        }
    }

    fn current(&self) -> Option<Arc<dyn TransitPlugin>> {
        self.active.lock().clone()
    }

    fn set(&self, plugin: Option<Arc<dyn TransitPlugin>>) {
        *self.active.lock() = plugin;
    }
}

/// One query session.
#[derive(Debug)]
pub struct Router {
    services: RouterServices,
    query: Query,
    plan: Plan,
    walking: WalkingRouteRefiner,
    /// Plugin instances by provider name
    instances: HashMap<String, Arc<dyn TransitPlugin>>,
    override_instance: Option<Arc<dyn TransitPlugin>>,
    active: CancelHandle,
    current_provider: Option<String>,
}

impl Router {
    pub fn new(services: RouterServices, query: Query) -> Self {
        let walking = WalkingRouteRefiner::new(
            Arc::clone(&services.routing),
            services.config.walking_cache.clone(),
        );
        Self {
            services,
            query,
            plan: Plan::new(),
            walking,
            instances: HashMap::new(),
            override_instance: None,
            active: CancelHandle::default(),
            current_provider: None,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Replaces the query. Caches and the current selection are kept.
    pub fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlanEvent> {
        self.plan.subscribe()
    }

    /// Name of the provider serving the current results, if any.
    pub fn current_provider(&self) -> Option<&str> {
        self.current_provider.as_deref()
    }

    pub fn walking(&self) -> &WalkingRouteRefiner {
        &self.walking
    }

    /// A handle for cancelling requests while the router is busy.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.active.clone()
    }

    /// Starts over: forgets cached walking routes and plugin instances and
    /// clears the plan.
    pub fn restart_session(&mut self) {
        self.cancel_current_request();
        self.walking.clear();
        self.instances.clear();
        self.override_instance = None;
        self.active.set(None);
        self.current_provider = None;
        self.plan.reset();
    }

    /// Picks the best provider covering both ends of the query and returns
    /// it with a ready plugin instance.
    ///
    /// Candidates are tried in rank order; one whose plugin cannot be
    /// instantiated is skipped. If none works the configured default
    /// provider is tried.
    pub async fn best_provider_for_query(
        &mut self,
    ) -> Option<(ProviderDescriptor, Arc<dyn TransitPlugin>)> {
        self.resolve_country_codes().await;
        let providers = Arc::clone(&self.services.providers);
        let candidates = rank_providers(&providers, self.query.origin(), self.query.destination());

        for candidate in candidates {
            if let Some(plugin) = self.instance_for(candidate.provider) {
                debug!(
                    provider = %candidate.provider.name,
                    priority = ?candidate.priority,
                    "selected provider"
                );
                return Some((candidate.provider.clone(), plugin));
            }
        }

        let fallback = self.services.config.default_provider.clone()?;
        let Some(descriptor) = providers.iter().find(|p| p.name == fallback) else {
            warn!(provider = %fallback, "default provider is not configured");
            return None;
        };
        let plugin = self.instance_for(descriptor)?;
        debug!(provider = %descriptor.name, "falling back to default provider");
        Some((descriptor.clone(), plugin))
    }

    /// Runs a fresh search for the query and publishes into the plan.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NoProviderAvailable`] after resetting the plan
    /// and signalling `NoProvider` if no plugin could be obtained.
    pub async fn fetch_first_results(&mut self) -> Result<(), RouterError> {
        let selected = if self.services.config.override_plugin.is_some() {
            self.override_plugin().map(|plugin| (None, plugin))
        } else {
            self.best_provider_for_query()
                .await
                .map(|(descriptor, plugin)| (Some(descriptor), plugin))
        };

        let Some((descriptor, plugin)) = selected else {
            warn!(
                origin = %self.query.origin().coordinate,
                destination = %self.query.destination().coordinate,
                "no provider available"
            );
            self.active.set(None);
            self.current_provider = None;
            self.plan.reset();
            self.plan.no_provider();
            return Err(RouterError::NoProviderAvailable);
        };

        let language = &self.services.config.language;
        self.plan.attribution = descriptor
            .as_ref()
            .and_then(|d| d.attribution_for(language))
            .map(str::to_string);
        self.plan.attribution_url = descriptor.as_ref().and_then(|d| d.attribution_url.clone());
        self.current_provider = descriptor.map(|d| d.name);
        self.active.set(Some(Arc::clone(&plugin)));

        info!(provider = ?self.current_provider, "fetching results");
        let mut session = PluginSession {
            query: &self.query,
            plan: &mut self.plan,
            walking: &mut self.walking,
        };
        plugin.fetch_first_results(&mut session).await;
        Ok(())
    }

    /// Asks the selected plugin for results beyond the current ones.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NoPreviousProvider`] if no search ran before.
    pub async fn fetch_more_results(&mut self) -> Result<(), RouterError> {
        let plugin = self
            .active
            .current()
            .ok_or(RouterError::NoPreviousProvider)?;

        info!(provider = ?self.current_provider, "fetching more results");
        let mut session = PluginSession {
            query: &self.query,
            plan: &mut self.plan,
            walking: &mut self.walking,
        };
        plugin.fetch_more_results(&mut session).await;
        Ok(())
    }

    /// Cancels the active plugin's request, if any.
    pub fn cancel_current_request(&self) {
        self.active.cancel();
    }

    /// Fills in missing country codes of the query's endpoints.
    async fn resolve_country_codes(&mut self) {
        let resolver = Arc::clone(&self.services.resolver);
        let last = self.query.places().len() - 1;

        for index in [0, last] {
            let place = &mut self.query.places_mut()[index];
            if place.country_code.is_some() {
                continue;
            }
            match resolver.resolve_country_code(&place.coordinate).await {
                Ok(Some(code)) => place.country_code = Some(code.to_ascii_uppercase()),
                Ok(None) => debug!(place = %place.name, "no country for place"),
                Err(e) => warn!(place = %place.name, error = %e, "country lookup failed"),
            }
        }
    }

    fn instance_for(&mut self, descriptor: &ProviderDescriptor) -> Option<Arc<dyn TransitPlugin>> {
        if let Some(plugin) = self.instances.get(&descriptor.name) {
            return Some(Arc::clone(plugin));
        }

        let params = match &descriptor.params {
            Some(params) => PluginParams::from_json(params),
            None => Ok(PluginParams::new()),
        };
        let created = params
            .and_then(|params| self.services.registry.instantiate(&descriptor.plugin, &params));

        match created {
            Ok(plugin) => {
                self.instances
                    .insert(descriptor.name.clone(), Arc::clone(&plugin));
                Some(plugin)
            }
            Err(e) => {
                warn!(
                    provider = %descriptor.name,
                    plugin = %descriptor.plugin,
                    error = %e,
                    "skipping provider"
                );
                None
            }
        }
    }

    fn override_plugin(&mut self) -> Option<Arc<dyn TransitPlugin>> {
        if let Some(plugin) = &self.override_instance {
            return Some(Arc::clone(plugin));
        }
        let over = self.services.config.override_plugin.as_ref()?;
        match self.services.registry.instantiate(&over.plugin, &over.params) {
            Ok(plugin) => {
                self.override_instance = Some(Arc::clone(&plugin));
                Some(plugin)
            }
            Err(e) => {
                warn!(plugin = %over.plugin, error = %e, "override plugin unusable");
                None
            }
        }
    }
}
