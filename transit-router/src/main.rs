use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_router::geocode::{
    CacheConfig, CachedCountryResolver, NominatimConfig, NominatimCountryResolver,
};
use transit_router::plugins::{PluginParams, PluginRegistry};
use transit_router::provider::load_providers;
use transit_router::router::{RouterConfig, RouterServices};
use transit_router::walking::{GraphHopperClient, GraphHopperConfig};
use transit_router::web::{AppState, create_router};

const DEFAULT_PROVIDERS_FILE: &str = "providers.json";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Provider descriptors
    let providers_file = env("TRANSIT_PROVIDERS").unwrap_or_else(|| DEFAULT_PROVIDERS_FILE.into());
    let providers = load_providers(&providers_file).expect("Failed to load provider descriptors");
    info!(file = %providers_file, count = providers.len(), "loaded providers");

    let registry = PluginRegistry::builtin();
    for provider in &providers {
        if !registry.contains(&provider.plugin) {
            warn!(provider = %provider.name, plugin = %provider.plugin, "unknown plugin");
        }
    }

    // Walking routes
    let mut graphhopper_config = GraphHopperConfig::default();
    if let Some(url) = env("GRAPHHOPPER_URL") {
        graphhopper_config = graphhopper_config.with_base_url(url);
    }
    match env("GRAPHHOPPER_KEY") {
        Some(key) => graphhopper_config = graphhopper_config.with_api_key(key),
        None => warn!("GRAPHHOPPER_KEY not set, walking routes may fail"),
    }
    let language = env("TRANSIT_LANGUAGE").unwrap_or_else(|| "en".into());
    graphhopper_config = graphhopper_config.with_locale(&language);
    let graphhopper =
        GraphHopperClient::new(graphhopper_config).expect("Failed to create GraphHopper client");

    // Country lookup
    let mut nominatim_config = NominatimConfig::default();
    if let Some(url) = env("NOMINATIM_URL") {
        nominatim_config = nominatim_config.with_base_url(url);
    }
    let nominatim =
        NominatimCountryResolver::new(nominatim_config).expect("Failed to create Nominatim client");
    let resolver = CachedCountryResolver::new(nominatim, &CacheConfig::default());

    // Session configuration
    let mut config = RouterConfig::default().with_language(language);
    if let Some(name) = env("TRANSIT_DEFAULT_PROVIDER") {
        config = config.with_default_provider(name);
    }
    if let Some(plugin) = env("TRANSIT_PLUGIN") {
        let params = match env("TRANSIT_PLUGIN_PARAMS") {
            Some(json) => {
                let value: serde_json::Value =
                    serde_json::from_str(&json).expect("TRANSIT_PLUGIN_PARAMS is not JSON");
                PluginParams::from_json(&value).expect("Invalid TRANSIT_PLUGIN_PARAMS")
            }
            None => PluginParams::new(),
        };
        info!(%plugin, "using plugin for every query");
        config = config.with_override_plugin(plugin, params);
    }

    let services = RouterServices {
        providers: providers.into(),
        registry: Arc::new(registry),
        resolver: Arc::new(resolver),
        routing: Arc::new(graphhopper),
        config,
    };

    let app = create_router(AppState::new(services));

    let addr: SocketAddr = env("BIND_ADDR")
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
        .parse()
        .expect("Invalid BIND_ADDR");
    info!(%addr, "transit router listening");
    info!("  GET  /health        - Health check");
    info!("  POST /plan          - Plan a trip");
    info!("  POST /plan/more     - Fetch more results");
    info!("  POST /plan/cancel   - Cancel the request in flight");
    info!("  POST /plan/restart  - Start a new session");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}
