//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use transit_router::domain::Coordinate;
use transit_router::walking::{
    GraphHopperClient, GraphHopperConfig, Route, RoutingBackend, RoutingError, TravelMode,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A GraphHopper route response with a three-point path and two
/// instructions.
pub fn route_body(distance: f64, time_ms: u64) -> Value {
    json!({
        "paths": [{
            "distance": distance,
            "time": time_ms,
            "points": "_p~iF~ps|U_ulLnnqC_mqNvxq`@",
            "instructions": [
                { "distance": distance, "sign": 0, "interval": [0, 2], "text": "Continue", "time": time_ms },
                { "distance": 0.0, "sign": 4, "interval": [2, 2], "text": "Arrive", "time": 0 }
            ]
        }]
    })
}

/// Serves the same route for every `/route` request.
pub async fn mount_route(server: &MockServer, distance: f64, time_ms: u64) {
    Mock::given(method("GET"))
        .and(path("/route"))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_body(distance, time_ms)))
        .mount(server)
        .await;
}

pub fn graphhopper(server: &MockServer) -> Arc<dyn RoutingBackend> {
    let config = GraphHopperConfig::default().with_base_url(server.uri());
    Arc::new(GraphHopperClient::new(config).unwrap())
}

/// Routing backend that never finds a route.
#[derive(Debug)]
pub struct NoRoutes;

#[async_trait]
impl RoutingBackend for NoRoutes {
    async fn fetch_route(
        &self,
        _points: &[Coordinate],
        _mode: TravelMode,
    ) -> Result<Route, RoutingError> {
        Err(RoutingError::NoPath)
    }
}
