//! The HTTP surface, served on an ephemeral port.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use serde_json::{Value, json};
use transit_router::domain::{BoundingBox, Itinerary, Leg};
use transit_router::geocode::StaticCountryResolver;
use transit_router::plugins::{PluginRegistry, PluginSession, TransitPlugin};
use transit_router::provider::{Area, ProviderDescriptor};
use transit_router::router::{RouterConfig, RouterServices};
use transit_router::web::{AppState, create_router};

/// Answers every first search with one ride and never has more.
#[derive(Debug)]
struct OneRide;

#[async_trait]
impl TransitPlugin for OneRide {
    async fn fetch_first_results(&self, session: &mut PluginSession<'_>) {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let departure = tz.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let arrival = tz.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let origin = session.query.origin();
        let destination = session.query.destination();
        let leg = Leg::transit(
            "43",
            &origin.name,
            origin.coordinate,
            &destination.name,
            destination.coordinate,
            departure,
            arrival,
        );
        let itinerary = Itinerary::new(vec![leg], departure, arrival).unwrap();
        session.publish(Ok(vec![itinerary]), false);
    }

    async fn fetch_more_results(&self, session: &mut PluginSession<'_>) {
        session.publish(Ok(Vec::new()), true);
    }

    fn cancel_current_request(&self) {}
}

async fn serve() -> String {
    let providers = vec![
        ProviderDescriptor::new("Sweden", "OneRide")
            .with_priority(1)
            .with_attribution("Trafiklab")
            .with_area(Area::countries(&["SE"])),
    ];
    let registry = PluginRegistry::new().with("OneRide", |_| {
        Ok(Arc::new(OneRide) as Arc<dyn TransitPlugin>)
    });
    let resolver = StaticCountryResolver::new()
        .with_region(BoundingBox::new(55.0, 10.0, 69.0, 24.0), "SE");

    let services = RouterServices {
        providers: providers.into(),
        registry: Arc::new(registry),
        resolver: Arc::new(resolver),
        routing: Arc::new(common::NoRoutes),
        config: RouterConfig::default(),
    };
    let app = create_router(AppState::new(services));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn plan_request(lat: f64, lon: f64) -> Value {
    json!({
        "origin": { "name": "Home", "lat": lat, "lon": lon },
        "destination": { "name": "Office", "lat": lat + 0.1, "lon": lon },
        "date": "2024-03-15",
        "time": "08:55"
    })
}

async fn post(client: &reqwest::Client, url: String, body: Option<Value>) -> (u16, Value) {
    let request = client.post(url);
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };
    let response = request.send().await.unwrap();
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_check() {
    let base = serve().await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn plan_then_more_results() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let (status, body) = post(&client, format!("{base}/plan"), Some(plan_request(59.33, 18.06))).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "Sweden");
    assert_eq!(body["attribution"], "Trafiklab");
    let itineraries = body["itineraries"].as_array().unwrap();
    assert_eq!(itineraries.len(), 1);
    assert_eq!(itineraries[0]["departure"], "2024-03-15T09:00:00+01:00");
    assert_eq!(itineraries[0]["legs"][0]["route"], "43");
    assert_eq!(itineraries[0]["legs"][0]["mode"], "transit");

    let (status, body) = post(&client, format!("{base}/plan/more"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "no_more_results");
    assert_eq!(body["itineraries"].as_array().unwrap().len(), 1);

    let (status, body) = post(&client, format!("{base}/plan/cancel"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["cancelled"], true);
}

#[tokio::test]
async fn restart_clears_the_session() {
    let base = serve().await;
    let client = reqwest::Client::new();

    post(&client, format!("{base}/plan"), Some(plan_request(59.33, 18.06))).await;
    let (status, _) = post(&client, format!("{base}/plan/restart"), None).await;
    assert_eq!(status, 204);

    let (status, body) = post(&client, format!("{base}/plan/more"), None).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "no previous provider to fetch more results from");
}

#[tokio::test]
async fn uncovered_query_reports_no_provider() {
    let base = serve().await;
    let client = reqwest::Client::new();

    // Berlin
    let (status, body) = post(&client, format!("{base}/plan"), Some(plan_request(52.52, 13.40))).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "no_provider");
    assert!(body["itineraries"].as_array().unwrap().is_empty());
    assert_eq!(body["provider"], Value::Null);
}

#[tokio::test]
async fn more_results_need_a_search() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let (status, _) = post(&client, format!("{base}/plan/more"), None).await;
    assert_eq!(status, 409);

    let (status, body) = post(&client, format!("{base}/plan/cancel"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["cancelled"], false);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/plan"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut request = plan_request(59.33, 18.06);
    request["time"] = json!("25:00");
    let (status, body) = post(&client, format!("{base}/plan"), Some(request)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid time: 25:00");

    let mut request = plan_request(59.33, 18.06);
    request["modes"] = json!(["hovercraft"]);
    let (status, body) = post(&client, format!("{base}/plan"), Some(request)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "unknown mode: hovercraft");
}
