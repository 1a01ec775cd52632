//! A router session served by the OpenTripPlanner plugin against a
//! timetable-only router, with descriptors loaded from a file and walking
//! routed by GraphHopper.

mod common;

use std::io::Write;
use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};
use serde_json::json;
use transit_router::domain::{BoundingBox, Coordinate, Place, PlanSignal, Query};
use transit_router::geocode::StaticCountryResolver;
use transit_router::plugins::PluginRegistry;
use transit_router::provider::load_providers;
use transit_router::router::{Router, RouterConfig, RouterServices};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NINE_O_FIVE: i64 = 1_710_489_900_000;
const NINE_TWENTY_FIVE: i64 = 1_710_491_100_000;

/// One bus ride between two stops roughly 220 m from either end of the
/// query, the way a timetable-only deployment answers.
fn plan_body() -> serde_json::Value {
    json!({
        "plan": {
            "itineraries": [{
                "startTime": NINE_O_FIVE,
                "endTime": NINE_TWENTY_FIVE,
                "transfers": 0,
                "legs": [{
                    "startTime": NINE_O_FIVE,
                    "endTime": NINE_TWENTY_FIVE,
                    "transitLeg": true,
                    "mode": "BUS",
                    "route": "T14",
                    "routeType": 3,
                    "routeColor": "0089ca",
                    "agencyName": "SL",
                    "agencyTimeZoneOffset": 3_600_000,
                    "headsign": "Danderyd",
                    "distance": 7338.9,
                    "duration": 1200.0,
                    "from": { "name": "Odenplan", "lat": 59.332, "lon": 18.06, "departure": NINE_O_FIVE },
                    "to": { "name": "Danderyd", "lat": 59.398, "lon": 18.06, "arrival": NINE_TWENTY_FIVE },
                    "intermediateStops": [
                        { "name": "Roslagstull", "lat": 59.35, "lon": 18.06,
                          "arrival": 1_710_490_200_000i64, "departure": 1_710_490_260_000i64 }
                    ]
                }]
            }]
        }
    })
}

/// The stops of the bus ride, one near each end of the query.
async fn mount_stops(otp: &MockServer) {
    for (lat, stop) in [
        ("59.33", json!({ "id": "SL:9117", "name": "Odenplan", "lat": 59.332, "lon": 18.06, "dist": 222.4 })),
        ("59.4", json!({ "id": "SL:9191", "name": "Danderyd", "lat": 59.398, "lon": 18.06, "dist": 222.4 })),
    ] {
        Mock::given(method("GET"))
            .and(path("/otp/routers/sthlm/index/stops"))
            .and(query_param("lat", lat))
            .and(query_param("radius", "2000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([stop])))
            .mount(otp)
            .await;
    }
}

fn providers_file(otp: &MockServer) -> tempfile::NamedTempFile {
    let providers = json!([
        {
            "provider": {
                "name": "Finland",
                "priority": 1,
                "plugin": "OpenTripPlanner",
                "params": { "baseUrl": "http://127.0.0.1:9/otp" },
                "areas": [{ "countries": ["FI"] }]
            }
        },
        {
            "provider": {
                "name": "Stockholm",
                "priority": 10,
                "plugin": "OpenTripPlanner",
                "params": {
                    "baseUrl": format!("{}/otp", otp.uri()),
                    "router": "sthlm",
                    "onlyTransitData": true
                },
                "attribution": "Trafiklab",
                "attributionUrl": "https://www.trafiklab.se",
                "areas": [{ "bbox": [59.0, 17.5, 60.0, 19.0] }]
            }
        }
    ]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(providers.to_string().as_bytes()).unwrap();
    file
}

async fn router(otp: &MockServer, graphhopper: &MockServer) -> Router {
    let file = providers_file(otp);
    let providers = load_providers(file.path()).unwrap();
    let resolver = StaticCountryResolver::new()
        .with_region(BoundingBox::new(55.0, 10.0, 69.0, 24.0), "SE");

    let services = RouterServices {
        providers: providers.into(),
        registry: Arc::new(PluginRegistry::builtin()),
        resolver: Arc::new(resolver),
        routing: common::graphhopper(graphhopper),
        config: RouterConfig::default(),
    };
    let query = Query::new(
        Place::new("Home", Coordinate::new(59.33, 18.06)),
        Place::new("Office", Coordinate::new(59.40, 18.06)),
    );
    Router::new(services, query)
}

#[tokio::test]
async fn recalculates_transit_only_results() {
    let otp = MockServer::start().await;
    let graphhopper = MockServer::start().await;
    mount_stops(&otp).await;
    common::mount_route(&graphhopper, 250.0, 200_000).await;

    Mock::given(method("GET"))
        .and(path("/otp/routers/sthlm/plan"))
        .and(query_param("fromPlace", "SL:9117"))
        .and(query_param("toPlace", "SL:9191"))
        .and(query_param("walkSpeed", "1.0"))
        .and(query_param("showIntermediateStops", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_body()))
        .expect(1)
        .mount(&otp)
        .await;

    let mut router = router(&otp, &graphhopper).await;
    router.fetch_first_results().await.unwrap();

    assert_eq!(router.current_provider(), Some("Stockholm"));
    let plan = router.plan();
    assert_eq!(plan.attribution.as_deref(), Some("Trafiklab"));
    assert_eq!(plan.attribution_url.as_deref(), Some("https://www.trafiklab.se"));
    assert_eq!(plan.outcome(), None);

    let itineraries = plan.itineraries();
    assert_eq!(itineraries.len(), 1);
    let legs = itineraries[0].legs();
    assert_eq!(legs.len(), 3);

    // stops were chosen by walking distance and the walks reused for the legs
    assert!(!legs[0].is_transit);
    assert_eq!(legs[0].from_name, "Home");
    assert_eq!(legs[0].to_name, "Odenplan");
    assert_eq!(legs[0].distance, 250.0);
    assert!(!legs[0].walking_instructions.is_empty());
    assert_eq!(legs[2].from_name, "Danderyd");
    assert_eq!(legs[2].to_name, "Office");

    let ride = &legs[1];
    assert!(ride.is_transit);
    assert_eq!(ride.route.as_deref(), Some("T14"));
    assert_eq!(ride.headsign.as_deref(), Some("Danderyd"));
    assert_eq!(ride.intermediate_stops.len(), 2);

    // the first walk ends two minutes before the bus leaves
    let tz = FixedOffset::east_opt(3600).unwrap();
    assert_eq!(
        itineraries[0].departure(),
        tz.with_ymd_and_hms(2024, 3, 15, 8, 59, 40).unwrap()
    );
    assert_eq!(
        itineraries[0].arrival(),
        tz.with_ymd_and_hms(2024, 3, 15, 9, 28, 20).unwrap()
    );

    assert_eq!(graphhopper.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn more_results_continue_after_last_departure() {
    let otp = MockServer::start().await;
    let graphhopper = MockServer::start().await;
    mount_stops(&otp).await;
    common::mount_route(&graphhopper, 250.0, 200_000).await;

    Mock::given(method("GET"))
        .and(path("/otp/routers/sthlm/plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_body()))
        .up_to_n_times(1)
        .mount(&otp)
        .await;
    Mock::given(method("GET"))
        .and(path("/otp/routers/sthlm/plan"))
        .and(query_param("time", "09:07"))
        .and(query_param("date", "2024-03-15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "id": 404, "msg": "PATH_NOT_FOUND", "noPath": true }
        })))
        .expect(1)
        .mount(&otp)
        .await;

    let mut router = router(&otp, &graphhopper).await;
    router.fetch_first_results().await.unwrap();
    router.fetch_more_results().await.unwrap();

    assert_eq!(router.plan().outcome(), Some(PlanSignal::NoMoreResults));
    assert_eq!(router.plan().itineraries().len(), 1);
    // the walks were cached for the session
    assert_eq!(graphhopper.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn backend_failure_signals_request_failed() {
    let otp = MockServer::start().await;
    let graphhopper = MockServer::start().await;
    mount_stops(&otp).await;

    Mock::given(method("GET"))
        .and(path("/otp/routers/sthlm/plan"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&otp)
        .await;

    let mut router = router(&otp, &graphhopper).await;
    router.fetch_first_results().await.unwrap();

    assert_eq!(router.plan().outcome(), Some(PlanSignal::RequestFailed));
    assert!(router.plan().itineraries().is_empty());
    assert_eq!(router.plan().attribution.as_deref(), Some("Trafiklab"));
}

#[tokio::test]
async fn unroutable_walks_fall_back_to_straight_lines() {
    let otp = MockServer::start().await;
    let graphhopper = MockServer::start().await;
    mount_stops(&otp).await;
    Mock::given(method("GET"))
        .and(path("/route"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "no route" })))
        .mount(&graphhopper)
        .await;
    Mock::given(method("GET"))
        .and(path("/otp/routers/sthlm/plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan_body()))
        .mount(&otp)
        .await;

    let mut router = router(&otp, &graphhopper).await;
    router.fetch_first_results().await.unwrap();

    let legs = router.plan().itineraries()[0].legs();
    assert_eq!(legs.len(), 3);
    assert!(legs[0].walking_instructions.is_empty());
    // one second per meter
    assert!((legs[0].distance - 222.39).abs() < 0.01);
    assert_eq!(legs[0].duration, legs[0].distance);
}
