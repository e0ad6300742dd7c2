// HTTP API tests against an in-memory engine

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::{FaultyStore, StaticProfileProvider};
use date_service::core::{IdentityProvider, SwipeEngine, SwipeStore};
use date_service::routes::{self, AppState};
use date_service::services::{InMemorySwipeStore, JwtIdentityProvider, TokenClaims, TracingActivityLog};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;

const SECRET: &str = "api-test-secret";

fn bearer(user_id: u64) -> (header::HeaderName, String) {
    let claims = TokenClaims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        username: None,
        is_premium: false,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn app_state(candidates: Vec<u64>) -> AppState {
    app_state_with_store(Arc::new(InMemorySwipeStore::new()), candidates)
}

fn app_state_with_store(store: Arc<dyn SwipeStore>, candidates: Vec<u64>) -> AppState {
    let engine = SwipeEngine::new(
        store,
        Arc::new(StaticProfileProvider::new(candidates)),
        Arc::new(TracingActivityLog),
    );
    let identity: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::new(SECRET));
    AppState {
        engine,
        identity,
        request_timeout: Some(std::time::Duration::from_secs(5)),
    }
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(routes::configure_app),
        )
        .await
    };
}

fn swipe_request(swiper: u64, swiped: u64, action: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/swipes")
        .insert_header(bearer(swiper))
        .set_json(json!({
            "swiperUserId": swiper,
            "swipedProfileUserId": swiped,
            "action": action,
        }))
}

#[actix_web::test]
async fn test_health_needs_no_token() {
    let app = test_app!(app_state(vec![]));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_health_reports_degraded_store() {
    let store = Arc::new(FaultyStore::new());
    store.fail_health.store(true, Ordering::SeqCst);
    let app = test_app!(app_state_with_store(store, vec![]));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
}

#[actix_web::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = test_app!(app_state(vec![]));

    let req = test::TestRequest::get().uri("/api/v1/matches?userId=1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/matches?userId=1")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthenticated");
}

#[actix_web::test]
async fn test_record_swipe_and_match() {
    let app = test_app!(app_state(vec![]));

    let resp = test::call_service(&app, swipe_request(1, 2, "like").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "Successfully like profile with user id 2");
    assert_eq!(body["swipe"]["swiperUserId"], 1);
    assert_eq!(body["swipe"]["swipedProfileUserId"], 2);
    assert_eq!(body["swipe"]["action"], "like");
    assert!(body.get("match").is_none());

    let resp = test::call_service(&app, swipe_request(2, 1, "like").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["match"]["userOneId"], 1);
    assert_eq!(body["match"]["userTwoId"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/matches?userId=1")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_swipe_errors_map_to_status_codes() {
    let app = test_app!(app_state(vec![]));

    let resp = test::call_service(&app, swipe_request(1, 2, "maybe").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_argument");
    assert!(body["message"].as_str().unwrap().contains("action"));

    let resp = test::call_service(&app, swipe_request(3, 3, "like").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, swipe_request(1, 2, "pass").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, swipe_request(1, 2, "pass").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "already_exists");
}

#[actix_web::test]
async fn test_rate_limit_returns_too_many_requests() {
    let app = test_app!(app_state(vec![]));

    for target in 100..110 {
        let resp = test::call_service(&app, swipe_request(7, target, "pass").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = test::call_service(&app, swipe_request(7, 200, "pass").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "resource_exhausted");
}

#[actix_web::test]
async fn test_malformed_and_missing_input_is_bad_request() {
    let app = test_app!(app_state(vec![]));

    let req = test::TestRequest::post()
        .uri("/api/v1/swipes")
        .insert_header(bearer(1))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/swipes")
        .insert_header(bearer(1))
        .set_json(json!({ "swipedProfileUserId": 2, "action": "like" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("swiper_user_id"));

    let req = test::TestRequest::get()
        .uri("/api/v1/suggestions?limit=5")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_suggestions_skip_swiped_profiles() {
    let app = test_app!(app_state((10..18).collect()));

    for target in [10, 12, 14] {
        let resp = test::call_service(&app, swipe_request(9, target, "pass").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/suggestions?userId=9&limit=5")
        .insert_header(bearer(9))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<u64> = body["profiles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["userId"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![11, 13, 15, 16, 17]);
}

#[actix_web::test]
async fn test_history_pages() {
    let app = test_app!(app_state(vec![]));

    for target in [5, 6, 7] {
        test::call_service(&app, swipe_request(4, target, "like").to_request()).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/swipes/history?userId=4&limit=2&offset=1")
        .insert_header(bearer(4))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let targets: Vec<u64> = body["swipes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["swipedProfileUserId"].as_u64().unwrap())
        .collect();
    assert_eq!(targets, vec![6, 7]);
}

#[actix_web::test]
async fn test_reconcile_reports_nothing_when_consistent() {
    let app = test_app!(app_state(vec![]));

    test::call_service(&app, swipe_request(1, 2, "like").to_request()).await;
    test::call_service(&app, swipe_request(2, 1, "like").to_request()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/reconcile")
        .insert_header(bearer(1))
        .set_json(json!({ "userId": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["created"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_ids_beyond_storage_range_are_bad_request() {
    let app = test_app!(app_state(vec![]));

    let req = test::TestRequest::post()
        .uri("/api/v1/swipes")
        .insert_header(bearer(1))
        .set_json(json!({
            "swiperUserId": 18446744073709551615u64,
            "swipedProfileUserId": 2,
            "action": "like",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_argument");
    assert!(body["message"].as_str().unwrap().contains("swiper_user_id"));

    let req = test::TestRequest::get()
        .uri("/api/v1/swipes/history?userId=9223372036854775808")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_swipe_for_another_user_is_still_recorded() {
    let app = test_app!(app_state(vec![]));

    let req = test::TestRequest::post()
        .uri("/api/v1/swipes")
        .insert_header(bearer(3))
        .set_json(json!({
            "swiperUserId": 1,
            "swipedProfileUserId": 2,
            "action": "pass",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["swipe"]["swiperUserId"], 1);
}
