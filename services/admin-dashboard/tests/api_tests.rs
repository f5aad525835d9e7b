//! HTTP-level tests against a mocked backend

use actix_web::{cookie::Cookie, http::StatusCode, test, web, App};
use admin_dashboard::{
    auth::SESSION_VALUE,
    config::Config,
    handlers,
    middleware::{LoginRateLimiter, SessionGate},
    state::AppState,
};
use httpmock::prelude::*;
use serde_json::{json, Value};

const COOKIE: &str = "tp_admin_auth";

fn config(backend: &MockServer, password: Option<&str>) -> Config {
    let mut config = Config::default();
    config.backend.base_url = backend.base_url();
    config.auth.admin_password = password.map(str::to_string);
    config
}

fn session() -> Cookie<'static> {
    Cookie::new(COOKIE, SESSION_VALUE)
}

macro_rules! app {
    ($config:expr) => {{
        let config: Config = $config;
        let limiter = LoginRateLimiter::new(config.auth.login_attempts_per_minute);
        let state = web::Data::new(AppState::new(config).unwrap());
        test::init_service(
            App::new()
                .app_data(state)
                .wrap(SessionGate::new(COOKIE))
                .wrap(limiter)
                .configure(handlers::configure_routes),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_requests_without_session_redirect_to_login() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get().uri("/api/leads").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get("location").unwrap(), "/login");
}

#[actix_web::test]
async fn test_login_page_is_public() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_login_sets_session_cookie() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::post()
        .uri("/api/auth")
        .set_json(json!({"password": "hunter2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == COOKIE)
        .expect("session cookie");
    assert_eq!(cookie.value(), SESSION_VALUE);
    assert_eq!(cookie.http_only(), Some(true));
}

#[actix_web::test]
async fn test_wrong_password_is_unauthorized() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::post()
        .uri("/api/auth")
        .set_json(json!({"password": "letmein"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid password");
}

#[actix_web::test]
async fn test_login_without_configured_password_fails() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, None));

    let req = test::TestRequest::post()
        .uri("/api/auth")
        .set_json(json!({"password": "anything"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ADMIN_PASSWORD not configured");
}

#[actix_web::test]
async fn test_login_attempts_are_throttled() {
    let backend = MockServer::start_async().await;
    let mut config = config(&backend, Some("hunter2"));
    config.auth.login_attempts_per_minute = 2;
    let app = app!(config);

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/api/auth")
            .set_json(json!({"password": "wrong"}))
            .to_request();
        let status = match test::try_call_service(&app, req).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        statuses.push(status);
    }

    assert_eq!(statuses[0], StatusCode::UNAUTHORIZED);
    assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn test_throttled_peer_does_not_lock_out_others() {
    let backend = MockServer::start_async().await;
    let mut config = config(&backend, Some("hunter2"));
    config.auth.login_attempts_per_minute = 1;
    let app = app!(config);

    let attempt = |peer: &str, password: &str| {
        test::TestRequest::post()
            .uri("/api/auth")
            .peer_addr(peer.parse().unwrap())
            .set_json(json!({ "password": password }))
            .to_request()
    };

    let first = test::try_call_service(&app, attempt("198.51.100.9:4000", "junk")).await;
    assert_eq!(first.unwrap().status(), StatusCode::UNAUTHORIZED);
    let second = test::try_call_service(&app, attempt("198.51.100.9:4000", "junk")).await;
    assert_eq!(
        second.err().map(|e| e.as_response_error().status_code()),
        Some(StatusCode::TOO_MANY_REQUESTS)
    );

    let admin = test::try_call_service(&app, attempt("192.0.2.20:5000", "hunter2")).await;
    assert_eq!(admin.unwrap().status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_fraud_report_filters_whitelisted_ips() {
    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(GET).path("/fraud/summary");
            then.status(200).json_body(json!({
                "success": true,
                "stats": {"total_leads": "40", "rejected_leads": "13"},
                "ipClusters": [
                    {"ip_address": "73.138.132.140", "lead_count": "9", "unique_emails": "1"},
                    {"ip_address": "203.0.113.7", "lead_count": "4", "unique_emails": "3"}
                ],
                "rapidSubmissions": null
            }));
        })
        .await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get()
        .uri("/api/fraud?preset=7d")
        .cookie(session())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["whitelist_applied"], true);
    assert_eq!(report["range_label"], "Last 7 days");
    assert_eq!(report["ip_clusters"]["count"], 1);
    assert_eq!(report["ip_clusters"]["rows"][0]["ip_address"], "203.0.113.7");
    assert_eq!(report["headline"]["rejection_rate"], "32.5");
}

#[actix_web::test]
async fn test_fraud_backend_failure_is_bad_gateway() {
    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(GET).path("/fraud/summary");
            then.status(200)
                .json_body(json!({"success": false, "error": "query timeout"}));
        })
        .await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get()
        .uri("/api/fraud")
        .cookie(session())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "query timeout");
}

#[actix_web::test]
async fn test_export_streams_csv_attachment() {
    let backend = MockServer::start_async().await;
    let leads = backend
        .mock_async(|when, then| {
            when.method(GET).path("/leads").query_param("limit", "500");
            then.status(200).json_body(json!({
                "leads": [{
                    "id": 7,
                    "first_name": "Ana",
                    "last_name": "O\"Neil",
                    "email": "ana@example.com",
                    "loan_amount": "300.00",
                    "status": "sold",
                    "created_at": "2024-03-15T10:00:00.000Z"
                }],
                "pagination": {"page": 1, "totalPages": 1, "totalCount": 1}
            }));
        })
        .await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get()
        .uri("/api/leads/export?status=sold")
        .cookie(session())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/csv; charset=utf-8"
    );
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"leads-"));

    let body = test::read_body(resp).await;
    let csv = std::str::from_utf8(&body).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("\"ID\",\"Created At\""));
    assert!(lines.next().unwrap().contains("\"O\"\"Neil\""));
    leads.assert_async().await;
}

#[actix_web::test]
async fn test_unknown_status_filter_rejected() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get()
        .uri("/api/leads?status=teleported")
        .cookie(session())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_invalid_lender_never_reaches_backend() {
    let backend = MockServer::start_async().await;
    let create = backend
        .mock_async(|when, then| {
            when.method(POST).path("/lenders");
            then.status(201).json_body(json!({"id": 1}));
        })
        .await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::post()
        .uri("/api/lenders")
        .cookie(session())
        .set_json(json!({"name": "", "api_endpoint": "https://lender.example"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["type"], "validation_error");
    create.assert_hits_async(0).await;
}

#[actix_web::test]
async fn test_lenders_listing_masks_keys() {
    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(GET).path("/lenders");
            then.status(200).json_body(json!({
                "lenders": [{"id": "3", "name": "Moneyman", "api_key": "abcdef123456"}]
            }));
        })
        .await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get()
        .uri("/api/lenders")
        .cookie(session())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["lenders"][0]["name"], "Moneyman");
    assert_eq!(body["lenders"][0]["maskedApiKey"], "••••••••3456");
}

#[actix_web::test]
async fn test_whitelist_add_and_remove() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::post()
        .uri("/api/fraud/whitelist")
        .cookie(session())
        .set_json(json!({"ip": " 10.0.0.1 "}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["added"], true);
    assert_eq!(body["ips"].as_array().unwrap().len(), 3);

    let req = test::TestRequest::delete()
        .uri("/api/fraud/whitelist/10.0.0.1")
        .cookie(session())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["removed"], true);
    assert_eq!(body["ips"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::put()
        .uri("/api/fraud/whitelist/enabled")
        .cookie(session())
        .set_json(json!({"enabled": false}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["enabled"], false);
}

#[actix_web::test]
async fn test_date_range_resolves_custom_pick() {
    let backend = MockServer::start_async().await;
    let app = app!(config(&backend, Some("hunter2")));

    let req = test::TestRequest::get()
        .uri("/api/date-range?from=2024-03-15&to=2024-03-08")
        .cookie(session())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["range"]["from"], "2024-03-08");
    assert_eq!(body["range"]["to"], "2024-03-16");
    assert_eq!(body["range"]["label"], "Mar 8 – Mar 15, 2024");
    assert!(body["query"].as_str().unwrap().starts_with("from="));
}

#[actix_web::test]
async fn test_health_reports_unreachable_backend() {
    let backend = MockServer::start_async().await;
    let mut config = config(&backend, Some("hunter2"));
    config.backend.base_url = "http://127.0.0.1:1".to_string();
    let app = app!(config);

    let req = test::TestRequest::get()
        .uri("/health")
        .cookie(session())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "unreachable");
}
