//! End-to-end lifecycle scenarios over the REST surface, backed by the
//! in-memory adapters.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web::Data};
use serde_json::{Value, json};

use leavedesk::config::Config;
use leavedesk::identity::{EMPLOYEE_ID_HEADER, ROLE_HEADER};
use leavedesk::lifecycle::AppState;
use leavedesk::model::leave::{LeaveDays, LeaveType};
use leavedesk::routes;
use leavedesk::store::{BalanceLedger, MemoryLedger, MemoryRequestStore};

const EMPLOYEE: u64 = 1000;
const OTHER_EMPLOYEE: u64 = 1001;
const HR: u64 = 2000;
const BOSS: u64 = 3000;

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        server_addr: String::new(),
        rate_api_per_min: 6000,
        rate_admin_per_min: 6000,
        api_prefix: "/api/v1".to_string(),
    }
}

async fn seeded_state() -> AppState {
    let ledger = Arc::new(MemoryLedger::new());
    for employee in [EMPLOYEE, OTHER_EMPLOYEE] {
        ledger
            .provision(employee, LeaveType::Annual, LeaveDays::from_whole_days(10))
            .await
            .unwrap();
        ledger
            .provision(employee, LeaveType::Sick, LeaveDays::from_whole_days(5))
            .await
            .unwrap();
    }
    AppState::new(ledger, Arc::new(MemoryRequestStore::new()))
}

/// Builds the same app `main` wires up, minus the database.
macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($state))
                .configure(|cfg| routes::configure(cfg, test_config())),
        )
        .await
    };
}

/// A request carrying the trusted identity headers.
macro_rules! identified {
    ($builder:expr, $employee_id:expr, $role:expr) => {
        $builder
            .insert_header((EMPLOYEE_ID_HEADER, $employee_id.to_string()))
            .insert_header((ROLE_HEADER, $role))
            .peer_addr("127.0.0.1:9999".parse().unwrap())
    };
}

macro_rules! submit {
    ($app:expr, $employee_id:expr, $body:expr) => {{
        let req = identified!(
            test::TestRequest::post().uri("/api/v1/leave"),
            $employee_id,
            "employee"
        )
        .set_json($body)
        .to_request();
        test::call_service(&$app, req).await
    }};
}

macro_rules! decide {
    ($app:expr, $leave_id:expr, $verb:expr, $decider:expr, $role:expr) => {{
        let req = identified!(
            test::TestRequest::put().uri(&format!("/api/v1/leave/{}/{}", $leave_id, $verb)),
            $decider,
            $role
        )
        .to_request();
        test::call_service(&$app, req).await
    }};
}

macro_rules! annual_balance {
    ($app:expr, $employee_id:expr) => {{
        let req = identified!(
            test::TestRequest::get().uri(&format!("/api/v1/balance/{}", $employee_id)),
            $employee_id,
            "employee"
        )
        .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let views: Value = test::read_body_json(resp).await;
        views
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["leave_type"] == "annual")
            .unwrap()
            .clone()
    }};
}

#[actix_web::test]
async fn submit_approve_and_account_the_balance() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-03",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["days"], 3.0);
    assert!(body.get("hold_token").is_none());
    let leave_id = body["id"].as_u64().unwrap();

    let balance = annual_balance!(app, EMPLOYEE);
    assert_eq!(balance["pending_hold"], 3.0);
    assert_eq!(balance["remaining"], 7.0);

    let resp = decide!(app, leave_id, "approve", HR, "hr");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["decided_by"], HR);

    let balance = annual_balance!(app, EMPLOYEE);
    assert_eq!(balance["consumed"], 3.0);
    assert_eq!(balance["pending_hold"], 0.0);

    // A second decision on the same request is a conflict.
    let resp = decide!(app, leave_id, "approve", BOSS, "boss");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let resp = decide!(app, leave_id, "reject", BOSS, "boss");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn submission_beyond_available_balance_is_rejected() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-03",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);

    // 3 held + 8 requested > 10 total
    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-10-01",
            "end_date": "2025-10-08",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "insufficient leave balance");
}

#[actix_web::test]
async fn rejection_releases_the_hold() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-02",
            "leave_type": "annual"
        })
    );
    let body: Value = test::read_body_json(resp).await;
    let leave_id = body["id"].as_u64().unwrap();

    let resp = decide!(app, leave_id, "reject", BOSS, "boss");
    assert_eq!(resp.status(), StatusCode::OK);

    let balance = annual_balance!(app, EMPLOYEE);
    assert_eq!(balance["consumed"], 0.0);
    assert_eq!(balance["pending_hold"], 0.0);
    assert_eq!(balance["remaining"], 10.0);
}

#[actix_web::test]
async fn invalid_input_is_bad_request() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-10",
            "end_date": "2025-09-08",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-10",
            "end_date": "2025-09-10",
            "leave_type": "sick"
        })
    );
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "a reason is required for this leave type");
}

#[actix_web::test]
async fn half_day_requests_charge_half_a_day() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-01",
            "leave_type": "annual",
            "duration": "half"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["days"], 0.5);

    let balance = annual_balance!(app, EMPLOYEE);
    assert_eq!(balance["pending_hold"], 0.5);
}

#[actix_web::test]
async fn overlapping_submission_is_a_conflict() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-03",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-03",
            "end_date": "2025-09-04",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Another employee is free to take the same range.
    let resp = submit!(
        app,
        OTHER_EMPLOYEE,
        json!({
            "start_date": "2025-09-03",
            "end_date": "2025-09-04",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn employees_cannot_decide_or_administer() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-01",
            "leave_type": "annual"
        })
    );
    let body: Value = test::read_body_json(resp).await;
    let leave_id = body["id"].as_u64().unwrap();

    let resp = decide!(app, leave_id, "approve", EMPLOYEE, "employee");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = identified!(
        test::TestRequest::put().uri(&format!("/api/v1/balance/{EMPLOYEE}/annual")),
        EMPLOYEE,
        "employee"
    )
    .set_json(json!({"total": 99.0}))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_identity_headers_are_unauthorized() {
    let app = app!(seeded_state().await);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave")
        .peer_addr("127.0.0.1:9999".parse().unwrap())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn adjust_cannot_undercut_committed_days() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-03",
            "leave_type": "annual"
        })
    );
    let body: Value = test::read_body_json(resp).await;
    let leave_id = body["id"].as_u64().unwrap();

    let resp = decide!(app, leave_id, "approve", HR, "hr");
    assert_eq!(resp.status(), StatusCode::OK);

    // consumed = 3, so total = 2 would break the ledger invariant
    let req = identified!(
        test::TestRequest::put().uri(&format!("/api/v1/balance/{EMPLOYEE}/annual")),
        HR,
        "hr"
    )
    .set_json(json!({"total": 2.0}))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = identified!(
        test::TestRequest::put().uri(&format!("/api/v1/balance/{EMPLOYEE}/annual")),
        HR,
        "hr"
    )
    .set_json(json!({"total": 3.0}))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["remaining"], 0.0);
}

#[actix_web::test]
async fn provisioning_twice_is_a_conflict() {
    let app = app!(seeded_state().await);

    let req = identified!(test::TestRequest::post().uri("/api/v1/balance"), HR, "hr")
        .set_json(json!({
            "employee_id": EMPLOYEE,
            "leave_type": "annual",
            "total": 20.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = identified!(test::TestRequest::post().uri("/api/v1/balance"), HR, "hr")
        .set_json(json!({
            "employee_id": EMPLOYEE,
            "leave_type": "unpaid",
            "total": 30.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn listing_is_scoped_by_role() {
    let app = app!(seeded_state().await);

    for employee in [EMPLOYEE, OTHER_EMPLOYEE] {
        let resp = submit!(
            app,
            employee,
            json!({
                "start_date": "2025-09-01",
                "end_date": "2025-09-02",
                "leave_type": "annual"
            })
        );
        assert_eq!(resp.status(), StatusCode::OK);
    }

    // Employee sees only their own request, even with a filter.
    let req = identified!(
        test::TestRequest::get().uri(&format!("/api/v1/leave?employee_id={OTHER_EMPLOYEE}")),
        EMPLOYEE,
        "employee"
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["employee_id"], EMPLOYEE);

    // HR sees everything.
    let req = identified!(test::TestRequest::get().uri("/api/v1/leave"), HR, "hr").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 2);
}

#[actix_web::test]
async fn listing_filters_by_status_newest_first() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-02",
            "leave_type": "annual"
        })
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = submit!(
        app,
        OTHER_EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-02",
            "leave_type": "annual"
        })
    );
    let body: Value = test::read_body_json(resp).await;
    let rejected_id = body["id"].as_u64().unwrap();
    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-10",
            "end_date": "2025-09-11",
            "leave_type": "annual"
        })
    );
    let body: Value = test::read_body_json(resp).await;
    let newest_id = body["id"].as_u64().unwrap();

    let resp = decide!(app, rejected_id, "reject", HR, "hr");
    assert_eq!(resp.status(), StatusCode::OK);

    let req = identified!(
        test::TestRequest::get().uri("/api/v1/leave?status=pending"),
        HR,
        "hr"
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["id"], newest_id);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["status"] == "pending")
    );

    let req = identified!(
        test::TestRequest::get().uri("/api/v1/leave?status=rejected"),
        HR,
        "hr"
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], rejected_id);
}

#[actix_web::test]
async fn dashboards_summarize_requests_and_balances() {
    let app = app!(seeded_state().await);

    let resp = submit!(
        app,
        EMPLOYEE,
        json!({
            "start_date": "2025-09-01",
            "end_date": "2025-09-02",
            "leave_type": "annual"
        })
    );
    let body: Value = test::read_body_json(resp).await;
    let leave_id = body["id"].as_u64().unwrap();

    let resp = decide!(app, leave_id, "reject", HR, "hr");
    assert_eq!(resp.status(), StatusCode::OK);

    let req = identified!(
        test::TestRequest::get().uri("/api/v1/dashboard/summary"),
        BOSS,
        "boss"
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["rejected"], 1);
    assert_eq!(body["pending"], 0);

    // Global summary is reviewer-only.
    let req = identified!(
        test::TestRequest::get().uri("/api/v1/dashboard/summary"),
        EMPLOYEE,
        "employee"
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = identified!(
        test::TestRequest::get().uri(&format!("/api/v1/dashboard/employee/{EMPLOYEE}")),
        EMPLOYEE,
        "employee"
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["counts"]["rejected"], 1);
    assert_eq!(body["requests"][0]["status"], "rejected");
    assert_eq!(body["balances"].as_array().unwrap().len(), 2);
}
