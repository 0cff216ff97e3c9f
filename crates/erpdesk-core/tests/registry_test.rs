#![allow(clippy::unwrap_used)]
// Integration tests for the resource registry against a mocked backend.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use erpdesk_api::MemoryTokenStore;
use erpdesk_core::model::{NewSalaryDefinition, PayrollKpis, StaffQuery};
use erpdesk_core::{AppConfig, AppContext, CoreError, ResourceKey};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AppContext) {
    let server = MockServer::start().await;
    let config = AppConfig {
        api_url: server.uri(),
        ..AppConfig::default()
    };
    let ctx = AppContext::new(config, Arc::new(MemoryTokenStore::new())).unwrap();
    (server, ctx)
}

fn salary_definition(id: &str, name: &str, basic: f64) -> serde_json::Value {
    json!({ "id": id, "name": name, "basic": basic, "allowances": 0.0 })
}

// ── Payroll KPIs ────────────────────────────────────────────────────

#[tokio::test]
async fn test_payroll_kpis_end_to_end() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/payroll/kpis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "gross": 500_000,
            "net": 400_000,
            "tax": 80_000,
            "loan": 20_000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let kpis = ctx.resources().payroll_kpis();
    kpis.refresh().await.unwrap();

    let snap = kpis.snapshot();
    assert_eq!(
        snap.data.as_deref(),
        Some(&PayrollKpis {
            gross: 500_000.0,
            net: 400_000.0,
            tax: 80_000.0,
            loan: 20_000.0,
        })
    );
    assert!(!snap.loading);
    assert!(snap.error.is_none());
}

// ── Mutation then manual invalidation ───────────────────────────────

#[tokio::test]
async fn test_create_salary_definition_then_refresh() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/payroll/salary-definitions"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [salary_definition("sd-1", "Grade A", 120_000.0)],
            "total": 1
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/payroll/salary-definitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                salary_definition("sd-1", "Grade A", 120_000.0),
                salary_definition("sd-2", "Grade B", 150_000.0)
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/payroll/salary-definitions"))
        .and(body_partial_json(json!({ "name": "Grade B", "basic": 150_000.0 })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(salary_definition("sd-2", "Grade B", 150_000.0)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let defs = ctx.resources().salary_definitions();
    defs.refresh().await.unwrap();
    let calls_before = defs.refresh_count();
    assert_eq!(defs.value().unwrap().items.len(), 1);

    let created = ctx
        .api()
        .create_salary_definition(&NewSalaryDefinition {
            name: "Grade B".into(),
            grade: None,
            basic: 150_000.0,
            allowances: 0.0,
        })
        .await
        .unwrap();

    // Creating does not touch the cell on its own.
    assert_eq!(defs.value().unwrap().items.len(), 1);

    defs.refresh().await.unwrap();
    assert_eq!(defs.refresh_count(), calls_before + 1);
    let page = defs.value().unwrap();
    assert!(page.items.iter().any(|d| d.id == created.id && d.name == "Grade B"));
}

// ── Keyed access ────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_many_reports_first_error_and_keeps_going() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/budget/kpis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalRequested": 10_000.0,
            "totalApproved": 4_000.0,
            "pendingCount": 3,
            "rejectedCount": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/budget/entries"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = ctx
        .resources()
        .refresh_many(&[ResourceKey::BudgetKpis, ResourceKey::BudgetEntries])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Request failed: 500");

    let kpis = ctx.resources().snapshot_json(ResourceKey::BudgetKpis).unwrap();
    assert_eq!(kpis.key, "budget.kpis");
    assert_eq!(kpis.data.unwrap()["pendingCount"], 3);

    let entries = ctx
        .resources()
        .snapshot_json(ResourceKey::BudgetEntries)
        .unwrap();
    assert!(entries.data.is_none());
    assert!(!entries.loading);
    assert_eq!(entries.error.as_deref(), Some("Request failed: 500"));
}

#[tokio::test]
async fn test_ensure_loaded_skips_loaded_cells() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/dashboard/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "staffCount": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = ctx.resources();
    registry
        .ensure_loaded(ResourceKey::DashboardSummary)
        .await
        .unwrap();
    registry
        .ensure_loaded(ResourceKey::DashboardSummary)
        .await
        .unwrap();

    assert_eq!(
        registry.dashboard_summary().value().unwrap().staff_count,
        42
    );
}

#[tokio::test]
async fn test_unauthorized_refresh_is_stored() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/payroll/payslips"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let payslips = ctx.resources().payslips();
    drop(payslips.refresh());
    let err = payslips.refresh().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(payslips.snapshot().error, Some(err));
}

// ── Staff search factory ────────────────────────────────────────────

#[tokio::test]
async fn test_staff_search_cells_are_independent() {
    let (server, ctx) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/staff"))
        .and(query_param("search", "ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "s1", "name": "Ada Obi" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/staff"))
        .and(query_param("search", "zed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let ada = ctx.resources().staff_search(StaffQuery::search("ada"));
    let zed = ctx.resources().staff_search(StaffQuery::search("zed"));

    ada.refresh().await.unwrap();
    zed.refresh().await.unwrap();

    assert_eq!(ada.value().unwrap().items[0].name, "Ada Obi");
    assert!(zed.value().unwrap().items.is_empty());
    assert_eq!(ada.refresh_count(), 1);
}

#[tokio::test]
async fn test_connection_refused_maps_to_connection_failed() {
    let config = AppConfig {
        api_url: "http://127.0.0.1:1".into(),
        ..AppConfig::default()
    };
    let ctx = AppContext::new(config, Arc::new(MemoryTokenStore::new())).unwrap();

    let err = ctx.resources().payroll_kpis().refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::ConnectionFailed { .. }), "{err:?}");
}
