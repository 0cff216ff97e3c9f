// Wire types for the ERP backend.
//
// Field names follow the backend's camelCase JSON. Everything the pages
// only display is optional or defaulted so a partially populated record
// never fails the whole response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identity ─────────────────────────────────────────────────────────

/// The signed-in user as reported by the identity endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    /// Name if known, email otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of sign-in / sign-up. The token is absent for cookie-only sessions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    pub user: User,
}

/// `GET /auth/me` answers either the bare user or `{ "user": ... }`.
///
/// `Bare` must come first: a missing `user` field deserializes as `None`,
/// so `Wrapped` would swallow a bare user object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MeResponse {
    Bare(User),
    Wrapped { user: Option<User> },
}

impl MeResponse {
    pub(crate) fn into_user(self) -> Option<User> {
        match self {
            Self::Bare(user) => Some(user),
            Self::Wrapped { user } => user,
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────

/// A page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
        }
    }
}

// ── Dashboard ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSummary {
    pub staff_count: u64,
    pub active_staff: u64,
    pub pending_memos: u64,
    pub open_circulars: u64,
    pub pending_budget_requests: u64,
    pub open_procurements: u64,
    pub upcoming_maintenance: u64,
}

// ── Payroll ──────────────────────────────────────────────────────────

/// Headline payroll figures for the current period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayrollKpis {
    pub gross: f64,
    pub net: f64,
    pub tax: f64,
    pub loan: f64,
}

/// Per-month payroll totals for the summary chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayrollSummary {
    pub months: Vec<PayrollMonth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayrollMonth {
    pub month: String,
    pub gross: f64,
    pub net: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grade: Option<String>,
    pub basic: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSalaryDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub basic: f64,
    pub allowances: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDefinition {
    pub id: String,
    pub name: String,
    /// Percentage, e.g. `7.5`.
    pub rate: f64,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxDefinition {
    pub name: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payslip {
    pub id: String,
    pub staff_id: String,
    #[serde(default)]
    pub staff_name: Option<String>,
    /// Pay period, `YYYY-MM`.
    pub period: String,
    #[serde(default)]
    pub gross: f64,
    #[serde(default)]
    pub net: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayslip {
    pub staff_id: String,
    pub period: String,
}

// ── Budget ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetKpis {
    pub total_requested: f64,
    pub total_approved: f64,
    pub pending_count: u64,
    pub rejected_count: u64,
}

// ── Staff ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Parameters for `GET /staff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffQuery {
    pub search: Option<String>,
    pub department: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for StaffQuery {
    fn default() -> Self {
        Self {
            search: None,
            department: None,
            page: 1,
            limit: 50,
        }
    }
}

impl StaffQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(ref s) = self.search {
            params.push(("search", s.clone()));
        }
        if let Some(ref d) = self.department {
            params.push(("department", d.clone()));
        }
        params
    }
}

/// Metadata returned after a document upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDocument {
    pub id: String,
    pub file_name: String,
    #[serde(default)]
    pub url: Option<String>,
}
