// ── Named resource registry ──
//
// The fixed set of page-level cells, one per backend read, each with its
// query parameters baked in. Parameterized reads (staff search) get a
// fresh cell per query from a factory instead of a registry slot.
//
// Nothing here invalidates anything: code that mutates backend state
// refreshes the cells it knows it touched.

use std::sync::Arc;

use erpdesk_api::ApiClient;
use futures_util::future::try_join_all;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{
    BudgetEntry, BudgetKpis, DashboardSummary, Page, PayrollKpis, PayrollSummary, Payslip,
    SalaryDefinition, Staff, StaffQuery, TaxDefinition,
};
use crate::resource::{Refresh, Resource};

// ── Keys ─────────────────────────────────────────────────────────────

/// Registry slot names, as used on the command line (`payroll.kpis`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ResourceKey {
    #[strum(serialize = "dashboard.summary")]
    DashboardSummary,
    #[strum(serialize = "payroll.kpis")]
    PayrollKpis,
    #[strum(serialize = "payroll.summary")]
    PayrollSummary,
    #[strum(serialize = "payroll.salary_definitions")]
    SalaryDefinitions,
    #[strum(serialize = "payroll.tax_definitions")]
    TaxDefinitions,
    #[strum(serialize = "payroll.payslips")]
    Payslips,
    #[strum(serialize = "budget.entries")]
    BudgetEntries,
    #[strum(serialize = "budget.kpis")]
    BudgetKpis,
}

/// Query parameters baked into the registry's producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Page size for the list cells (always page 1).
    pub list_limit: u32,
    /// Months covered by `payroll.summary`.
    pub summary_months: u32,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            list_limit: 50,
            summary_months: 6,
        }
    }
}

/// Type-erased view of one cell, for generic display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSnapshot {
    pub key: String,
    pub data: Option<serde_json::Value>,
    pub loading: bool,
    pub error: Option<String>,
}

// ── Type erasure ─────────────────────────────────────────────────────

trait AnyResource: Send + Sync {
    fn refresh(&self) -> Refresh;
    fn ensure_loaded(&self) -> Refresh;
    fn to_json(&self, key: ResourceKey) -> Result<JsonSnapshot, CoreError>;
}

impl<T: Serialize + Send + Sync + 'static> AnyResource for Resource<T> {
    fn refresh(&self) -> Refresh {
        Resource::refresh(self)
    }

    fn ensure_loaded(&self) -> Refresh {
        Resource::ensure_loaded(self)
    }

    fn to_json(&self, key: ResourceKey) -> Result<JsonSnapshot, CoreError> {
        let snap = self.snapshot();
        let data = snap
            .data
            .map(|v| serde_json::to_value(&*v))
            .transpose()
            .map_err(|e| CoreError::Internal(format!("cannot encode {key}: {e}")))?;
        Ok(JsonSnapshot {
            key: key.to_string(),
            data,
            loading: snap.loading,
            error: snap.error.as_ref().map(ToString::to_string),
        })
    }
}

/// Build a cell whose producer is a single `ApiClient` call.
macro_rules! cell {
    ($api:expr, $key:expr, |$client:ident| $call:expr) => {{
        let api = Arc::clone($api);
        Resource::new($key.to_string(), move || {
            let $client = Arc::clone(&api);
            async move { $call.await }
        })
    }};
}

// ── Registry ─────────────────────────────────────────────────────────

/// One cell per [`ResourceKey`], shared by every consumer of the context.
pub struct ResourceRegistry {
    api: Arc<ApiClient>,
    options: RegistryOptions,
    dashboard_summary: Resource<DashboardSummary>,
    payroll_kpis: Resource<PayrollKpis>,
    payroll_summary: Resource<PayrollSummary>,
    salary_definitions: Resource<Page<SalaryDefinition>>,
    tax_definitions: Resource<Page<TaxDefinition>>,
    payslips: Resource<Page<Payslip>>,
    budget_entries: Resource<Page<BudgetEntry>>,
    budget_kpis: Resource<BudgetKpis>,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ResourceRegistry {
    /// Create every cell. Nothing is fetched until a cell is refreshed.
    pub fn new(api: Arc<ApiClient>, options: RegistryOptions) -> Self {
        let limit = options.list_limit;
        let months = options.summary_months;

        Self {
            dashboard_summary: cell!(&api, ResourceKey::DashboardSummary, |c| c
                .dashboard_summary()),
            payroll_kpis: cell!(&api, ResourceKey::PayrollKpis, |c| c.payroll_kpis()),
            payroll_summary: cell!(&api, ResourceKey::PayrollSummary, |c| c
                .payroll_summary(months)),
            salary_definitions: cell!(&api, ResourceKey::SalaryDefinitions, |c| c
                .list_salary_definitions(1, limit)),
            tax_definitions: cell!(&api, ResourceKey::TaxDefinitions, |c| c
                .list_tax_definitions(1, limit)),
            payslips: cell!(&api, ResourceKey::Payslips, |c| c.list_payslips(1, limit)),
            budget_entries: cell!(&api, ResourceKey::BudgetEntries, |c| c
                .list_budget_entries(1, limit)),
            budget_kpis: cell!(&api, ResourceKey::BudgetKpis, |c| c.budget_kpis()),
            api,
            options,
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    // ── Typed access ─────────────────────────────────────────────────

    pub fn dashboard_summary(&self) -> &Resource<DashboardSummary> {
        &self.dashboard_summary
    }

    pub fn payroll_kpis(&self) -> &Resource<PayrollKpis> {
        &self.payroll_kpis
    }

    pub fn payroll_summary(&self) -> &Resource<PayrollSummary> {
        &self.payroll_summary
    }

    pub fn salary_definitions(&self) -> &Resource<Page<SalaryDefinition>> {
        &self.salary_definitions
    }

    pub fn tax_definitions(&self) -> &Resource<Page<TaxDefinition>> {
        &self.tax_definitions
    }

    pub fn payslips(&self) -> &Resource<Page<Payslip>> {
        &self.payslips
    }

    pub fn budget_entries(&self) -> &Resource<Page<BudgetEntry>> {
        &self.budget_entries
    }

    pub fn budget_kpis(&self) -> &Resource<BudgetKpis> {
        &self.budget_kpis
    }

    /// A fresh, unshared cell for one staff search. Each call gets its
    /// own cell, so results for different queries never mix.
    pub fn staff_search(&self, query: StaffQuery) -> Resource<Page<Staff>> {
        let api = Arc::clone(&self.api);
        let query = Arc::new(query);
        Resource::new("staff.search", move || {
            let api = Arc::clone(&api);
            let query = Arc::clone(&query);
            async move { api.search_staff(&query).await }
        })
    }

    // ── Keyed access ─────────────────────────────────────────────────

    /// Every registry key, in declaration order.
    pub fn keys() -> impl Iterator<Item = ResourceKey> {
        ResourceKey::iter()
    }

    fn cell(&self, key: ResourceKey) -> &dyn AnyResource {
        match key {
            ResourceKey::DashboardSummary => &self.dashboard_summary,
            ResourceKey::PayrollKpis => &self.payroll_kpis,
            ResourceKey::PayrollSummary => &self.payroll_summary,
            ResourceKey::SalaryDefinitions => &self.salary_definitions,
            ResourceKey::TaxDefinitions => &self.tax_definitions,
            ResourceKey::Payslips => &self.payslips,
            ResourceKey::BudgetEntries => &self.budget_entries,
            ResourceKey::BudgetKpis => &self.budget_kpis,
        }
    }

    /// Refresh one cell. The returned handle may be awaited or dropped.
    pub fn refresh(&self, key: ResourceKey) -> Refresh {
        debug!(%key, "refresh requested");
        self.cell(key).refresh()
    }

    /// Refresh only if the cell has never loaded successfully.
    pub fn ensure_loaded(&self, key: ResourceKey) -> Refresh {
        self.cell(key).ensure_loaded()
    }

    /// Refresh several cells concurrently and wait for all of them.
    ///
    /// Every refresh is started before any is awaited. Fails with the
    /// first error; the remaining refreshes still run to completion.
    pub async fn refresh_many(&self, keys: &[ResourceKey]) -> Result<(), CoreError> {
        try_join_all(keys.iter().map(|key| self.refresh(*key))).await?;
        Ok(())
    }

    /// Refresh every cell and wait for all of them.
    pub async fn refresh_all(&self) -> Result<(), CoreError> {
        let keys: Vec<_> = Self::keys().collect();
        self.refresh_many(&keys).await
    }

    /// JSON view of a cell's current snapshot.
    pub fn snapshot_json(&self, key: ResourceKey) -> Result<JsonSnapshot, CoreError> {
        self.cell(key).to_json(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_dotted_names() {
        let names: Vec<String> = ResourceRegistry::keys().map(|k| k.to_string()).collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"payroll.salary_definitions".to_owned()));
        assert_eq!(
            "budget.kpis".parse::<ResourceKey>().unwrap(),
            ResourceKey::BudgetKpis
        );
        assert!("payroll".parse::<ResourceKey>().is_err());
    }

    #[test]
    fn cells_start_idle() {
        let api = ApiClient::new(
            "http://localhost:4000",
            &erpdesk_api::TransportConfig::default(),
            Arc::new(erpdesk_api::MemoryTokenStore::new()),
        )
        .unwrap();
        let registry = ResourceRegistry::new(Arc::new(api), RegistryOptions::default());

        for key in ResourceRegistry::keys() {
            let snap = registry.snapshot_json(key).unwrap();
            assert_eq!(snap.key, key.to_string());
            assert!(snap.data.is_none());
            assert!(!snap.loading);
        }
        assert_eq!(registry.payroll_kpis().refresh_count(), 0);
    }
}
