// Budget request endpoints.

use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{BudgetEntry, BudgetKpis, NewBudgetEntry, Page};

impl ApiClient {
    /// `GET /budget/entries?page=..&limit=..`
    pub async fn list_budget_entries(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<BudgetEntry>, Error> {
        self.get_with_params(
            "/budget/entries",
            &[("page", page.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn create_budget_entry(&self, entry: &NewBudgetEntry) -> Result<BudgetEntry, Error> {
        debug!(title = %entry.title, "creating budget entry");
        self.post("/budget/entries", entry).await
    }

    /// `PATCH /budget/entries/{id}/status` with `{ "status": .. }`
    /// (`approved`, `rejected`, `pending`).
    pub async fn update_budget_entry_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<BudgetEntry, Error> {
        debug!(id, status, "updating budget entry status");
        self.patch(
            &format!("/budget/entries/{id}/status"),
            &json!({ "status": status }),
        )
        .await
    }

    /// `GET /budget/kpis`
    pub async fn budget_kpis(&self) -> Result<BudgetKpis, Error> {
        self.get("/budget/kpis").await
    }
}
