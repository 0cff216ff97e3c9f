use crate::client::ApiClient;
use crate::error::Error;
use crate::models::DashboardSummary;

impl ApiClient {
    /// `GET /dashboard/summary`
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, Error> {
        self.get("/dashboard/summary").await
    }
}
