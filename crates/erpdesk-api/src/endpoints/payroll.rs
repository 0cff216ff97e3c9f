// Payroll endpoints: KPIs, the monthly summary, salary and tax
// definitions, and payslips.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{
    NewPayslip, NewSalaryDefinition, NewTaxDefinition, Page, PayrollKpis, PayrollSummary,
    Payslip, SalaryDefinition, TaxDefinition,
};

fn page_params(page: u32, limit: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("limit", limit.to_string())]
}

impl ApiClient {
    /// `GET /payroll/kpis`
    pub async fn payroll_kpis(&self) -> Result<PayrollKpis, Error> {
        self.get("/payroll/kpis").await
    }

    /// `GET /payroll/summary?months={months}`
    pub async fn payroll_summary(&self, months: u32) -> Result<PayrollSummary, Error> {
        self.get_with_params("/payroll/summary", &[("months", months.to_string())])
            .await
    }

    // ── Salary definitions ───────────────────────────────────────────

    pub async fn list_salary_definitions(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<SalaryDefinition>, Error> {
        self.get_with_params("/payroll/salary-definitions", &page_params(page, limit))
            .await
    }

    pub async fn create_salary_definition(
        &self,
        def: &NewSalaryDefinition,
    ) -> Result<SalaryDefinition, Error> {
        debug!(name = %def.name, "creating salary definition");
        self.post("/payroll/salary-definitions", def).await
    }

    pub async fn update_salary_definition(
        &self,
        id: &str,
        def: &NewSalaryDefinition,
    ) -> Result<SalaryDefinition, Error> {
        debug!(id, "updating salary definition");
        self.put(&format!("/payroll/salary-definitions/{id}"), def)
            .await
    }

    pub async fn delete_salary_definition(&self, id: &str) -> Result<(), Error> {
        debug!(id, "deleting salary definition");
        let _: serde_json::Value = self
            .delete(&format!("/payroll/salary-definitions/{id}"))
            .await?;
        Ok(())
    }

    // ── Tax definitions ──────────────────────────────────────────────

    pub async fn list_tax_definitions(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Page<TaxDefinition>, Error> {
        self.get_with_params("/payroll/tax-definitions", &page_params(page, limit))
            .await
    }

    pub async fn create_tax_definition(
        &self,
        def: &NewTaxDefinition,
    ) -> Result<TaxDefinition, Error> {
        debug!(name = %def.name, "creating tax definition");
        self.post("/payroll/tax-definitions", def).await
    }

    pub async fn delete_tax_definition(&self, id: &str) -> Result<(), Error> {
        debug!(id, "deleting tax definition");
        let _: serde_json::Value = self
            .delete(&format!("/payroll/tax-definitions/{id}"))
            .await?;
        Ok(())
    }

    // ── Payslips ─────────────────────────────────────────────────────

    pub async fn list_payslips(&self, page: u32, limit: u32) -> Result<Page<Payslip>, Error> {
        self.get_with_params("/payroll/payslips", &page_params(page, limit))
            .await
    }

    pub async fn create_payslip(&self, slip: &NewPayslip) -> Result<Payslip, Error> {
        debug!(staff_id = %slip.staff_id, period = %slip.period, "creating payslip");
        self.post("/payroll/payslips", slip).await
    }
}
