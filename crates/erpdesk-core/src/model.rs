// ── Domain model ──
//
// The backend's JSON shapes are used as-is; this module re-exports them
// so front-ends depend on `erpdesk-core` alone.

pub use erpdesk_api::models::{
    BudgetEntry, BudgetKpis, DashboardSummary, NewBudgetEntry, NewPayslip, NewSalaryDefinition,
    NewTaxDefinition, Page, PayrollKpis, PayrollMonth, PayrollSummary, Payslip, SalaryDefinition,
    Staff, StaffDocument, StaffQuery, TaxDefinition, User,
};
