// Endpoint groups, implemented as inherent `ApiClient` methods.
//
// Each method is one `request` call against a fixed path; none of them
// cache or retry.

pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod payroll;
pub mod staff;
