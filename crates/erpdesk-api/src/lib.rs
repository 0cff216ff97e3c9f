// erpdesk-api: Async HTTP client for the erpdesk ERP backend.
//
// Every call goes to `<base>/api<path>`, carries the stored bearer token
// (if any) and the shared session cookies, and resolves to parsed JSON or
// an `Error` whose message is the backend's response text.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{MemoryTokenStore, SessionCookies, TokenStore};
pub use client::{ApiClient, RequestOptions};
pub use error::{Error, HttpError};
pub use transport::{TlsMode, TransportConfig};
