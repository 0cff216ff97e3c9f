//! Client-state layer between `erpdesk-api` and front-ends (the CLI).
//!
//! - **[`Resource<T>`]**: a single-value async cache cell. Wraps a producer,
//!   exposes `{data, loading, error}` [`Snapshot`]s, keeps the last good
//!   value through refreshes and failures (stale-while-revalidate), and
//!   notifies subscribers in order. A refresh issued while one is in flight
//!   joins it rather than starting a second producer call.
//!
//! - **[`ResourceRegistry`]**: the fixed set of named cells (dashboard,
//!   payroll, budget) plus a factory for one-shot staff searches.
//!   Invalidation is manual: whoever mutates refreshes the cells they touched.
//!
//! - **[`SessionGate`]**: the current-user flag, the per-navigation route
//!   guard, and best-effort logout.
//!
//! - **[`AppContext`]**: owns all of the above; build one per process (or
//!   per test) instead of relying on globals.

pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod registry;
pub mod resource;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{AppConfig, DEFAULT_API_URL, TlsVerification};
pub use context::AppContext;
pub use error::CoreError;
pub use registry::{JsonSnapshot, RegistryOptions, ResourceKey, ResourceRegistry};
pub use resource::{
    Refresh, Resource, ResourceState, ResourceStream, ResourceWatchStream, Snapshot, Subscription,
};
pub use session::{GuardOutcome, GuardPolicy, IdentityProvider, SessionGate};

pub use erpdesk_api::Error as ApiError;
pub use model::User;
