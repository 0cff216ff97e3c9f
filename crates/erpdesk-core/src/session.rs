// ── Session / auth gate ──
//
// Tracks who is signed in and decides, per navigation, whether a route
// may be shown. The check goes to the identity provider every time; the
// cached user is for display only and never short-circuits the guard.

use std::future::Future;
use std::sync::Arc;

use erpdesk_api::ApiClient;
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::User;

// ── Identity provider ────────────────────────────────────────────────

/// The backend's opaque identity service.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The signed-in user, or `None` when there is no session.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, CoreError>> + Send;

    fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, CoreError>> + Send;

    fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<User, CoreError>> + Send;

    /// End the server-side session.
    fn sign_out(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Drop every locally held credential (token store, cookie jar).
    fn clear_local_state(&self) -> Result<(), CoreError>;
}

impl IdentityProvider for ApiClient {
    async fn current_user(&self) -> Result<Option<User>, CoreError> {
        Ok(self.get_me().await?)
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        Ok(ApiClient::sign_in(self, email, password).await?)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, CoreError> {
        Ok(ApiClient::sign_up(self, name, email, password).await?)
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        Ok(ApiClient::sign_out(self).await?)
    }

    fn clear_local_state(&self) -> Result<(), CoreError> {
        Ok(self.clear_local_credentials()?)
    }
}

// ── Guard policy ─────────────────────────────────────────────────────

/// Which routes are public and where unauthenticated visitors go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Route prefixes that never require a session.
    pub public_prefixes: Vec<String>,
    /// Redirect target for unauthenticated visitors.
    pub login_path: String,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            public_prefixes: ["/login", "/signup", "/forgot-password", "/reset-password"]
                .into_iter()
                .map(String::from)
                .collect(),
            login_path: "/login".into(),
        }
    }
}

impl GuardPolicy {
    /// Whether `path` is under a public prefix. Matching respects path
    /// segments: `/login` covers `/login/sso` but not `/loginx`.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
        })
    }
}

/// Result of guarding one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Public route; shown without checking the session.
    Public,
    /// Protected route with a live session.
    Allowed(Arc<User>),
    /// No session: go to `to`, remembering the requested route.
    Redirect { to: String, from: String },
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Redirect { .. })
    }
}

// ── Gate ─────────────────────────────────────────────────────────────

/// The session flag plus the route guard built on it.
pub struct SessionGate<I> {
    identity: Arc<I>,
    policy: GuardPolicy,
    current: watch::Sender<Option<Arc<User>>>,
}

impl<I> std::fmt::Debug for SessionGate<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("policy", &self.policy)
            .field("signed_in", &self.current.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl<I: IdentityProvider> SessionGate<I> {
    pub fn new(identity: Arc<I>, policy: GuardPolicy) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            identity,
            policy,
            current,
        }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Ask the provider who is signed in and record it. Never fails: any
    /// error leaves the gate signed out.
    pub async fn bootstrap(&self) -> Option<Arc<User>> {
        let user = match self.identity.current_user().await {
            Ok(user) => user.map(Arc::new),
            Err(e) => {
                warn!(error = %e, "session bootstrap failed");
                None
            }
        };
        debug!(signed_in = user.is_some(), "session bootstrapped");
        self.current.send_replace(user.clone());
        user
    }

    /// Decide whether `path` may be shown.
    ///
    /// Protected routes always consult the provider; a provider error is
    /// treated like "no session". The flag is updated with the answer.
    pub async fn guard(&self, path: &str) -> GuardOutcome {
        if self.policy.is_public(path) {
            return GuardOutcome::Public;
        }

        match self.identity.current_user().await {
            Ok(Some(user)) => {
                let user = Arc::new(user);
                self.current.send_replace(Some(Arc::clone(&user)));
                GuardOutcome::Allowed(user)
            }
            outcome => {
                if let Err(e) = outcome {
                    warn!(path, error = %e, "session check failed");
                }
                self.current.send_replace(None);
                debug!(path, to = %self.policy.login_path, "redirecting to login");
                GuardOutcome::Redirect {
                    to: self.policy.login_path.clone(),
                    from: path.to_owned(),
                }
            }
        }
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Arc<User>, CoreError> {
        let user = Arc::new(self.identity.sign_in(email, password).await?);
        info!(user = %user.display_name(), "signed in");
        self.current.send_replace(Some(Arc::clone(&user)));
        Ok(user)
    }

    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Arc<User>, CoreError> {
        let user = Arc::new(self.identity.sign_up(name, email, password).await?);
        info!(user = %user.display_name(), "signed up");
        self.current.send_replace(Some(Arc::clone(&user)));
        Ok(user)
    }

    /// Sign out. Best effort: the flag is cleared first, then local
    /// credentials, then the server session. Failures are logged only.
    pub async fn logout(&self) {
        self.current.send_replace(None);

        if let Err(e) = self.identity.clear_local_state() {
            warn!(error = %e, "failed to clear local credentials");
        }
        match self.identity.sign_out().await {
            Ok(()) => info!("signed out"),
            Err(e) => warn!(error = %e, "backend sign-out failed"),
        }
    }

    /// The last known user. Display only; the guard never trusts it.
    pub fn current_user(&self) -> Option<Arc<User>> {
        self.current.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Receiver that observes every change of the current user.
    pub fn watch_user(&self) -> watch::Receiver<Option<Arc<User>>> {
        self.current.subscribe()
    }
}
