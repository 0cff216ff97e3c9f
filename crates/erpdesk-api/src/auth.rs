// Local credential storage: the bearer token store and the session
// cookie jar. Together these are everything `logout` has to wipe.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::error::Error;

// ── Token store ──────────────────────────────────────────────────────

/// Where the bearer token lives between requests.
///
/// Implementations must be cheap to call; `load` runs on every request.
/// A failed `load` is treated as "no token" by the client.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<SecretString>, Error>;
    fn save(&self, token: &SecretString) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

/// Process-local token store. Forgets the token when dropped.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), Error> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// ── Session cookies ──────────────────────────────────────────────────

/// A cookie store that can be wiped.
///
/// `reqwest::cookie::Jar` has no way to remove cookies, so this wraps one
/// behind a lock and swaps in an empty jar on [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct SessionCookies {
    jar: RwLock<Arc<Jar>>,
}

impl SessionCookies {
    fn current(&self) -> Arc<Jar> {
        Arc::clone(&self.jar.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drop every stored cookie.
    pub fn clear(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(Jar::default());
    }

    /// The `Cookie` header value that would be sent to `url`, if any.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let value = self.current().cookies(url)?;
        value.to_str().ok().map(String::from)
    }

    /// Seed a cookie as if the server at `url` had set it.
    pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
        self.current().add_cookie_str(cookie, url);
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.current().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.current().cookies(url)
    }
}
