// erpdesk HTTP client
//
// Wraps `reqwest::Client` with `<base>/api<path>` URL construction, bearer
// token injection, cookie-session replay, and uniform response handling.
// Endpoint groups (payroll, budget, staff, ...) are implemented as inherent
// methods in `crate::endpoints` to keep this module about transport.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{SessionCookies, TokenStore};
use crate::error::{Error, HttpError};
use crate::transport::TransportConfig;

/// Prefix every backend route lives under.
const API_PREFIX: &str = "/api";

// ── Request descriptor ───────────────────────────────────────────────

/// Method, headers, query, and JSON body for a single request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Encode `body` as the JSON request body.
    pub fn json(mut self, body: &impl Serialize) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the ERP backend.
///
/// Cheap to share behind an `Arc`; all state (token store, cookie jar)
/// is internally synchronized.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    cookies: Arc<SessionCookies>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the backend rooted at `base_url`.
    ///
    /// If the transport config doesn't already carry a cookie store, one
    /// is created so cookie-based sessions work out of the box.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let config = if transport.cookies.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookies()
        };
        let cookies = config
            .cookies
            .clone()
            .unwrap_or_else(|| Arc::new(SessionCookies::default()));
        let http = config.build_client()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            http,
            base_url,
            tokens,
            cookies,
        })
    }

    /// The configured backend root (without the `/api` prefix).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The bearer token store.
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// The session cookie jar shared with the underlying HTTP client.
    pub fn cookies(&self) -> &Arc<SessionCookies> {
        &self.cookies
    }

    /// Wipe every locally held credential: bearer token and cookies.
    ///
    /// Cookies are always cleared, even when the token store fails.
    pub fn clear_local_credentials(&self) -> Result<(), Error> {
        self.cookies.clear();
        self.tokens.clear()
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `<base>/api<path>`. `path` may carry its own query string.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let sep = if path.starts_with('/') { "" } else { "/" };
        Ok(Url::parse(&format!("{base}{API_PREFIX}{sep}{path}"))?)
    }

    // ── Core request paths ───────────────────────────────────────────

    /// Issue a JSON request and decode the JSON response.
    ///
    /// Non-2xx responses fail with [`Error::Http`], whose message is the
    /// response body (or `Request failed: <status>` when empty).
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(method = %options.method, %url, "request");

        let mut builder = self
            .http
            .request(options.method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = options.body {
            builder = builder.body(serde_json::to_vec(&body)?);
        }

        let resp = self.authorize(builder).send().await?;
        self.handle_response(resp).await
    }

    /// Upload a multipart form via POST and decode the JSON response.
    ///
    /// No `Content-Type` is set here; reqwest supplies the multipart
    /// boundary header itself.
    pub async fn request_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!(%url, "multipart POST");

        let builder = self.http.post(url).multipart(form);
        let resp = self.authorize(builder).send().await?;
        self.handle_response(resp).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let options = params
            .iter()
            .fold(RequestOptions::get(), |opts, (k, v)| opts.query(*k, v));
        self.request(path, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(path, RequestOptions::post().json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(path, RequestOptions::put().json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(path, RequestOptions::patch().json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(path, RequestOptions::delete()).await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Attach `Authorization: Bearer <token>` if a token is stored.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "token store unreadable, sending request without bearer token");
                None
            }
        };
        let Some(token) = token else {
            return builder;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                trace!("attaching bearer token");
                builder.header(AUTHORIZATION, value)
            }
            Err(e) => {
                warn!(error = %e, "stored token is not a valid header value, skipping");
                builder
            }
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "request failed");
            return Err(HttpError::new(status.as_u16(), body).into());
        }

        // 204s and empty 200s decode as JSON null.
        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
