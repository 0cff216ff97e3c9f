// Identity endpoints
//
// The backend's auth provider is opaque to us: we can ask who is signed
// in, sign in or up, and sign out. Sign-in stores the returned bearer
// token (if any); cookie sessions land in the shared jar automatically.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{AuthResponse, MeResponse, SignInRequest, SignUpRequest, User};

impl ApiClient {
    /// The current session's user, or `None` when nobody is signed in.
    ///
    /// `GET /auth/me`. A 401/403 means "no session" and is not an error.
    pub async fn get_me(&self) -> Result<Option<User>, Error> {
        match self.get::<Option<MeResponse>>("/auth/me").await {
            Ok(resp) => Ok(resp.and_then(MeResponse::into_user)),
            Err(e) if e.is_unauthorized() => {
                debug!("no active session");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// `POST /auth/sign-in`, storing the returned bearer token.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<User, Error> {
        debug!(email, "signing in");
        let resp: AuthResponse = self
            .post(
                "/auth/sign-in",
                &SignInRequest {
                    email,
                    password: password.expose_secret(),
                },
            )
            .await?;
        self.store_token(resp.token)?;
        Ok(resp.user)
    }

    /// `POST /auth/sign-up`. The new account is signed in on success.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, Error> {
        debug!(email, "signing up");
        let resp: AuthResponse = self
            .post(
                "/auth/sign-up",
                &SignUpRequest {
                    name,
                    email,
                    password: password.expose_secret(),
                },
            )
            .await?;
        self.store_token(resp.token)?;
        Ok(resp.user)
    }

    /// `POST /auth/sign-out`. Only ends the server-side session; local
    /// credentials are cleared separately via `clear_local_credentials`.
    pub async fn sign_out(&self) -> Result<(), Error> {
        debug!("signing out");
        let _: serde_json::Value = self
            .request("/auth/sign-out", crate::RequestOptions::post())
            .await?;
        Ok(())
    }

    fn store_token(&self, token: Option<String>) -> Result<(), Error> {
        match token {
            Some(token) => self.tokens().save(&SecretString::from(token)),
            None => Ok(()),
        }
    }
}
