//! Credential lifecycle manager.
//!
//! Owns sign-up/sign-in, refresh, the expiry timer, and persistence of
//! the one per-process session. Provider failures never propagate out of
//! this module; each is mapped to a user-facing message on the auth
//! slice.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;

use cleanspot_protocol::AuthMode;
use cleanspot_protocol::Credentials;
use cleanspot_protocol::Transition;

use crate::config::Config;
use crate::gateway::Gateway;
use crate::gateway::GatewayError;
use crate::gateway::OutboundRequest;
use crate::storage::PersistedSession;
use crate::storage::SessionStorage;
use crate::store::Store;

const GENERIC_AUTH_ERROR: &str = "Something went wrong!";

#[derive(Debug, Error)]
enum AuthError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Provider rejection already mapped to its user-facing message.
    #[error("{0}")]
    Provider(String),
}

impl AuthError {
    fn message(&self) -> String {
        match self {
            AuthError::Gateway(e) => {
                tracing::warn!("auth request failed: {e}");
                GENERIC_AUTH_ERROR.to_string()
            }
            AuthError::Provider(message) => message.clone(),
        }
    }
}

/// Sign-up / sign-in success payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: Option<String>,
    local_id: String,
    #[serde(default)]
    display_name: Option<String>,
    /// Lifetime in seconds, as a decimal string.
    expires_in: String,
}

/// Refresh endpoint success payload (snake_case on the wire).
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: Option<String>,
    user_id: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

pub struct AuthManager {
    store: Arc<Store>,
    gateway: Gateway,
    config: Config,
    storage: SessionStorage,
    /// At most one expiry timer outstanding; arming aborts the previous.
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AuthManager {
    pub fn new(store: Arc<Store>, gateway: Gateway, config: Config) -> Arc<Self> {
        let storage = SessionStorage::new(&config.data_dir);
        Arc::new(Self {
            store,
            gateway,
            config,
            storage,
            timer: Mutex::new(None),
        })
    }

    /// Signs up or signs in. All failures end as `last_error` on the
    /// auth slice; nothing is retried automatically.
    pub async fn authenticate(self: &Arc<Self>, credentials: Credentials, mode: AuthMode) {
        self.store.commit(&Transition::AuthStarted);

        match self.request_tokens(&credentials, mode).await {
            Ok(response) => self.establish_session(response).await,
            Err(e) => {
                self.store.commit(&Transition::AuthFailed {
                    message: e.message(),
                });
            }
        }
    }

    /// Exchanges the known refresh token for fresh credentials. Without a
    /// refresh token, or on any failure, the session ends.
    pub async fn refresh(self: &Arc<Self>) {
        let Some(refresh_token) = self.store.state().auth.refresh_token else {
            self.logout().await;
            return;
        };

        self.store.commit(&Transition::AuthStarted);

        match self.request_refresh(&refresh_token).await {
            Ok(response) => {
                let ttl = parse_expires_in(&response.expires_in);
                let expiry_instant = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);
                let username = self.store.state().auth.username;

                let persisted = PersistedSession {
                    user_id: response.user_id.clone(),
                    id_token: response.id_token.clone(),
                    refresh_token: response.refresh_token.clone(),
                    username: username.clone(),
                    expiry_instant,
                };
                if let Err(e) = self.storage.save(&persisted) {
                    tracing::warn!("could not persist refreshed session: {e}");
                }

                self.store.commit(&Transition::AuthSucceeded {
                    user_id: response.user_id,
                    id_token: response.id_token,
                    refresh_token: response.refresh_token,
                    username,
                    expiry_instant: Some(expiry_instant),
                });

                self.arm_expiry_timer(ttl);
            }
            Err(e) => {
                tracing::warn!("token refresh failed, ending session: {}", e.message());
                if let Err(e) = self.storage.clear() {
                    tracing::warn!("could not clear persisted session: {e}");
                }
                self.cancel_expiry_timer();
                self.store.commit(&Transition::LoggedOut);
            }
        }
    }

    /// Attempts to restore a persisted session on startup.
    ///
    /// Absent, expired, or incomplete sessions leave the process
    /// anonymous with `did_attempt_auto_login` set and no timer armed.
    pub async fn restore_session(self: &Arc<Self>) {
        let Some(persisted) = self.storage.load() else {
            self.store.commit(&Transition::AutoLoginAttempted);
            return;
        };

        let now = Utc::now();
        if persisted.expiry_instant <= now
            || persisted.id_token.is_empty()
            || persisted.user_id.is_empty()
        {
            self.store.commit(&Transition::AutoLoginAttempted);
            return;
        }

        let remaining = persisted.expiry_instant - now;
        let remaining = Duration::from_millis(remaining.num_milliseconds().max(0) as u64);

        self.store.commit(&Transition::AuthSucceeded {
            user_id: persisted.user_id,
            id_token: persisted.id_token,
            refresh_token: persisted.refresh_token,
            username: persisted.username,
            expiry_instant: Some(persisted.expiry_instant),
        });

        // Armed for the remaining time-to-live, not the original one.
        self.arm_expiry_timer(remaining);
    }

    pub async fn logout(self: &Arc<Self>) {
        self.cancel_expiry_timer();
        if let Err(e) = self.storage.clear() {
            tracing::warn!("could not clear persisted session: {e}");
        }
        self.store.commit(&Transition::LoggedOut);
    }

    async fn request_tokens(
        &self,
        credentials: &Credentials,
        mode: AuthMode,
    ) -> Result<SignInResponse, AuthError> {
        let (url, payload) = match mode {
            AuthMode::SignUp => (
                self.config.sign_up_url(),
                json!({
                    "displayName": credentials.username,
                    "email": credentials.email,
                    "password": credentials.password,
                    "returnSecureToken": true,
                }),
            ),
            AuthMode::SignIn => (
                self.config.sign_in_url(),
                json!({
                    "email": credentials.email,
                    "password": credentials.password,
                    "returnSecureToken": true,
                }),
            ),
        };

        let response = self
            .gateway
            .send(OutboundRequest::post_json(url, payload))
            .await?;

        if !response.is_success() {
            let code = response
                .json::<ProviderError>()
                .map(|e| e.error.message)
                .unwrap_or_default();
            return Err(AuthError::Provider(map_provider_error(&code)));
        }

        Ok(response.json::<SignInResponse>()?)
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let payload = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });

        let response = self
            .gateway
            .send(OutboundRequest::post_json(self.config.refresh_url(), payload))
            .await?;

        if !response.is_success() {
            return Err(AuthError::Provider(GENERIC_AUTH_ERROR.to_string()));
        }

        Ok(response.json::<RefreshResponse>()?)
    }

    async fn establish_session(self: &Arc<Self>, response: SignInResponse) {
        let ttl = parse_expires_in(&response.expires_in);
        let expiry_instant = Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64);
        let username = response.display_name.unwrap_or_default();

        let persisted = PersistedSession {
            user_id: response.local_id.clone(),
            id_token: response.id_token.clone(),
            refresh_token: response.refresh_token.clone(),
            username: username.clone(),
            expiry_instant,
        };
        if let Err(e) = self.storage.save(&persisted) {
            tracing::warn!("could not persist session: {e}");
        }

        self.store.commit(&Transition::AuthSucceeded {
            user_id: response.local_id,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            username,
            expiry_instant: Some(expiry_instant),
        });

        self.arm_expiry_timer(ttl);
    }

    /// Arms the single-shot expiry timer. Any previously armed timer for
    /// this session is aborted first, so at most one is outstanding.
    fn arm_expiry_timer(self: &Arc<Self>, ttl: Duration) {
        let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let manager = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let has_refresh_token = manager.store.state().auth.refresh_token.is_some();
            if has_refresh_token {
                manager.refresh().await;
            } else {
                manager.logout().await;
            }
        }));
    }

    fn cancel_expiry_timer(&self) {
        let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = slot.take() {
            timer.abort();
        }
    }
}

impl Drop for AuthManager {
    fn drop(&mut self) {
        self.cancel_expiry_timer();
    }
}

fn parse_expires_in(raw: &str) -> Duration {
    match raw.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => {
            tracing::warn!("unparseable expiresIn {raw:?}, assuming one hour");
            Duration::from_secs(3600)
        }
    }
}

/// Maps provider error codes to the fixed user-facing messages.
fn map_provider_error(code: &str) -> String {
    match code {
        "EMAIL_EXISTS" => "This email exists already!",
        "EMAIL_NOT_FOUND" => "This email could not be found!",
        "INVALID_PASSWORD" => "This password is not valid!",
        _ => GENERIC_AUTH_ERROR,
    }
    .to_string()
}
