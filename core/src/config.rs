//! Endpoint configuration.
//!
//! One plain struct constructed explicitly and passed down; every field
//! is public so tests can point individual bases at a mock server.

use std::path::PathBuf;

/// Production endpoint bases for the hosted providers.
const AUTH_BASE: &str = "https://identitytoolkit.googleapis.com";
const TOKEN_BASE: &str = "https://securetoken.googleapis.com";
const PUSH_BASE: &str = "https://exp.host/--/api/v2";

#[derive(Debug, Clone)]
pub struct Config {
    /// Provider API key appended to auth and refresh requests.
    pub api_key: String,
    /// Identity endpoint base (sign-up / sign-in).
    pub auth_base: String,
    /// Token refresh endpoint base.
    pub token_base: String,
    /// Document store base, e.g. `https://<project>.firebaseio.com`.
    pub db_base: String,
    /// Object storage base for photo assets.
    pub asset_base: String,
    /// Push notification endpoint base.
    pub push_base: String,
    /// Directory holding the persisted session.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn new(
        api_key: impl Into<String>,
        db_base: impl Into<String>,
        asset_base: impl Into<String>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            auth_base: AUTH_BASE.to_string(),
            token_base: TOKEN_BASE.to_string(),
            db_base: db_base.into(),
            asset_base: asset_base.into(),
            push_base: PUSH_BASE.to_string(),
            data_dir: data_dir.into(),
        }
    }

    pub fn sign_up_url(&self) -> String {
        format!(
            "{}/v1/accounts:signUp?key={}",
            self.auth_base, self.api_key
        )
    }

    pub fn sign_in_url(&self) -> String {
        format!(
            "{}/v1/accounts:signInWithPassword?key={}",
            self.auth_base, self.api_key
        )
    }

    pub fn refresh_url(&self) -> String {
        format!("{}/v1/token?key={}", self.token_base, self.api_key)
    }

    /// The whole collection, without auth (reads are public).
    pub fn locations_url(&self) -> String {
        format!("{}/locations.json", self.db_base)
    }

    /// The whole collection, authenticated (mutations).
    pub fn locations_url_authed(&self, token: &str) -> String {
        format!("{}/locations.json?auth={token}", self.db_base)
    }

    pub fn location_url(&self, id: &str) -> String {
        format!("{}/locations/{id}.json", self.db_base)
    }

    pub fn location_url_authed(&self, id: &str, token: &str) -> String {
        format!("{}/locations/{id}.json?auth={token}", self.db_base)
    }

    pub fn push_url(&self) -> String {
        format!("{}/push/send", self.push_base)
    }
}
