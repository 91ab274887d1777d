//! Core data model: the session and the location record.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Credentials submitted by the UI for sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Display name, only used for sign-up.
    pub username: String,
}

/// The single per-process authentication session.
///
/// Owned and mutated exclusively by the credential lifecycle manager via
/// auth transitions; everything else only reads it. The anonymous state is
/// `Session::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
    pub username: String,
    pub expiry_instant: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub did_attempt_auto_login: bool,
}

impl Session {
    /// True when the session carries a usable token.
    pub fn is_authenticated(&self) -> bool {
        !self.id_token.is_empty() && !self.user_id.is_empty()
    }
}

/// A device GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// One reported location.
///
/// `id` is the document-store key and is not part of the stored payload,
/// so it is skipped during (de)serialization and filled in from the map
/// key when the collection is flattened. Unknown fields in stored
/// documents are ignored.
///
/// Invariants: a non-empty `assigned_to` implies `is_open`; marking a
/// record done clears `assigned_to`, sets `is_open = false` and attaches
/// `picture_after` in one mutation; `is_open == false` is terminal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(skip)]
    pub id: String,
    pub created_by: String,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub is_open: bool,
    /// Empty string means unassigned.
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_token: Option<String>,
}

impl LocationRecord {
    /// True once the record has been marked done; no further assignment
    /// or photo mutation is valid.
    pub fn is_terminal(&self) -> bool {
        !self.is_open
    }
}
