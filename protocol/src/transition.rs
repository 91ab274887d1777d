//! Typed state transitions and the pure reducer.
//!
//! Transitions are the only way the state tree changes. The reducer
//! performs no side effects; all side effects live in the orchestrators
//! that emit the transitions.

use chrono::DateTime;
use chrono::Utc;

use crate::models::GpsFix;
use crate::models::LocationRecord;
use crate::models::Session;
use crate::state::AppState;
use crate::state::ErrorSlot;
use crate::state::Route;

/// One state transition emitted by the credential manager or the
/// workflow orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    // Auth slice.
    AuthStarted,
    AuthSucceeded {
        user_id: String,
        id_token: String,
        refresh_token: Option<String>,
        username: String,
        expiry_instant: Option<DateTime<Utc>>,
    },
    AuthFailed {
        message: String,
    },
    AutoLoginAttempted,
    LoggedOut,

    // Locations slice.
    WorkflowStarted(ErrorSlot),
    WorkflowFailed {
        slot: ErrorSlot,
        message: String,
    },
    GpsFixResolved(GpsFix),
    LocationsLoaded(Vec<LocationRecord>),
    /// Optimistic reflection of an assignment, ahead of the re-fetch.
    Assigned {
        id: String,
        user_id: String,
    },
    /// Optimistic reflection of a completed record, ahead of the re-fetch.
    CompletedLocally {
        id: String,
        picture_after: String,
    },
    PhotoStaged {
        url: String,
    },
    PhotoUnstaged,

    // UI slice.
    ModalToggled,
    ModalClosed,
    NavigatedTo(Route),
}

/// Folds one transition into the state tree.
///
/// Pure: `old state + transition -> new state`. The owning store replaces
/// the whole tree atomically, so readers never observe a state mixing
/// fields from two transitions.
pub fn reduce(state: &AppState, transition: &Transition) -> AppState {
    let mut next = state.clone();

    match transition {
        Transition::AuthStarted => {
            next.auth.is_loading = true;
            next.auth.last_error = None;
        }
        Transition::AuthSucceeded {
            user_id,
            id_token,
            refresh_token,
            username,
            expiry_instant,
        } => {
            next.auth = Session {
                user_id: user_id.clone(),
                id_token: id_token.clone(),
                refresh_token: refresh_token.clone(),
                username: username.clone(),
                expiry_instant: *expiry_instant,
                is_loading: false,
                last_error: None,
                did_attempt_auto_login: true,
            };
        }
        Transition::AuthFailed { message } => {
            next.auth = Session {
                last_error: Some(message.clone()),
                did_attempt_auto_login: true,
                ..Session::default()
            };
        }
        Transition::AutoLoginAttempted => {
            next.auth.did_attempt_auto_login = true;
        }
        Transition::LoggedOut => {
            next.auth = Session::default();
        }

        Transition::WorkflowStarted(slot) => {
            next.locations.errors.set(*slot, None);
            if *slot == ErrorSlot::Fetch {
                next.locations.is_loading = true;
            }
        }
        Transition::WorkflowFailed { slot, message } => {
            next.locations.errors.set(*slot, Some(message.clone()));
            if *slot == ErrorSlot::Fetch {
                next.locations.is_loading = false;
            }
        }
        Transition::GpsFixResolved(fix) => {
            next.locations.current_fix = Some(*fix);
        }
        Transition::LocationsLoaded(items) => {
            next.locations.items = items.clone();
            next.locations.is_loading = false;
            next.locations.errors.set(ErrorSlot::Fetch, None);
        }
        Transition::Assigned { id, user_id } => {
            if let Some(item) = next.locations.items.iter_mut().find(|i| i.id == *id) {
                item.assigned_to = user_id.clone();
            }
        }
        Transition::CompletedLocally { id, picture_after } => {
            if let Some(item) = next.locations.items.iter_mut().find(|i| i.id == *id) {
                item.is_open = false;
                item.assigned_to = String::new();
                item.picture_after = Some(picture_after.clone());
            }
        }
        Transition::PhotoStaged { url } => {
            next.locations.pending_upload_url = Some(url.clone());
        }
        Transition::PhotoUnstaged => {
            next.locations.pending_upload_url = None;
        }

        Transition::ModalToggled => {
            next.ui.modal_open = !next.ui.modal_open;
        }
        Transition::ModalClosed => {
            next.ui.modal_open = false;
        }
        Transition::NavigatedTo(route) => {
            next.ui.route = Some(route.clone());
        }
    }

    next
}
