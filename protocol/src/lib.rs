//! Wire and state types shared between the orchestration core and its
//! consumers.
//!
//! This crate is deliberately free of I/O: it defines the data model
//! ([`Session`], [`LocationRecord`]), the intents a UI may dispatch
//! ([`Intent`]), the transitions the core emits ([`Transition`]), and the
//! pure reducer ([`reduce`]) that folds transitions into the observable
//! state tree ([`AppState`]).

mod intent;
mod models;
mod state;
mod transition;

pub use intent::AuthMode;
pub use intent::Intent;
pub use intent::IntentKind;
pub use intent::PhotoSource;
pub use models::Credentials;
pub use models::GpsFix;
pub use models::LocationRecord;
pub use models::Session;
pub use state::AppState;
pub use state::ErrorSlot;
pub use state::LocationsSlice;
pub use state::Route;
pub use state::UiSlice;
pub use state::WorkflowErrors;
pub use transition::Transition;
pub use transition::reduce;
