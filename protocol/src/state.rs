//! The observable state tree and its slices.

use serde::Deserialize;
use serde::Serialize;

use crate::models::GpsFix;
use crate::models::LocationRecord;
use crate::models::Session;

/// Navigation signal a workflow leaves for the UI. Last writer wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// The location list.
    List,
    /// The detail view of one record.
    Detail(String),
    /// Return to the previous view.
    Back,
}

/// One error slot per workflow, so a failure in one workflow never
/// clobbers or hides the error of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSlot {
    Fetch,
    Create,
    Update,
    Assign,
    Complete,
    Delete,
    Photo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowErrors {
    pub fetch: Option<String>,
    pub create: Option<String>,
    pub update: Option<String>,
    pub assign: Option<String>,
    pub complete: Option<String>,
    pub delete: Option<String>,
    pub photo: Option<String>,
}

impl WorkflowErrors {
    pub fn get(&self, slot: ErrorSlot) -> Option<&str> {
        let value = match slot {
            ErrorSlot::Fetch => &self.fetch,
            ErrorSlot::Create => &self.create,
            ErrorSlot::Update => &self.update,
            ErrorSlot::Assign => &self.assign,
            ErrorSlot::Complete => &self.complete,
            ErrorSlot::Delete => &self.delete,
            ErrorSlot::Photo => &self.photo,
        };
        value.as_deref()
    }

    pub(crate) fn set(&mut self, slot: ErrorSlot, message: Option<String>) {
        let target = match slot {
            ErrorSlot::Fetch => &mut self.fetch,
            ErrorSlot::Create => &mut self.create,
            ErrorSlot::Update => &mut self.update,
            ErrorSlot::Assign => &mut self.assign,
            ErrorSlot::Complete => &mut self.complete,
            ErrorSlot::Delete => &mut self.delete,
            ErrorSlot::Photo => &mut self.photo,
        };
        *target = message;
    }
}

/// The locations slice: server-ordered items plus transient fetch state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationsSlice {
    pub items: Vec<LocationRecord>,
    pub current_fix: Option<GpsFix>,
    pub is_loading: bool,
    pub errors: WorkflowErrors,
    /// An uploaded "before" photo not yet attached to any record.
    pub pending_upload_url: Option<String>,
}

/// Transient UI slice: the contextual modal and the navigation signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSlice {
    pub modal_open: bool,
    pub route: Option<Route>,
}

/// The single state tree read by the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub auth: Session,
    pub locations: LocationsSlice,
    pub ui: UiSlice,
}
