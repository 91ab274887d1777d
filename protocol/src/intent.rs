//! Intents dispatched by the UI layer into the orchestration core.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::models::LocationRecord;

/// Whether an authenticate intent creates an account or signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    SignUp,
    SignIn,
}

/// Where a "before" photo for staging comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// A local file the UI already holds.
    File(PathBuf),
    /// Ask the camera capability provider for a capture.
    Camera,
}

/// One UI intent, routed to exactly one watcher in the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Resolve a GPS fix and reload the full location collection.
    FetchLocations,
    /// Create a location, optionally uploading a "before" photo first.
    AddLocation {
        record: LocationRecord,
        photo: Option<PathBuf>,
    },
    /// Patch only the two text fields of an existing location.
    UpdateLocation {
        id: String,
        title: String,
        description: String,
    },
    /// Set `assigned_to`; an empty `user_id` unassigns.
    AssignLocation {
        record: LocationRecord,
        user_id: String,
    },
    /// Upload the "after" photo, then close the record.
    MarkLocationAsDone {
        record: LocationRecord,
        photo: PathBuf,
    },
    /// Delete a location document and its attached photos.
    DeleteLocation { id: String },
    /// Stage a "before" photo for a draft not yet created.
    UploadLocationPhoto {
        source: PhotoSource,
        user_id: String,
    },
    /// Drop the currently staged "before" photo.
    DeleteLocationPhoto { path: String },
    /// Flip the contextual action sheet for the viewed record.
    ToggleModal,
}

/// Intent kinds, used for per-kind supersede-latest bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    FetchLocations,
    AddLocation,
    UpdateLocation,
    AssignLocation,
    MarkLocationAsDone,
    DeleteLocation,
    UploadLocationPhoto,
    DeleteLocationPhoto,
    ToggleModal,
}

impl IntentKind {
    pub const COUNT: usize = 9;

    pub fn index(self) -> usize {
        match self {
            IntentKind::FetchLocations => 0,
            IntentKind::AddLocation => 1,
            IntentKind::UpdateLocation => 2,
            IntentKind::AssignLocation => 3,
            IntentKind::MarkLocationAsDone => 4,
            IntentKind::DeleteLocation => 5,
            IntentKind::UploadLocationPhoto => 6,
            IntentKind::DeleteLocationPhoto => 7,
            IntentKind::ToggleModal => 8,
        }
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::FetchLocations => IntentKind::FetchLocations,
            Intent::AddLocation { .. } => IntentKind::AddLocation,
            Intent::UpdateLocation { .. } => IntentKind::UpdateLocation,
            Intent::AssignLocation { .. } => IntentKind::AssignLocation,
            Intent::MarkLocationAsDone { .. } => IntentKind::MarkLocationAsDone,
            Intent::DeleteLocation { .. } => IntentKind::DeleteLocation,
            Intent::UploadLocationPhoto { .. } => IntentKind::UploadLocationPhoto,
            Intent::DeleteLocationPhoto { .. } => IntentKind::DeleteLocationPhoto,
            Intent::ToggleModal => IntentKind::ToggleModal,
        }
    }
}
