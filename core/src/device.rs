//! Device capability providers.
//!
//! GPS and camera are external collaborators: each either returns a value
//! or fails with permission-denied / unavailable. The orchestrator falls
//! back to [`FALLBACK_FIX`] when no fix can be obtained.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use cleanspot_protocol::GpsFix;

/// Coordinate used when the location permission is denied.
pub const FALLBACK_FIX: GpsFix = GpsFix {
    latitude: 45.923246,
    longitude: 13.593676,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("cancelled")]
    Cancelled,

    #[error("device unavailable: {0}")]
    Unavailable(String),
}

/// Source of GPS fixes.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_fix(&self) -> Result<GpsFix, DeviceError>;
}

/// Source of camera captures; a capture yields a local file path.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn capture(&self) -> Result<PathBuf, DeviceError>;
}
