//! Shared fixtures for the integration suites.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use wiremock::MockServer;

use cleanspot_core::CameraProvider;
use cleanspot_core::Config;
use cleanspot_core::DeviceError;
use cleanspot_core::Gateway;
use cleanspot_core::LocationProvider;
use cleanspot_core::Orchestrator;
use cleanspot_core::Store;
use cleanspot_protocol::GpsFix;
use cleanspot_protocol::LocationRecord;
use cleanspot_protocol::Transition;

/// One mock server per external collaborator.
pub struct Servers {
    pub auth: MockServer,
    pub db: MockServer,
    pub assets: MockServer,
    pub push: MockServer,
}

pub async fn servers() -> Servers {
    Servers {
        auth: MockServer::start().await,
        db: MockServer::start().await,
        assets: MockServer::start().await,
        push: MockServer::start().await,
    }
}

pub fn config_for(servers: &Servers, data_dir: &TempDir) -> Config {
    Config {
        api_key: "K".to_string(),
        auth_base: servers.auth.uri(),
        token_base: servers.auth.uri(),
        db_base: servers.db.uri(),
        asset_base: servers.assets.uri(),
        push_base: servers.push.uri(),
        data_dir: data_dir.path().to_path_buf(),
    }
}

pub struct StaticFix(pub GpsFix);

#[async_trait]
impl LocationProvider for StaticFix {
    async fn current_fix(&self) -> Result<GpsFix, DeviceError> {
        Ok(self.0)
    }
}

pub struct DeniedFix;

#[async_trait]
impl LocationProvider for DeniedFix {
    async fn current_fix(&self) -> Result<GpsFix, DeviceError> {
        Err(DeviceError::PermissionDenied)
    }
}

pub struct StubCamera(pub PathBuf);

#[async_trait]
impl CameraProvider for StubCamera {
    async fn capture(&self) -> Result<PathBuf, DeviceError> {
        Ok(self.0.clone())
    }
}

pub struct CancelledCamera;

#[async_trait]
impl CameraProvider for CancelledCamera {
    async fn capture(&self) -> Result<PathBuf, DeviceError> {
        Err(DeviceError::Cancelled)
    }
}

pub fn orchestrator(
    store: &Arc<Store>,
    config: Config,
    locations: Arc<dyn LocationProvider>,
    camera: Arc<dyn CameraProvider>,
) -> Arc<Orchestrator> {
    Orchestrator::new(Arc::clone(store), Gateway::new(), config, locations, camera)
}

/// Puts an authenticated session with token `TOK` into the store, the
/// way the credential manager would.
pub fn seed_auth(store: &Store) {
    store.commit(&Transition::AuthSucceeded {
        user_id: "u1".to_string(),
        id_token: "TOK".to_string(),
        refresh_token: Some("RT".to_string()),
        username: "pat".to_string(),
        expiry_instant: None,
    });
}

pub fn open_record(id: &str) -> LocationRecord {
    LocationRecord {
        id: id.to_string(),
        created_by: "u1".to_string(),
        title: "River bank".to_string(),
        description: "plastic bottles".to_string(),
        latitude: 45.9,
        longitude: 13.5,
        is_open: true,
        assigned_to: String::new(),
        picture_before: None,
        picture_after: None,
        notification_token: None,
    }
}

/// The stored (payload-only) JSON shape of a record, as the document
/// store would return it under its key.
pub fn record_json(record: &LocationRecord) -> serde_json::Value {
    serde_json::to_value(record).unwrap()
}

pub fn write_photo(dir: &Path) -> PathBuf {
    let path = dir.join("photo.jpg");
    std::fs::write(&path, b"not really a jpeg").unwrap();
    path
}
