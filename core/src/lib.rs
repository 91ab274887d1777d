//! Asynchronous orchestration core for the cleanspot client.
//!
//! Users report locations needing attention, claim them, attach
//! before/after photographs, and mark them resolved. This crate owns
//! every multi-step, failure-prone interaction with the external
//! services behind that flow: the authentication provider, the document
//! store, the object storage, and the push endpoint. The UI dispatches
//! [`cleanspot_protocol::Intent`]s and renders from the observable
//! [`Store`]; everything in between happens here.

mod assets;
mod auth;
mod config;
mod device;
mod gateway;
mod notify;
mod storage;
mod store;
mod workflows;

pub use assets::AssetError;
pub use assets::AssetStore;
pub use auth::AuthManager;
pub use config::Config;
pub use device::CameraProvider;
pub use device::DeviceError;
pub use device::FALLBACK_FIX;
pub use device::LocationProvider;
pub use gateway::Gateway;
pub use gateway::GatewayError;
pub use gateway::GatewayResponse;
pub use gateway::OutboundRequest;
pub use notify::Notifier;
pub use storage::PersistedSession;
pub use storage::SessionStorage;
pub use storage::StorageError;
pub use store::Store;
pub use workflows::Orchestrator;
