//! Resource workflow orchestrator.
//!
//! Each intent kind has exactly one watcher with supersede-latest
//! semantics: dispatching a new intent of a kind bumps that kind's
//! generation, and an in-flight instance checks its generation before
//! every commit. A superseded instance keeps running until its next
//! commit attempt fails the gate, at which point it returns without
//! touching shared state. Workflows of different kinds run concurrently.
//!
//! Every mutating workflow ends with a full collection re-read instead of
//! trusting its local optimistic copy.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;

use cleanspot_protocol::ErrorSlot;
use cleanspot_protocol::Intent;
use cleanspot_protocol::IntentKind;
use cleanspot_protocol::LocationRecord;
use cleanspot_protocol::PhotoSource;
use cleanspot_protocol::Route;
use cleanspot_protocol::Transition;

use crate::assets::AssetError;
use crate::assets::AssetStore;
use crate::config::Config;
use crate::device::CameraProvider;
use crate::device::FALLBACK_FIX;
use crate::device::DeviceError;
use crate::device::LocationProvider;
use crate::gateway::Gateway;
use crate::gateway::GatewayError;
use crate::gateway::GatewayResponse;
use crate::gateway::OutboundRequest;
use crate::notify::Notifier;
use crate::store::Store;

/// Uploaded photos all carry the same filename; the asset store prefixes
/// owner and timestamp.
const MEDIA_FILENAME: &str = "media.jpg";

#[derive(Debug, Error)]
enum WorkflowError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("A {status} error occurred")]
    Status { status: u16 },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("could not read photo: {0}")]
    Io(#[from] std::io::Error),
}

fn ensure_success(response: GatewayResponse) -> Result<GatewayResponse, WorkflowError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(WorkflowError::Status {
            status: response.status.as_u16(),
        })
    }
}

/// Document-store create response: only the new id comes back.
#[derive(Debug, Deserialize)]
struct CreateResponse {
    name: String,
}

/// Per-kind generation counters backing supersede-latest.
#[derive(Debug)]
struct Generations([AtomicU64; IntentKind::COUNT]);

impl Default for Generations {
    fn default() -> Self {
        Self(std::array::from_fn(|_| AtomicU64::new(0)))
    }
}

impl Generations {
    fn next(&self, kind: IntentKind) -> u64 {
        self.0[kind.index()].fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current(&self, kind: IntentKind) -> u64 {
        self.0[kind.index()].load(Ordering::SeqCst)
    }
}

/// The claim one workflow instance holds on its intent kind.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    kind: IntentKind,
    generation: u64,
}

pub struct Orchestrator {
    store: Arc<Store>,
    gateway: Gateway,
    assets: AssetStore,
    notifier: Notifier,
    location_provider: Arc<dyn LocationProvider>,
    camera: Arc<dyn CameraProvider>,
    config: Config,
    generations: Generations,
}

impl Orchestrator {
    pub fn new(
        store: Arc<Store>,
        gateway: Gateway,
        config: Config,
        location_provider: Arc<dyn LocationProvider>,
        camera: Arc<dyn CameraProvider>,
    ) -> Arc<Self> {
        let assets = AssetStore::new(gateway.clone(), config.asset_base.clone());
        let notifier = Notifier::new(gateway.clone(), config.push_url());
        Arc::new(Self {
            store,
            gateway,
            assets,
            notifier,
            location_provider,
            camera,
            config,
            generations: Generations::default(),
        })
    }

    /// Routes one intent to its watcher, superseding any running
    /// instance of the same kind.
    pub fn dispatch(self: &Arc<Self>, intent: Intent) -> JoinHandle<()> {
        let ticket = Ticket {
            kind: intent.kind(),
            generation: self.generations.next(intent.kind()),
        };
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(intent, ticket).await;
        })
    }

    async fn run(&self, intent: Intent, ticket: Ticket) {
        match intent {
            Intent::FetchLocations => self.run_fetch(ticket).await,
            Intent::AddLocation { record, photo } => self.run_add(ticket, record, photo).await,
            Intent::UpdateLocation {
                id,
                title,
                description,
            } => self.run_update(ticket, id, title, description).await,
            Intent::AssignLocation { record, user_id } => {
                self.run_assign(ticket, record, user_id).await;
            }
            Intent::MarkLocationAsDone { record, photo } => {
                self.run_done(ticket, record, photo).await;
            }
            Intent::DeleteLocation { id } => self.run_delete(ticket, id).await,
            Intent::UploadLocationPhoto { source, user_id } => {
                self.run_upload_photo(ticket, source, user_id).await;
            }
            Intent::DeleteLocationPhoto { path } => self.run_delete_photo(ticket, path).await,
            Intent::ToggleModal => {
                self.commit(ticket, Transition::ModalToggled);
            }
        }
    }

    /// Commits a transition if this instance still holds the latest
    /// generation for its kind. A `false` return means the instance has
    /// been superseded and must stop.
    fn commit(&self, ticket: Ticket, transition: Transition) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("dropping stale commit from superseded {:?} workflow", ticket.kind);
            return false;
        }
        self.store.commit(&transition);
        true
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.generations.current(ticket.kind) == ticket.generation
    }

    fn fail(&self, ticket: Ticket, slot: ErrorSlot, error: &WorkflowError) {
        self.commit(
            ticket,
            Transition::WorkflowFailed {
                slot,
                message: error.to_string(),
            },
        );
    }

    fn token(&self) -> String {
        self.store.state().auth.id_token
    }

    // --- fetch ---

    async fn run_fetch(&self, ticket: Ticket) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Fetch)) {
            return;
        }

        let fix = match self.location_provider.current_fix().await {
            Ok(fix) => fix,
            Err(e) => {
                tracing::warn!("no GPS fix ({e}), using fallback coordinate");
                FALLBACK_FIX
            }
        };
        if !self.commit(ticket, Transition::GpsFixResolved(fix)) {
            return;
        }

        match self.load_collection().await {
            Ok(items) => {
                self.commit(ticket, Transition::LocationsLoaded(items));
            }
            Err(e) => self.fail(ticket, ErrorSlot::Fetch, &e),
        }
    }

    /// Reads the full collection and flattens the id→record map into a
    /// list, with each record's `id` taken from its key. An empty
    /// collection comes back as JSON null.
    async fn load_collection(&self) -> Result<Vec<LocationRecord>, WorkflowError> {
        let response = self
            .gateway
            .send(OutboundRequest::get(self.config.locations_url()))
            .await?;
        let response = ensure_success(response)?;

        let map: Option<serde_json::Map<String, serde_json::Value>> = response.json()?;
        let mut items = Vec::new();
        for (key, value) in map.unwrap_or_default() {
            match serde_json::from_value::<LocationRecord>(value) {
                Ok(mut record) => {
                    record.id = key;
                    items.push(record);
                }
                Err(e) => {
                    tracing::warn!("skipping malformed location {key}: {e}");
                }
            }
        }
        Ok(items)
    }

    /// Re-read for consistency after a mutation. Runs under a freshly
    /// bumped fetch generation, so it supersedes any older in-flight
    /// fetch and a later fetch supersedes it.
    async fn refetch(&self) {
        let ticket = Ticket {
            kind: IntentKind::FetchLocations,
            generation: self.generations.next(IntentKind::FetchLocations),
        };
        self.run_fetch(ticket).await;
    }

    // --- create ---

    async fn run_add(&self, ticket: Ticket, mut record: LocationRecord, photo: Option<PathBuf>) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Create)) {
            return;
        }

        // The "before" photo must be durable before the document that
        // will reference it is created.
        let staged = self.store.state().locations.pending_upload_url;
        record.picture_before = match photo {
            Some(path) => match self.upload_photo(&path, &record.created_by).await {
                Ok(url) => Some(url),
                Err(e) => {
                    self.fail(ticket, ErrorSlot::Photo, &e);
                    return;
                }
            },
            None => staged,
        };

        let created = match self.create_document(&record).await {
            Ok(created) => created,
            Err(e) => {
                self.fail(ticket, ErrorSlot::Create, &e);
                return;
            }
        };

        // The staged photo, if any, is attached now.
        if !self.commit(ticket, Transition::PhotoUnstaged) {
            return;
        }

        self.refetch().await;
        if !self.is_current(ticket) {
            return;
        }

        if record.assigned_to.is_empty() {
            self.commit(ticket, Transition::NavigatedTo(Route::List));
            return;
        }

        // The create response carries only the id; the detail view needs
        // the full document, so re-read it.
        match self.load_document(&created.name).await {
            Ok(_) => {
                self.commit(ticket, Transition::NavigatedTo(Route::Detail(created.name)));
            }
            Err(e) => self.fail(ticket, ErrorSlot::Create, &e),
        }
    }

    async fn create_document(&self, record: &LocationRecord) -> Result<CreateResponse, WorkflowError> {
        let url = self.config.locations_url_authed(&self.token());
        let body = serde_json::to_value(record).map_err(GatewayError::from)?;
        let response = self.gateway.send(OutboundRequest::post_json(url, body)).await?;
        Ok(ensure_success(response)?.json()?)
    }

    async fn load_document(&self, id: &str) -> Result<LocationRecord, WorkflowError> {
        let response = self
            .gateway
            .send(OutboundRequest::get(self.config.location_url(id)))
            .await?;
        let mut record: LocationRecord = ensure_success(response)?.json()?;
        record.id = id.to_string();
        Ok(record)
    }

    // --- update ---

    async fn run_update(&self, ticket: Ticket, id: String, title: String, description: String) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Update)) {
            return;
        }

        let url = self.config.location_url_authed(&id, &self.token());
        let body = json!({ "title": title, "description": description });
        let result = self
            .gateway
            .send(OutboundRequest::patch_json(url, body))
            .await
            .map_err(WorkflowError::from)
            .and_then(ensure_success);

        if let Err(e) = result {
            // Surfaced without navigating anywhere.
            self.fail(ticket, ErrorSlot::Update, &e);
            return;
        }

        self.refetch().await;
        if !self.is_current(ticket) {
            return;
        }
        self.commit(ticket, Transition::NavigatedTo(Route::Back));
    }

    // --- assign ---

    async fn run_assign(&self, ticket: Ticket, record: LocationRecord, user_id: String) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Assign)) {
            return;
        }

        if record.is_terminal() {
            self.commit(
                ticket,
                Transition::WorkflowFailed {
                    slot: ErrorSlot::Assign,
                    message: "location is already closed".to_string(),
                },
            );
            return;
        }

        let url = self.config.location_url_authed(&record.id, &self.token());
        let body = json!({ "assignedTo": user_id });
        let result = self
            .gateway
            .send(OutboundRequest::patch_json(url, body))
            .await
            .map_err(WorkflowError::from)
            .and_then(ensure_success);

        if let Err(e) = result {
            self.fail(ticket, ErrorSlot::Assign, &e);
            return;
        }

        // Optimistic reflection ahead of the re-fetch.
        if !self.commit(
            ticket,
            Transition::Assigned {
                id: record.id,
                user_id,
            },
        ) {
            return;
        }
        if !self.commit(ticket, Transition::ModalClosed) {
            return;
        }

        self.refetch().await;
    }

    // --- mark as done ---

    async fn run_done(&self, ticket: Ticket, record: LocationRecord, photo: PathBuf) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Complete)) {
            return;
        }

        if record.is_terminal() {
            self.commit(
                ticket,
                Transition::WorkflowFailed {
                    slot: ErrorSlot::Complete,
                    message: "location is already closed".to_string(),
                },
            );
            return;
        }

        // The "after" photo must be durable before the record is closed;
        // an upload failure leaves the document untouched.
        let picture_after = match self.upload_photo(&photo, &record.created_by).await {
            Ok(url) => url,
            Err(e) => {
                self.fail(ticket, ErrorSlot::Photo, &e);
                return;
            }
        };

        let url = self.config.location_url_authed(&record.id, &self.token());
        let body = json!({
            "isOpen": false,
            "assignedTo": "",
            "pictureAfter": picture_after,
        });
        let result = self
            .gateway
            .send(OutboundRequest::patch_json(url, body))
            .await
            .map_err(WorkflowError::from)
            .and_then(ensure_success);

        if let Err(e) = result {
            self.fail(ticket, ErrorSlot::Complete, &e);
            return;
        }

        if !self.commit(
            ticket,
            Transition::CompletedLocally {
                id: record.id.clone(),
                picture_after,
            },
        ) {
            return;
        }
        if !self.commit(ticket, Transition::ModalClosed) {
            return;
        }

        self.refetch().await;

        // Best effort; the workflow outcome is already settled.
        if let Some(token) = record.notification_token.as_deref()
            && !token.is_empty()
        {
            let body = format!(
                "Your location {} was marked as done by {}",
                record.title, record.created_by
            );
            self.notifier.send(token, "Location is done!", &body).await;
        }
    }

    // --- delete ---

    async fn run_delete(&self, ticket: Ticket, id: String) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Delete)) {
            return;
        }

        // Attached photos are looked up from the in-memory record and
        // removed best-effort before the document goes away.
        let record = self
            .store
            .state()
            .locations
            .items
            .into_iter()
            .find(|item| item.id == id);
        if let Some(record) = record {
            let urls = [record.picture_before, record.picture_after];
            for url in urls.into_iter().flatten() {
                self.delete_asset_by_url(&url).await;
            }
        }

        let url = self.config.location_url_authed(&id, &self.token());
        let result = self
            .gateway
            .send(OutboundRequest::delete(url))
            .await
            .map_err(WorkflowError::from)
            .and_then(ensure_success);

        if let Err(e) = result {
            self.fail(ticket, ErrorSlot::Delete, &e);
            return;
        }

        if !self.commit(ticket, Transition::ModalClosed) {
            return;
        }

        self.refetch().await;
        if !self.is_current(ticket) {
            return;
        }
        self.commit(ticket, Transition::NavigatedTo(Route::List));
    }

    async fn delete_asset_by_url(&self, public_url: &str) {
        match self.assets.object_path(public_url) {
            Ok(path) => {
                if let Err(e) = self.assets.delete(&path).await {
                    tracing::warn!("could not delete asset {path}: {e}");
                }
            }
            Err(e) => {
                tracing::warn!("could not resolve asset path from {public_url}: {e}");
            }
        }
    }

    // --- photo staging ---

    async fn run_upload_photo(&self, ticket: Ticket, source: PhotoSource, user_id: String) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Photo)) {
            return;
        }

        // At most one staged, unattached photo exists at a time. The slice
        // is cleared as soon as the old asset is gone, so a failed capture
        // or upload below cannot leave a URL pointing at a deleted object.
        if let Some(previous) = self.store.state().locations.pending_upload_url {
            self.delete_asset_by_url(&previous).await;
            if !self.commit(ticket, Transition::PhotoUnstaged) {
                return;
            }
        }

        let path = match source {
            PhotoSource::File(path) => path,
            PhotoSource::Camera => match self.camera.capture().await {
                Ok(path) => path,
                Err(e) => {
                    self.fail(ticket, ErrorSlot::Photo, &WorkflowError::from(e));
                    return;
                }
            },
        };

        match self.upload_photo(&path, &user_id).await {
            Ok(url) => {
                self.commit(ticket, Transition::PhotoStaged { url });
            }
            Err(e) => self.fail(ticket, ErrorSlot::Photo, &e),
        }
    }

    async fn run_delete_photo(&self, ticket: Ticket, path: String) {
        if !self.commit(ticket, Transition::WorkflowStarted(ErrorSlot::Photo)) {
            return;
        }

        let object_path = if path.contains("://") {
            match self.assets.object_path(&path) {
                Ok(object_path) => object_path,
                Err(e) => {
                    self.fail(ticket, ErrorSlot::Photo, &WorkflowError::from(e));
                    return;
                }
            }
        } else {
            path
        };

        match self.assets.delete(&object_path).await {
            Ok(()) => {
                self.commit(ticket, Transition::PhotoUnstaged);
            }
            Err(e) => self.fail(ticket, ErrorSlot::Photo, &WorkflowError::from(e)),
        }
    }

    async fn upload_photo(&self, path: &Path, owner_id: &str) -> Result<String, WorkflowError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(self.assets.upload(bytes, owner_id, MEDIA_FILENAME).await?)
    }
}
