use std::rc::Rc;
use std::time::Duration;

use crate::bus::{ChangeBus, SubscriptionId, Topic};
use crate::config::AppConfig;
use crate::error::Result;
use crate::project::{FileStorage, ProjectStore, StorageAdapter};
use crate::services::{AssistantBackend, CannedAssistant, Publisher, SimulatedPublisher};
use crate::surfaces::xr::XrCapabilities;
use crate::surfaces::{
    mount, AssistantSurface, DeploySurface, EditorSurface, PreviewSurface, XrMirrorSurface,
};

/// Built once at startup and passed by reference. The store inside holds
/// the only handle to the live project pointer.
pub struct AppContext {
    pub config: AppConfig,
    pub bus: Rc<ChangeBus>,
    pub store: Rc<ProjectStore>,
}

/// Everything the core talks to but does not implement.
pub struct Collaborators {
    pub storage: Box<dyn StorageAdapter>,
    pub assistant: Rc<dyn AssistantBackend>,
    pub publisher: Rc<dyn Publisher>,
}

impl Collaborators {
    /// File-backed storage plus the simulated assistant and publisher.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let storage = FileStorage::new(config.storage_dir()?);
        tracing::debug!(dir = %storage.dir().display(), "using file storage");
        Ok(Self {
            storage: Box::new(storage),
            assistant: Rc::new(CannedAssistant::new(Duration::from_millis(
                config.assistant.delay_ms,
            ))),
            publisher: Rc::new(SimulatedPublisher::new(&config.deploy)),
        })
    }
}

pub struct App {
    pub context: AppContext,
    pub xr: Rc<XrMirrorSurface>,
    pub editor: Rc<EditorSurface>,
    pub assistant: Rc<AssistantSurface>,
    pub preview: Rc<PreviewSurface>,
    pub deploy: Rc<DeploySurface>,
    subscriptions: Vec<SubscriptionId>,
}

impl App {
    /// Checks for XR support, opens the store and mounts every surface.
    /// Without XR support nothing is opened or mounted.
    pub fn bootstrap(config: AppConfig, collaborators: Collaborators) -> Result<Self> {
        let capabilities = XrCapabilities::detect(&config.xr);
        capabilities.ensure_supported()?;
        tracing::debug!(device = ?capabilities.device, "XR environment ok");

        let bus = Rc::new(ChangeBus::new());
        let store = Rc::new(ProjectStore::open(collaborators.storage, bus.clone()));

        let xr = XrMirrorSurface::new(capabilities);
        let editor = EditorSurface::new(store.clone());
        let assistant = AssistantSurface::new(store.clone(), collaborators.assistant);
        let preview = PreviewSurface::new(store.clone());
        let deploy = DeploySurface::new(store.clone(), collaborators.publisher);

        let mut subscriptions = Vec::new();
        subscriptions.extend(mount(&bus, &store, &xr));
        subscriptions.extend(mount(&bus, &store, &editor));
        subscriptions.extend(mount(&bus, &store, &assistant));
        subscriptions.extend(mount(&bus, &store, &preview));
        subscriptions.extend(mount(&bus, &store, &deploy));
        tracing::info!(
            document_changed = bus.subscriber_count(Topic::DocumentChanged),
            project_changed = bus.subscriber_count(Topic::ProjectChanged),
            "surfaces mounted"
        );

        Ok(Self {
            context: AppContext { config, bus, store },
            xr,
            editor,
            assistant,
            preview,
            deploy,
            subscriptions,
        })
    }

    pub fn with_defaults(config: AppConfig) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config)?;
        Self::bootstrap(config, collaborators)
    }

    pub fn store(&self) -> &Rc<ProjectStore> {
        &self.context.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.context.config
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.context.bus.unsubscribe(id);
        }
    }
}
