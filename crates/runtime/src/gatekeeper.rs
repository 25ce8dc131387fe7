//! Top-level gatekeeper and its builder.
//!
//! The gatekeeper owns the dispatch pipeline, the action registry and the
//! cache sweeper task. [`Gatekeeper::dispatcher`] hands out a shareable
//! pipeline for connection handlers.

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use interaction_core::{ActionManifest, ActorId, EntityId, GatekeeperConfig};

use crate::clock::{Clock, SystemClock};
use crate::error::{GatekeeperError, Result};
use crate::events::{EventBus, GatekeeperEvent};
use crate::oracle::OracleManager;
use crate::pipeline::{DispatchOutcome, Dispatcher, InteractionRequest};
use crate::registry::{ActionRegistry, LoadSummary, ModuleCandidate, ModuleCatalog};
use crate::workers::CacheSweeper;

/// Running interaction gatekeeper.
pub struct Gatekeeper {
    dispatcher: Arc<Dispatcher>,
    load_summary: LoadSummary,
    sweeper: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl Gatekeeper {
    pub fn builder() -> GatekeeperBuilder {
        GatekeeperBuilder::new()
    }

    /// Runs one request through the pipeline.
    pub async fn dispatch(&self, request: &InteractionRequest) -> DispatchOutcome {
        self.dispatcher.dispatch(request).await
    }

    /// Shareable handle to the pipeline.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        self.dispatcher.registry()
    }

    /// Result of the startup module load.
    pub fn load_summary(&self) -> &LoadSummary {
        &self.load_summary
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GatekeeperEvent> {
        self.dispatcher.events().subscribe()
    }

    /// Drops all per-actor state when an actor leaves.
    pub fn on_actor_departed(&self, actor: ActorId) {
        let had_cooldowns = self.dispatcher.throttle().forget_actor(actor);
        let cache_entries = self.dispatcher.cache().forget_owned_by(actor);
        debug!(
            target: "interaction::cache",
            %actor,
            had_cooldowns,
            cache_entries,
            "actor departed"
        );
    }

    /// Drops the cached attributes of a destroyed entity.
    pub fn on_entity_destroyed(&self, entity: EntityId) {
        self.dispatcher.cache().forget(entity);
    }

    /// Stops the sweeper and waits for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        if let Some((shutdown_tx, handle)) = self.sweeper {
            let _ = shutdown_tx.send(());
            handle.await.map_err(GatekeeperError::SweeperJoin)?;
        }
        info!(target: "interaction::dispatch", "gatekeeper stopped");
        Ok(())
    }
}

/// Builder for [`Gatekeeper`].
pub struct GatekeeperBuilder {
    config: GatekeeperConfig,
    oracles: Option<OracleManager>,
    clock: Option<Arc<dyn Clock>>,
    events: Option<EventBus>,
    candidates: Vec<ModuleCandidate>,
}

impl GatekeeperBuilder {
    fn new() -> Self {
        Self {
            config: GatekeeperConfig::default(),
            oracles: None,
            clock: None,
            events: None,
            candidates: Vec::new(),
        }
    }

    pub fn config(mut self, config: GatekeeperConfig) -> Self {
        self.config = config;
        self
    }

    /// Set required oracle manager
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Time source; defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Event bus to publish on. Subscribing before [`build`](Self::build)
    /// also captures the startup load summary.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Adds modules to load at build time.
    pub fn modules(mut self, candidates: impl IntoIterator<Item = ModuleCandidate>) -> Self {
        self.candidates.extend(candidates);
        self
    }

    /// Adds the modules a manifest selects from `catalog`.
    pub fn manifest(self, catalog: &ModuleCatalog, manifest: &ActionManifest) -> Self {
        self.modules(catalog.candidates(manifest))
    }

    /// Loads the modules and starts the sweeper (if enabled).
    ///
    /// Must be called from within a Tokio runtime when the sweeper is enabled.
    pub async fn build(self) -> Result<Gatekeeper> {
        let oracles = self.oracles.ok_or(GatekeeperError::MissingOracles)?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn Clock>);
        let config = self.config;

        let registry = Arc::new(ActionRegistry::new(config.default_cooldown()));
        let load_summary = registry.load_from(self.candidates);

        let events = self
            .events
            .unwrap_or_else(|| EventBus::new(config.event_buffer_size));
        events.publish(GatekeeperEvent::RegistryLoaded(load_summary.clone()));

        let sweeper_enabled = config.enable_sweeper;
        let dispatcher = Arc::new(Dispatcher::new(oracles, config, clock, registry, events));

        let sweeper = sweeper_enabled.then(|| {
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            let worker = CacheSweeper::new(
                dispatcher.cache().clone(),
                dispatcher.config().sweep_interval(),
                dispatcher.config().sweep_max_age(),
                shutdown_rx,
            );
            let handle = tokio::spawn(async move {
                worker.run().await;
            });
            (shutdown_tx, handle)
        });

        info!(
            target: "interaction::dispatch",
            actions = dispatcher.registry().len(),
            sweeper = sweeper_enabled,
            "gatekeeper started"
        );

        Ok(Gatekeeper {
            dispatcher,
            load_summary,
            sweeper,
        })
    }
}
