//! Server-side gatekeeper for client interaction requests.
//!
//! Clients ask to perform a named action on a world entity; this crate decides
//! whether the request is honoured and, if so, runs the registered handler.
//! Requests never fail with an error: each ends as a [`DispatchOutcome`].
//!
//! Modules are organized by responsibility:
//! - [`gatekeeper`] hosts the top-level owner and its builder
//! - [`pipeline`] runs the ordered gates for one request
//! - [`cache`], [`resolver`], [`permission`] and [`cooldown`] are the gates'
//!   building blocks
//! - [`registry`] stores action handlers and loads modules at startup
//! - [`events`] publishes security and dispatch observations
//! - [`oracle`] abstracts the world simulation, with in-memory versions
//! - [`workers`] keeps background tasks internal to the crate
pub mod cache;
pub mod clock;
pub mod cooldown;
pub mod error;
pub mod events;
pub mod gatekeeper;
pub mod oracle;
pub mod permission;
pub mod pipeline;
pub mod registry;
pub mod resolver;

mod workers;

pub use cache::AttributeCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::CooldownThrottle;
pub use error::{GatekeeperError, Result};
pub use events::{DispatchRecord, EventBus, GatekeeperEvent, SecurityEvent, SecurityKind};
pub use gatekeeper::{Gatekeeper, GatekeeperBuilder};
pub use oracle::{
    InMemoryActors, InMemoryWorld, OracleManager, RankLookupError, RankOracle, StaticRanks,
};
pub use permission::{Denial, PermissionEvaluator};
pub use pipeline::{DispatchOutcome, Dispatcher, InteractionRequest, Rejection, Severity};
pub use registry::{
    ActionData, ActionHandler, ActionModule, ActionRecord, ActionRegistry, HandlerError,
    HandlerFailure, LoadError, LoadFailure, LoadSummary, ModuleCandidate, ModuleCatalog,
    ModuleFactory, ModuleOverrides, PermissionHook, RegistryError,
};
pub use resolver::RootResolver;
