//! Hierarchical state machine and lifecycle manager for a single Soft Access
//! Point instance.
//!
//! This crate owns the business logic for one SoftAP's `Idle`/`Running`
//! lifecycle:
//!
//! - **[`SoftApLifecycle`]** — public façade. `new()` spawns the dispatcher
//!   task and enqueues the initial `Start`; `stop()` /
//!   `update_capability()` / `update_configuration()` post further events;
//!   `interface_name()` / `current_state_name()` read back lock-free
//!   snapshots published by the running state machine.
//!
//! - **`state::StateMachine`** — the hierarchical state machine itself. Not
//!   exposed publicly; driven exclusively by the dispatcher, one event at a
//!   time, off an unbounded mailbox.
//!
//! - **[`admission::AdmissionPolicy`]** — the five ordered client-admission
//!   rules plus the re-evaluation procedure run after a capability/config
//!   change.
//!
//! - **[`registry::ClientRegistry`]** / **[`pending::PendingDisconnectQueue`]**
//!   — the per-instance client table and the forced-disconnect retry queue.
//!
//! - **[`collaborators`]** — the traits this crate consumes from the outside
//!   world (driver/HAL, channel planner, capability provider, config store,
//!   coexistence advisor, observers) and the [`collaborators::Collaborators`]
//!   bundle used to wire them at construction time.

pub mod admission;
pub mod capability;
pub mod collaborators;
pub mod config;
mod dispatcher;
pub mod error;
pub mod event;
mod lifecycle;
pub mod model;
pub mod pending;
pub mod registry;
mod state;
mod timers;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use admission::{Admission, AdmissionPolicy, RejectReason};
pub use capability::Capability;
pub use collaborators::{
    CapabilityProvider, ChannelPlanner, Collaborators, ConfigStore, CoexAdvisor, CoexListener,
    DisconnectReason, EventSink, IfaceCallback, NativeDriver, NullCoexListener, Observers, SoftApListener,
};
pub use config::{restart_required, ApConfiguration, SecurityMode};
pub use error::{ChannelPlanError, CoreError, StartSoftApError};
pub use event::{ApState, Event, FailureReason, Requestor};
pub use lifecycle::SoftApLifecycle;
pub use pending::PendingDisconnectQueue;
pub use registry::ClientRegistry;

// Re-export model types at the crate root for ergonomics.
pub use model::{Band, BandMask, Client, MacAddress, RadioInstanceId, RadioInstanceInfo, Role};
