// ── SoftApLifecycle façade ──
//
// the public operations an orchestrator drives. Owns the
// mailbox's send half and a `SharedState` handle so accessors can read
// current values lock-free from any thread while the dispatcher task is the
// only thing ever touching the `StateMachine` itself.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

use crate::capability::Capability;
use crate::collaborators::Collaborators;
use crate::config::ApConfiguration;
use crate::dispatcher::Dispatcher;
use crate::error::CoreError;
use crate::event::{Event, Requestor};
use crate::model::Role;
use crate::state::{SharedState, StateMachine};

pub struct SoftApLifecycle {
    id: String,
    role: Role,
    requestor: String,
    mailbox: mpsc::UnboundedSender<Event>,
    shared: Arc<SharedState>,
    dispatcher_handle: JoinHandle<()>,
}

impl SoftApLifecycle {
    /// Starts the machine with `Start(requestor)` already enqueued.
    pub fn new(
        id: impl Into<String>,
        config: ApConfiguration,
        capability: Capability,
        role: Role,
        requestor: impl Into<String>,
        collaborators: Collaborators,
    ) -> Self {
        let id = id.into();
        let requestor_str = requestor.into();
        let requestor = Requestor(requestor_str.clone());

        let shared = SharedState::new(config.clone(), capability);
        let (tx, rx) = mpsc::unbounded_channel();
        let state_machine = StateMachine::new(
            role,
            requestor.clone(),
            config,
            capability,
            tx.clone(),
            collaborators,
            Arc::clone(&shared),
        );
        let dispatcher_handle = Dispatcher::spawn(state_machine, rx);

        if tx.send(Event::Start(requestor)).is_err() {
            error!("failed to enqueue initial Start: dispatcher exited immediately");
        }

        Self { id, role, requestor: requestor_str, mailbox: tx, shared, dispatcher_handle }
    }

    pub fn stop(&self) -> Result<(), CoreError> {
        self.mailbox.send(Event::Stop).map_err(|_| CoreError::Terminated)
    }

    pub fn update_capability(&self, capability: Capability) -> Result<(), CoreError> {
        self.mailbox.send(Event::UpdateCapability(capability)).map_err(|_| CoreError::Terminated)
    }

    pub fn update_configuration(&self, config: ApConfiguration) -> Result<(), CoreError> {
        self.mailbox.send(Event::UpdateConfig(config)).map_err(|_| CoreError::Terminated)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn requestor(&self) -> &str {
        &self.requestor
    }

    pub fn interface_name(&self) -> Option<String> {
        self.shared.interface_name.load_full().map(|name| name.as_ref().clone())
    }

    pub fn current_state_name(&self) -> String {
        self.shared.state_name.load_full().as_ref().clone()
    }

    /// Debug sink.
    pub fn dump(&self, writer: &mut dyn std::fmt::Write) -> std::fmt::Result {
        writeln!(
            writer,
            "SoftApLifecycle {{ id: {}, role: {:?}, requestor: {}, state: {}, interface: {:?} }}",
            self.id,
            self.role,
            self.requestor,
            self.current_state_name(),
            self.interface_name(),
        )
    }
}

impl Drop for SoftApLifecycle {
    fn drop(&mut self) {
        self.dispatcher_handle.abort();
    }
}
