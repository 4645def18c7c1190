// ── Mailbox event alphabet ──
//
// The dispatcher delivers these one at a time, in FIFO arrival order, to
// `StateMachine::dispatch`.

use std::fmt;

use crate::model::{Client, RadioInstanceInfo};

/// Opaque tag identifying who asked the AP to start. The core never interprets it — only threads it through to
/// `startSoftAp`'s interface-acquisition call and back out via accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requestor(pub String);

impl fmt::Display for Requestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Requestor {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start(Requestor),
    Stop,
    Failure,
    IfaceStatusChanged { up: bool },
    IfaceDestroyed,
    IfaceDown,
    ClientAssocChanged { client: Client, connected: bool },
    ApInfoChanged(RadioInstanceInfo),
    NoClientsTimeout,
    NoClientsTimeoutOneInstance,
    UpdateCapability(crate::capability::Capability),
    UpdateConfig(crate::config::ApConfiguration),
    ForceDisconnectPending,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Start(r) => write!(f, "Start({r})"),
            Event::Stop => write!(f, "Stop"),
            Event::Failure => write!(f, "Failure"),
            Event::IfaceStatusChanged { up } => write!(f, "IfaceStatusChanged({up})"),
            Event::IfaceDestroyed => write!(f, "IfaceDestroyed"),
            Event::IfaceDown => write!(f, "IfaceDown"),
            Event::ClientAssocChanged { client, connected } => {
                write!(f, "ClientAssocChanged({}, {connected})", client.mac)
            }
            Event::ApInfoChanged(info) => write!(f, "ApInfoChanged({})", info.instance_id),
            Event::NoClientsTimeout => write!(f, "NoClientsTimeout"),
            Event::NoClientsTimeoutOneInstance => write!(f, "NoClientsTimeoutOneInstance"),
            Event::UpdateCapability(_) => write!(f, "UpdateCapability"),
            Event::UpdateConfig(_) => write!(f, "UpdateConfig"),
            Event::ForceDisconnectPending => write!(f, "ForceDisconnectPending"),
        }
    }
}

/// Published AP lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
    Failed(FailureReason),
}

impl fmt::Display for ApState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApState::Disabled => write!(f, "Disabled"),
            ApState::Enabling => write!(f, "Enabling"),
            ApState::Enabled => write!(f, "Enabled"),
            ApState::Disabling => write!(f, "Disabling"),
            ApState::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    General,
    NoChannel,
    UnsupportedConfiguration,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::General => write!(f, "General"),
            FailureReason::NoChannel => write!(f, "NoChannel"),
            FailureReason::UnsupportedConfiguration => write!(f, "UnsupportedConfiguration"),
        }
    }
}
