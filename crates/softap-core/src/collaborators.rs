// ── External collaborators ──
//
// the driver/HAL, the persisted default-config store, the
// capability/coexistence advisor, and the observer surface are all treated
// as external collaborators. Each gets exactly the trait the core consumes
// — no more. Implementations live outside this crate (see `softap-config`
// and `softap-cli`'s `testing`/fakes for examples).

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::capability::Capability;
use crate::config::ApConfiguration;
use crate::error::ChannelPlanError;
use crate::event::Event;
use crate::model::{Band, BandMask, Client, MacAddress, RadioInstanceId, RadioInstanceInfo};

/// Reason a forced disconnect was issued — shared between `AdmissionPolicy`
/// rejections and `PendingDisconnectQueue` retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    BlockedByUser,
    NoMoreStas,
}

/// The three interface lifecycle callbacks (`on_destroyed`, `on_up`,
/// `on_down`). Handed to `NativeDriver::setup_interface` so the driver can
/// report asynchronously, potentially from a thread other than the
/// dispatcher's. `EventSink` is the only implementation this crate provides.
pub trait IfaceCallback: Send + Sync {
    fn on_destroyed(&self, iface: &str);
    fn on_up(&self, iface: &str);
    fn on_down(&self, iface: &str);
}

/// The three SoftAP listener callbacks (`on_failure`, `on_info_changed`,
/// `on_connected_clients_changed`). Handed to `NativeDriver::start_soft_ap`
/// alongside the interface callback.
pub trait SoftApListener: Send + Sync {
    fn on_failure(&self);
    fn on_info_changed(&self, info: RadioInstanceInfo);
    fn on_connected_clients_changed(&self, client: Client, connected: bool);
}

/// Marshals driver-originated callbacks onto the dispatcher's mailbox.
/// A clone of the mailbox `Sender` is `Send + Sync`, so this
/// is the one type in the crate that's safe to hand to a driver thread that
/// isn't the dispatcher itself — every method here just wraps its
/// arguments in the matching `Event` and posts it, never touching
/// `StateMachine` state directly.
#[derive(Clone)]
pub struct EventSink {
    mailbox: mpsc::UnboundedSender<Event>,
}

impl EventSink {
    pub fn new(mailbox: mpsc::UnboundedSender<Event>) -> Self {
        Self { mailbox }
    }

    fn post(&self, event: Event) {
        // The mailbox only closes once the lifecycle has quit; a late
        // callback racing the terminal quit is expected, not an error.
        let _ = self.mailbox.send(event);
    }
}

impl IfaceCallback for EventSink {
    fn on_destroyed(&self, _iface: &str) {
        self.post(Event::IfaceDestroyed);
    }

    fn on_up(&self, _iface: &str) {
        self.post(Event::IfaceStatusChanged { up: true });
    }

    fn on_down(&self, _iface: &str) {
        self.post(Event::IfaceStatusChanged { up: false });
    }
}

impl SoftApListener for EventSink {
    fn on_failure(&self) {
        self.post(Event::Failure);
    }

    fn on_info_changed(&self, info: RadioInstanceInfo) {
        self.post(Event::ApInfoChanged(info));
    }

    fn on_connected_clients_changed(&self, client: Client, connected: bool) {
        self.post(Event::ClientAssocChanged { client, connected });
    }
}

/// The lower-level driver layer that programs the radio hardware and
/// reports asynchronous events. All methods are
/// synchronous blocking calls — blocking time is considered part of
/// the handler's wall-clock.
pub trait NativeDriver: Send {
    /// Returns the acquired interface name, or an empty string on failure.
    /// `callback` is the interface-lifecycle sink the driver must invoke
    /// (from any thread) as `on_up`/`on_down`/`on_destroyed` fire.
    fn setup_interface(
        &mut self,
        callback: Arc<dyn IfaceCallback>,
        requestor: &str,
        bands: BandMask,
        bridged: bool,
    ) -> String;

    /// `listener` is the SoftAp event sink the driver must invoke as
    /// `on_failure`/`on_info_changed`/`on_connected_clients_changed` fire.
    fn start_soft_ap(
        &mut self,
        iface: &str,
        config: &ApConfiguration,
        is_tethered: bool,
        listener: Arc<dyn SoftApListener>,
    ) -> bool;

    fn teardown_interface(&mut self, iface: &str);

    fn is_interface_up(&self, iface: &str) -> bool;

    fn force_client_disconnect(&mut self, iface: &str, mac: &MacAddress, reason: DisconnectReason) -> bool;

    fn reset_factory_mac(&mut self, iface: &str) -> bool;

    fn set_mac(&mut self, iface: &str, bssid: &str) -> bool;

    fn is_set_mac_supported(&self, iface: &str) -> bool;

    fn set_country_code(&mut self, iface: &str, country_code: &str) -> bool;

    fn remove_instance_from_bridge(&mut self, iface: &str, instance: &RadioInstanceId);

    fn start_logging(&mut self, iface: &str);

    fn stop_logging(&mut self, iface: &str);
}

/// Channel/band selection heuristic. Treated as an external
/// collaborator; this crate never picks channels itself.
pub trait ChannelPlanner: Send {
    fn update_band_and_channel(
        &mut self,
        iface: &str,
        config: &ApConfiguration,
    ) -> Result<(), ChannelPlanError>;
}

/// Hardware/carrier capability defaults and feature predicates.
pub trait CapabilityProvider: Send {
    fn default_shutdown_ms(&self) -> u64;
    fn default_bridged_idle_ms(&self) -> u64;
    fn supports_mac_address_customization(&self) -> bool;
    fn supports_client_force_disconnect(&self) -> bool;
    fn supports_acs_offload(&self) -> bool;
    /// `true` iff `band` is usable given coexistence/regulatory constraints
    /// right now — used by the bridged-mode fallback.
    fn is_band_available(&self, band: Band) -> bool;
    /// Regulatory locale string gating channel usage. `startSoftAp` treats an empty string the same as
    /// unset.
    fn country_code(&self) -> String;
}

/// Persisted default-configuration store. Out of scope to
/// implement the persistence mechanism itself; see `softap-config` for a
/// concrete file-backed implementation used by `softap-cli`.
pub trait ConfigStore: Send {
    fn default_config(&self) -> ApConfiguration;
    fn randomize_bssid_if_unset(&self, config: ApConfiguration) -> ApConfiguration;
}

/// Coexistence/channel advisor.
///
/// Registration is a subscription only. No behavior is specified for the
/// callback today — it is reserved for future bridged-mode coexistence
/// shutdown (5 GHz vs. a running 2.4 GHz AP) and deliberately left a no-op
/// here, per the spec's instruction not to invent behavior.
pub trait CoexAdvisor: Send {
    fn register(&mut self, listener: Box<dyn CoexListener>);
    fn unregister(&mut self);
}

/// See `CoexAdvisor`. No method on this trait is ever called by this crate.
pub trait CoexListener: Send {
    fn on_coex_changed(&mut self);
}

/// The listener `StateMachine` registers on entry to `Running` and
/// unregisters on exit. Its callback is never invoked.
pub struct NullCoexListener;

impl CoexListener for NullCoexListener {
    fn on_coex_changed(&mut self) {}
}

/// Bundles every collaborator `StateMachine` needs, so construction sites
/// thread one value instead of five.
pub struct Collaborators {
    pub driver: Box<dyn NativeDriver>,
    pub channel_planner: Box<dyn ChannelPlanner>,
    pub capability_provider: Box<dyn CapabilityProvider>,
    pub coex: Box<dyn CoexAdvisor>,
    pub observers: Box<dyn Observers>,
}

/// Synchronous observer callbacks. Must be non-blocking;
/// if an implementation needs to call back into the lifecycle it must post
/// another event rather than reentering synchronously.
pub trait Observers: Send {
    fn on_state_changed(&mut self, state: crate::event::ApState);
    fn on_connected_clients_or_info_changed(&mut self);
    fn on_blocked_client_connecting(&mut self, mac: &MacAddress);
    fn on_started(&mut self);
    fn on_stopped(&mut self);
    fn on_start_failure(&mut self);

    /// Dismisses a previously shown "shutdown expired" notification.
    fn dismiss_shutdown_expired_notification(&mut self) {}

    /// Shows the "shutdown expired" notification.
    fn show_shutdown_expired_notification(&mut self) {}
}
