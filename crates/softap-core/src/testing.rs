//! In-memory fakes for the collaborator traits. Used by this
//! crate's own unit/integration tests and exposed to the rest of the
//! workspace behind the `test-util` feature so `softap-cli` can run a
//! simulated device without a real driver.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::capability::Capability;
use crate::collaborators::{
    ChannelPlanner, CoexAdvisor, CoexListener, DisconnectReason, IfaceCallback, NativeDriver, Observers,
    SoftApListener,
};
use crate::config::ApConfiguration;
use crate::error::ChannelPlanError;
use crate::event::ApState;
use crate::model::{Band, MacAddress, RadioInstanceId};

pub use crate::collaborators::CapabilityProvider;

/// Records every call made to it, in order, so tests can assert on driver
/// interaction sequencing rather than just end state.
#[derive(Default)]
pub struct FakeNativeDriver {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub interface_name: String,
    pub setup_should_fail: bool,
    pub start_should_fail: bool,
    pub iface_up: bool,
    pub set_mac_supported: bool,
    /// Stashed so tests can drive driver-originated events after `start()`
    /// without the fake needing its own thread. `*_handle()` gives a test a
    /// cloneable reference before the driver is boxed and moved into
    /// `Collaborators`.
    iface_callback: Arc<Mutex<Option<Arc<dyn IfaceCallback>>>>,
    softap_listener: Arc<Mutex<Option<Arc<dyn SoftApListener>>>>,
    /// Scripted `force_client_disconnect` results, consumed front-to-back;
    /// once drained, every further call returns `true`. Lets a test force
    /// the forced-disconnect pending-retry path without a real driver failure.
    force_disconnect_results: Arc<Mutex<VecDeque<bool>>>,
}

impl FakeNativeDriver {
    pub fn new() -> Self {
        Self { interface_name: "wlan-soft0".into(), iface_up: true, set_mac_supported: true, ..Default::default() }
    }

    pub fn calls_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }

    pub fn iface_callback_handle(&self) -> Arc<Mutex<Option<Arc<dyn IfaceCallback>>>> {
        Arc::clone(&self.iface_callback)
    }

    pub fn softap_listener_handle(&self) -> Arc<Mutex<Option<Arc<dyn SoftApListener>>>> {
        Arc::clone(&self.softap_listener)
    }

    /// Queue up `force_client_disconnect` results for the next N calls.
    pub fn script_force_disconnect_results(&self, results: impl IntoIterator<Item = bool>) {
        let mut queue = self.force_disconnect_results.lock().unwrap_or_else(|e| e.into_inner());
        queue.extend(results);
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call.into());
    }
}

impl NativeDriver for FakeNativeDriver {
    fn setup_interface(
        &mut self,
        callback: Arc<dyn IfaceCallback>,
        requestor: &str,
        bands: crate::model::BandMask,
        bridged: bool,
    ) -> String {
        self.record(format!("setup_interface({requestor}, bridged={bridged}, bands={})", bands.len()));
        *self.iface_callback.lock().unwrap_or_else(|e| e.into_inner()) = Some(callback);
        if self.setup_should_fail {
            String::new()
        } else {
            self.interface_name.clone()
        }
    }

    fn start_soft_ap(
        &mut self,
        iface: &str,
        _config: &ApConfiguration,
        is_tethered: bool,
        listener: Arc<dyn SoftApListener>,
    ) -> bool {
        self.record(format!("start_soft_ap({iface}, tethered={is_tethered})"));
        *self.softap_listener.lock().unwrap_or_else(|e| e.into_inner()) = Some(listener);
        !self.start_should_fail
    }

    fn teardown_interface(&mut self, iface: &str) {
        self.record(format!("teardown_interface({iface})"));
    }

    fn is_interface_up(&self, _iface: &str) -> bool {
        self.iface_up
    }

    fn force_client_disconnect(&mut self, iface: &str, mac: &MacAddress, reason: DisconnectReason) -> bool {
        self.record(format!("force_client_disconnect({iface}, {mac}, {reason:?})"));
        self.force_disconnect_results.lock().unwrap_or_else(|e| e.into_inner()).pop_front().unwrap_or(true)
    }

    fn reset_factory_mac(&mut self, iface: &str) -> bool {
        self.record(format!("reset_factory_mac({iface})"));
        true
    }

    fn set_mac(&mut self, iface: &str, bssid: &str) -> bool {
        self.record(format!("set_mac({iface}, {bssid})"));
        true
    }

    fn is_set_mac_supported(&self, _iface: &str) -> bool {
        self.set_mac_supported
    }

    fn set_country_code(&mut self, iface: &str, country_code: &str) -> bool {
        self.record(format!("set_country_code({iface}, {country_code})"));
        true
    }

    fn remove_instance_from_bridge(&mut self, iface: &str, instance: &RadioInstanceId) {
        self.record(format!("remove_instance_from_bridge({iface}, {instance})"));
    }

    fn start_logging(&mut self, iface: &str) {
        self.record(format!("start_logging({iface})"));
    }

    fn stop_logging(&mut self, iface: &str) {
        self.record(format!("stop_logging({iface})"));
    }
}

/// Always accepts, or always rejects, depending on construction.
pub struct FakeChannelPlanner {
    result: Result<(), ChannelPlanError>,
}

impl FakeChannelPlanner {
    pub fn accepting() -> Self {
        Self { result: Ok(()) }
    }

    pub fn rejecting(err: ChannelPlanError) -> Self {
        Self { result: Err(err) }
    }
}

impl ChannelPlanner for FakeChannelPlanner {
    fn update_band_and_channel(&mut self, _iface: &str, _config: &ApConfiguration) -> Result<(), ChannelPlanError> {
        self.result
    }
}

pub struct FakeCapabilityProvider {
    pub shutdown_ms: u64,
    pub bridged_idle_ms: u64,
    pub mac_customization: bool,
    pub force_disconnect: bool,
    pub acs_offload: bool,
    pub unavailable_bands: BTreeSet<Band>,
    pub country_code: String,
}

impl FakeCapabilityProvider {
    pub fn new() -> Self {
        Self {
            shutdown_ms: 30_000,
            bridged_idle_ms: 60_000,
            mac_customization: true,
            force_disconnect: true,
            acs_offload: true,
            unavailable_bands: BTreeSet::new(),
            country_code: "US".into(),
        }
    }
}

impl Default for FakeCapabilityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityProvider for FakeCapabilityProvider {
    fn default_shutdown_ms(&self) -> u64 {
        self.shutdown_ms
    }

    fn default_bridged_idle_ms(&self) -> u64 {
        self.bridged_idle_ms
    }

    fn supports_mac_address_customization(&self) -> bool {
        self.mac_customization
    }

    fn supports_client_force_disconnect(&self) -> bool {
        self.force_disconnect
    }

    fn supports_acs_offload(&self) -> bool {
        self.acs_offload
    }

    fn is_band_available(&self, band: Band) -> bool {
        !self.unavailable_bands.contains(&band)
    }

    fn country_code(&self) -> String {
        self.country_code.clone()
    }
}

/// Records every observer callback invocation; tests assert against the
/// handles rather than the fake itself, since the fake moves into
/// `Collaborators`.
#[derive(Default)]
pub struct RecordingObservers {
    states: Arc<Mutex<Vec<String>>>,
    blocked_clients: Arc<Mutex<Vec<MacAddress>>>,
    started_count: Arc<Mutex<u32>>,
    stopped_count: Arc<Mutex<u32>>,
    start_failure_count: Arc<Mutex<u32>>,
    info_changed_count: Arc<Mutex<u32>>,
}

impl RecordingObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.states)
    }

    pub fn blocked_clients_handle(&self) -> Arc<Mutex<Vec<MacAddress>>> {
        Arc::clone(&self.blocked_clients)
    }

    pub fn started_count_handle(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.started_count)
    }

    pub fn stopped_count_handle(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.stopped_count)
    }

    pub fn start_failure_count_handle(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.start_failure_count)
    }
}

impl Observers for RecordingObservers {
    fn on_state_changed(&mut self, state: ApState) {
        self.states.lock().unwrap_or_else(|e| e.into_inner()).push(state.to_string());
    }

    fn on_connected_clients_or_info_changed(&mut self) {
        *self.info_changed_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn on_blocked_client_connecting(&mut self, mac: &MacAddress) {
        self.blocked_clients.lock().unwrap_or_else(|e| e.into_inner()).push(mac.clone());
    }

    fn on_started(&mut self) {
        *self.started_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn on_stopped(&mut self) {
        *self.stopped_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn on_start_failure(&mut self) {
        *self.start_failure_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}

/// Records register/unregister calls. Never invokes the listener it's handed.
#[derive(Default)]
pub struct FakeCoexAdvisor {
    pub register_count: Arc<Mutex<u32>>,
    pub unregister_count: Arc<Mutex<u32>>,
}

impl FakeCoexAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_count_handle(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.register_count)
    }

    pub fn unregister_count_handle(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.unregister_count)
    }
}

impl CoexAdvisor for FakeCoexAdvisor {
    fn register(&mut self, _listener: Box<dyn CoexListener>) {
        *self.register_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn unregister(&mut self) {
        *self.unregister_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }
}
