//! End-to-end scenario and property tests.
//!
//! Each test wires a `SoftApLifecycle` with the in-memory fakes from
//! `softap_core::testing`, drives it through the event sequence the
//! scenario describes, and asserts on the recorded observer/driver state.
//! Driver-originated events (`on_up`, `on_down`, client associations, radio
//! info) are injected the way a real driver would report them: through the
//! `IfaceCallback`/`SoftApListener` handles captured off the fake driver
//! before it's boxed into `Collaborators`.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use softap_core::testing::{
    FakeCapabilityProvider, FakeChannelPlanner, FakeCoexAdvisor, FakeNativeDriver, RecordingObservers,
};
use softap_core::{
    ApConfiguration, Band, BandMask, Capability, Client, Collaborators, IfaceCallback, MacAddress,
    RadioInstanceInfo, Role, SecurityMode, SoftApListener, SoftApLifecycle,
};

const IFACE: &str = "wlan-soft0";

fn base_config() -> ApConfiguration {
    ApConfiguration {
        ssid: "net".into(),
        bssid: None,
        bssid_was_randomized: false,
        bands: BandMask::single(Band::Ghz2_4),
        security: SecurityMode::WpaPersonal,
        hidden: false,
        blocked_macs: BTreeSet::new(),
        allowed_macs: BTreeSet::new(),
        client_control_enabled: false,
        max_clients: 0,
        shutdown_timeout_ms: 0,
        auto_shutdown_enabled: true,
        bridged_opportunistic_shutdown_enabled: false,
    }
}

fn base_capability() -> Capability {
    Capability {
        max_supported_clients: 8,
        mac_address_customization: true,
        client_force_disconnect: true,
        acs_offload: true,
    }
}

/// Handles into a running lifecycle's collaborators, captured before they
/// were boxed and moved into `Collaborators`.
struct Harness {
    lifecycle: SoftApLifecycle,
    calls: Arc<Mutex<Vec<String>>>,
    states: Arc<Mutex<Vec<String>>>,
    started: Arc<Mutex<u32>>,
    stopped: Arc<Mutex<u32>>,
    start_failures: Arc<Mutex<u32>>,
    blocked: Arc<Mutex<Vec<MacAddress>>>,
    iface_callback: Arc<Mutex<Option<Arc<dyn IfaceCallback>>>>,
    softap_listener: Arc<Mutex<Option<Arc<dyn SoftApListener>>>>,
}

impl Harness {
    fn iface_up(&self) {
        let cb = self.iface_callback.lock().unwrap().clone().expect("driver captured iface callback");
        cb.on_up(IFACE);
    }

    fn iface_down(&self) {
        let cb = self.iface_callback.lock().unwrap().clone().expect("driver captured iface callback");
        cb.on_down(IFACE);
    }

    fn connect(&self, mac: &str, instance: &str) {
        let listener = self.softap_listener.lock().unwrap().clone().expect("driver captured softap listener");
        listener.on_connected_clients_changed(Client::new(mac, instance), true);
    }

    fn disconnect(&self, mac: &str, instance: &str) {
        let listener = self.softap_listener.lock().unwrap().clone().expect("driver captured softap listener");
        listener.on_connected_clients_changed(Client::new(mac, instance), false);
    }

    fn info_changed(&self, info: RadioInstanceInfo) {
        let listener = self.softap_listener.lock().unwrap().clone().expect("driver captured softap listener");
        listener.on_info_changed(info);
    }

    fn calls_snapshot(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn states_snapshot(&self) -> Vec<String> {
        self.states.lock().unwrap().clone()
    }
}

fn radio_info(instance: &str, band: Band, frequency: i64) -> RadioInstanceInfo {
    RadioInstanceInfo {
        instance_id: instance.into(),
        band,
        frequency,
        bandwidth_code: 0,
        standard_code: 0,
        bssid: None,
        auto_shutdown_timeout_ms: 0,
    }
}

/// Spins up a lifecycle with fully scripted collaborators. `configure_driver`
/// runs before the fake is boxed, so a test can pre-set e.g. `iface_up` or
/// script `force_client_disconnect` results.
fn spawn(
    config: ApConfiguration,
    capability: Capability,
    capability_provider: FakeCapabilityProvider,
    configure_driver: impl FnOnce(&mut FakeNativeDriver),
) -> Harness {
    let mut driver = FakeNativeDriver::new();
    driver.iface_up = false; // the harness drives `on_up` explicitly, like a real driver would
    configure_driver(&mut driver);

    let calls = driver.calls_handle();
    let iface_callback = driver.iface_callback_handle();
    let softap_listener = driver.softap_listener_handle();

    let observers = RecordingObservers::new();
    let states = observers.states_handle();
    let started = observers.started_count_handle();
    let stopped = observers.stopped_count_handle();
    let start_failures = observers.start_failure_count_handle();
    let blocked = observers.blocked_clients_handle();

    let collaborators = Collaborators {
        driver: Box::new(driver),
        channel_planner: Box::new(FakeChannelPlanner::accepting()),
        capability_provider: Box::new(capability_provider),
        coex: Box::new(FakeCoexAdvisor::new()),
        observers: Box::new(observers),
    };

    let lifecycle = SoftApLifecycle::new("ap0", config, capability, Role::Local, "orchestrator", collaborators);

    Harness { lifecycle, calls, states, started, stopped, start_failures, blocked, iface_callback, softap_listener }
}

async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle().await;
}

// ── Scenario 1: happy path ──
//
// Start succeeds, interface comes up, a client associates and later
// disconnects cleanly, then the orchestrator stops the AP.
#[tokio::test(start_paused = true)]
async fn scenario_1_happy_path() {
    let h = spawn(base_config(), base_capability(), FakeCapabilityProvider::new(), |_| {});
    settle().await;

    assert!(h.calls_snapshot().iter().any(|c| c.starts_with("setup_interface(orchestrator")));
    assert!(h.calls_snapshot().iter().any(|c| c.starts_with("start_soft_ap(")));
    assert!(h.states_snapshot().contains(&"Enabling".to_string()));

    h.iface_up();
    settle().await;
    assert!(h.states_snapshot().contains(&"Enabled".to_string()));
    assert_eq!(*h.started.lock().unwrap(), 1);

    h.connect("aa:bb:cc:dd:ee:01", "wlan0");
    settle().await;
    // Admission accepted: no disconnect issued for the new client.
    assert!(!h.calls_snapshot().iter().any(|c| c.contains("force_client_disconnect")));

    h.disconnect("aa:bb:cc:dd:ee:01", "wlan0");
    settle().await;

    h.lifecycle.stop().unwrap();
    settle().await;

    assert!(h.states_snapshot().contains(&"Disabled".to_string()));
    assert_eq!(*h.stopped.lock().unwrap(), 1);
    assert!(h.calls_snapshot().iter().any(|c| c.starts_with("teardown_interface(")));
}

// ── Scenario 2: inactivity expiry ──
//
// No client ever associates; `ShutdownTimer` fires once its delay elapses
// and the AP shuts itself down.
#[tokio::test(start_paused = true)]
async fn scenario_2_inactivity_expiry() {
    let mut config = base_config();
    config.shutdown_timeout_ms = 50;
    let h = spawn(config, base_capability(), FakeCapabilityProvider::new(), |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    assert!(h.states_snapshot().contains(&"Enabled".to_string()));
    assert_eq!(*h.stopped.lock().unwrap(), 0);

    advance(60).await;

    assert_eq!(*h.stopped.lock().unwrap(), 1);
    assert!(h.states_snapshot().contains(&"Disabled".to_string()));
}

// ── Scenario 3: bridged fallback ──
//
// A bridged request collapses to a single band when one of the requested
// bands isn't available.
#[tokio::test(start_paused = true)]
async fn scenario_3_bridged_fallback() {
    let mut config = base_config();
    config.bands = BandMask::from_bands([Band::Ghz2_4, Band::Ghz5]);

    let mut capability_provider = FakeCapabilityProvider::new();
    capability_provider.unavailable_bands.insert(Band::Ghz5);

    let h = spawn(config, base_capability(), capability_provider, |_| {});
    settle().await;

    assert!(h
        .calls_snapshot()
        .iter()
        .any(|c| c == "setup_interface(orchestrator, bridged=false, bands=1)"));
}

// ── Scenario 4: blocked client, forced disconnect fails, then retries ──
//
// An unlisted client under `client_control_enabled` is rejected and the
// observer is notified; the first `force_client_disconnect` fails, so the
// client is queued and retried once `ForceDisconnectPending` fires.
#[tokio::test(start_paused = true)]
async fn scenario_4_blocked_client_forced_disconnect_with_retry() {
    let mut config = base_config();
    config.client_control_enabled = true;
    let h = spawn(config, base_capability(), FakeCapabilityProvider::new(), |driver| {
        driver.script_force_disconnect_results([false]);
    });
    settle().await;
    h.iface_up();
    settle().await;

    let mac = MacAddress::new("aa:bb:cc:dd:ee:02");
    h.connect(mac.as_str(), "wlan0");
    settle().await;

    assert_eq!(h.blocked.lock().unwrap().as_slice(), &[mac.clone()]);
    let calls_after_first = h.calls_snapshot();
    assert_eq!(calls_after_first.iter().filter(|c| c.contains("force_client_disconnect")).count(), 1);

    // Pending retry is scheduled RETRY_DELAY_MS out; the second attempt
    // succeeds since the scripted failure queue is drained.
    advance(1100).await;

    let calls_after_retry = h.calls_snapshot();
    assert_eq!(calls_after_retry.iter().filter(|c| c.contains("force_client_disconnect")).count(), 2);
}

// ── Scenario 5: capacity eviction on UpdateConfig ──
//
// Lowering `max_clients` below the current connected count evicts the
// oldest clients first, by insertion order.
#[tokio::test(start_paused = true)]
async fn scenario_5_capacity_eviction_on_config_update() {
    let h = spawn(base_config(), base_capability(), FakeCapabilityProvider::new(), |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    h.connect("aa:bb:cc:dd:ee:01", "wlan0");
    settle().await;
    h.connect("aa:bb:cc:dd:ee:02", "wlan0");
    settle().await;
    h.connect("aa:bb:cc:dd:ee:03", "wlan0");
    settle().await;

    let mut cfg = base_config();
    cfg.max_clients = 1;
    h.lifecycle.update_configuration(cfg).unwrap();
    settle().await;

    let calls = h.calls_snapshot();
    let disconnect_order: Vec<_> =
        calls.iter().filter(|c| c.contains("force_client_disconnect")).cloned().collect();
    assert_eq!(disconnect_order.len(), 2);
    assert!(disconnect_order[0].contains("aa:bb:cc:dd:ee:01"));
    assert!(disconnect_order[1].contains("aa:bb:cc:dd:ee:02"));
    assert!(disconnect_order.iter().all(|c| c.contains("NoMoreStas")));
}

// ── Scenario 6: bridged idle shutdown picks the highest-frequency instance ──
//
// With both radio instances idle, `BridgedIdleTimer` removes the
// higher-frequency one from the bridge.
#[tokio::test(start_paused = true)]
async fn scenario_6_bridged_idle_shutdown() {
    let mut config = base_config();
    config.bands = BandMask::from_bands([Band::Ghz2_4, Band::Ghz5]);
    config.bridged_opportunistic_shutdown_enabled = true;

    let mut capability_provider = FakeCapabilityProvider::new();
    capability_provider.bridged_idle_ms = 50;

    let h = spawn(config, base_capability(), capability_provider, |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    h.info_changed(radio_info("wlan0-2g", Band::Ghz2_4, 2437));
    settle().await;
    h.info_changed(radio_info("wlan0-5g", Band::Ghz5, 5180));
    settle().await;

    advance(60).await;

    let calls = h.calls_snapshot();
    assert!(calls.iter().any(|c| c.contains("remove_instance_from_bridge") && c.contains("wlan0-5g")));
    assert!(!calls.iter().any(|c| c.contains("remove_instance_from_bridge") && c.contains("wlan0-2g")));
}

/// `BridgedIdleTimer` re-arms after firing: with three still-idle instances,
/// a second idle period must remove a second instance rather than leaving
/// the timer permanently disarmed after its first fire.
#[tokio::test(start_paused = true)]
async fn property_bridged_idle_timer_rearms_after_firing() {
    let mut config = base_config();
    config.bands = BandMask::from_bands([Band::Ghz2_4, Band::Ghz5, Band::Ghz6]);
    config.bridged_opportunistic_shutdown_enabled = true;

    let mut capability_provider = FakeCapabilityProvider::new();
    capability_provider.bridged_idle_ms = 50;

    let h = spawn(config, base_capability(), capability_provider, |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    h.info_changed(radio_info("wlan0-2g", Band::Ghz2_4, 2437));
    settle().await;
    h.info_changed(radio_info("wlan0-5g", Band::Ghz5, 5180));
    settle().await;
    h.info_changed(radio_info("wlan0-6g", Band::Ghz6, 6115));
    settle().await;

    // First idle period removes the highest-frequency instance (6 GHz);
    // two instances remain, still bridged and still idle, so the timer
    // must re-arm rather than going permanently quiet.
    advance(60).await;
    let removed_after_first: Vec<_> = h
        .calls_snapshot()
        .into_iter()
        .filter(|c| c.contains("remove_instance_from_bridge"))
        .collect();
    assert_eq!(removed_after_first.len(), 1);
    assert!(removed_after_first[0].contains("wlan0-6g"));

    // Second idle period removes the next-highest (5 GHz), proving the
    // timer re-armed instead of staying stuck after its first fire.
    advance(60).await;
    let removed_after_second: Vec<_> = h
        .calls_snapshot()
        .into_iter()
        .filter(|c| c.contains("remove_instance_from_bridge"))
        .collect();
    assert_eq!(removed_after_second.len(), 2);
    assert!(removed_after_second[1].contains("wlan0-5g"));
}

// ── Properties ──

/// A client that re-associates while it still has a pending forced
/// disconnect, and for whom admission would now succeed, drops the pending
/// entry instead of being disconnected again by the delayed retry.
#[tokio::test(start_paused = true)]
async fn property_reassociation_cancels_pending_retry() {
    let mut config = base_config();
    config.max_clients = 1;
    let h = spawn(config, base_capability(), FakeCapabilityProvider::new(), |driver| {
        driver.script_force_disconnect_results([false]);
    });
    settle().await;
    h.iface_up();
    settle().await;

    // Fills the one slot.
    h.connect("aa:bb:cc:dd:ee:10", "wlan0");
    settle().await;

    // Rejected for NoMoreStas; the forced disconnect is scripted to fail,
    // so it lands in the pending retry queue.
    h.connect("aa:bb:cc:dd:ee:09", "wlan0");
    settle().await;
    assert_eq!(h.calls_snapshot().iter().filter(|c| c.contains("force_client_disconnect")).count(), 1);

    // The slot frees up, then the pending client re-associates before the
    // retry timer fires — admission now accepts it outright.
    h.disconnect("aa:bb:cc:dd:ee:10", "wlan0");
    settle().await;
    h.connect("aa:bb:cc:dd:ee:09", "wlan0");
    settle().await;

    advance(1100).await;
    // No second forced-disconnect attempt: the pending entry was dropped on
    // re-association, so the retry fires against an empty queue.
    assert_eq!(h.calls_snapshot().iter().filter(|c| c.contains("force_client_disconnect")).count(), 1);
}

/// A duplicate positive `ClientAssocChanged` for an already-registered
/// client is dropped rather than re-admitted or re-counted.
#[tokio::test(start_paused = true)]
async fn property_duplicate_association_is_dropped() {
    let h = spawn(base_config(), base_capability(), FakeCapabilityProvider::new(), |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    h.connect("aa:bb:cc:dd:ee:05", "wlan0");
    settle().await;
    h.connect("aa:bb:cc:dd:ee:05", "wlan0");
    settle().await;

    // Neither admission attempt issued a disconnect; the second was silently dropped.
    assert!(!h.calls_snapshot().iter().any(|c| c.contains("force_client_disconnect")));
}

/// `ShutdownTimer` never fires while at least one client remains connected.
#[tokio::test(start_paused = true)]
async fn property_shutdown_never_fires_with_connected_clients() {
    let mut config = base_config();
    config.shutdown_timeout_ms = 50;
    let h = spawn(config, base_capability(), FakeCapabilityProvider::new(), |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    h.connect("aa:bb:cc:dd:ee:07", "wlan0");
    settle().await;

    advance(200).await;

    assert_eq!(*h.stopped.lock().unwrap(), 0);
    assert!(h.states_snapshot().contains(&"Enabled".to_string()));
}

/// `UpdateConfig` carrying a restart-requiring change (SSID) is rejected
/// outright: the running config is left untouched and no client is
/// disconnected.
#[tokio::test(start_paused = true)]
async fn property_restart_requiring_config_update_is_ignored() {
    let h = spawn(base_config(), base_capability(), FakeCapabilityProvider::new(), |_| {});
    settle().await;
    h.iface_up();
    settle().await;

    h.connect("aa:bb:cc:dd:ee:08", "wlan0");
    settle().await;

    let mut cfg = base_config();
    cfg.ssid = "different-net".into();
    h.lifecycle.update_configuration(cfg).unwrap();
    settle().await;

    assert!(!h.calls_snapshot().iter().any(|c| c.contains("force_client_disconnect")));
    assert!(!h.calls_snapshot().iter().any(|c| c.contains("teardown_interface")));
}

/// A start failure (driver rejects `setup_interface`) is reported once and
/// the lifecycle does not attempt `start_soft_ap`.
#[tokio::test(start_paused = true)]
async fn property_setup_interface_failure_reports_start_failure() {
    let h = spawn(base_config(), base_capability(), FakeCapabilityProvider::new(), |driver| {
        driver.setup_should_fail = true;
    });
    settle().await;

    assert_eq!(*h.start_failures.lock().unwrap(), 1);
    assert!(!h.calls_snapshot().iter().any(|c| c.starts_with("start_soft_ap")));
    assert!(h.states_snapshot().iter().any(|s| s.starts_with("Failed")));
}

/// A randomized BSSID the driver can't program falls back to the
/// reset-to-factory path instead of failing the start with
/// `UnsupportedConfiguration` -- only a user-supplied BSSID is held to that
/// standard.
#[tokio::test(start_paused = true)]
async fn property_unsettable_randomized_bssid_falls_back_instead_of_failing() {
    let mut config = base_config();
    config.bssid = Some("de:ad:be:ef:00:01".into());
    config.bssid_was_randomized = true;
    let h = spawn(config, base_capability(), FakeCapabilityProvider::new(), |driver| {
        driver.set_mac_supported = false;
    });
    settle().await;

    assert!(!h.calls_snapshot().iter().any(|c| c.starts_with("set_mac(")));
    assert!(h.calls_snapshot().iter().any(|c| c.starts_with("reset_factory_mac(")));
    assert_eq!(*h.start_failures.lock().unwrap(), 0);
    assert!(h.calls_snapshot().iter().any(|c| c.starts_with("start_soft_ap")));
}
