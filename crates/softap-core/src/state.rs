// ── StateMachine ──
//
// `Idle` (parent) and `Running` (child),
// realized as a plain tag enum rather than a base-class hierarchy — a
// compact local implementation in place of a framework HSM base class.
// `Running`'s transition table happens to cover every event in the
// alphabet, so in practice nothing ever falls through to `Idle`; the
// fallthrough path exists structurally (`handle_running` returning
// `Fallthrough` would replay through `handle_idle`) but is currently dead —
// kept because the hierarchy's fallthrough behavior is load-bearing design,
// not incidental.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::admission::{Admission, AdmissionPolicy, RejectReason};
use crate::capability::Capability;
use crate::collaborators::{
    CapabilityProvider, ChannelPlanner, Collaborators, CoexAdvisor, DisconnectReason, EventSink,
    NativeDriver, NullCoexListener, Observers,
};
use crate::config::{restart_required, ApConfiguration};
use crate::error::StartSoftApError;
use crate::event::{ApState, Event, FailureReason, Requestor};
use crate::model::{Band, BandMask, RadioInstanceId, Role};
use crate::pending::PendingDisconnectQueue;
use crate::registry::ClientRegistry;
use crate::timers::TimerSet;

/// "Tuning constants."
pub const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Idle,
    Running,
}

impl LifecycleState {
    fn name(self) -> &'static str {
        match self {
            LifecycleState::Idle => "Idle",
            LifecycleState::Running => "Running",
        }
    }
}

/// What a dispatch round produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    /// The lifecycle has reached its terminal quit; the dispatcher should
    /// stop pulling from the mailbox and let the `StateMachine` drop.
    Quit,
}

/// Values the `SoftApLifecycle` façade reads from outside the dispatcher
/// task, kept current by `StateMachine` as it runs. `ArcSwap` gives lock-free
/// atomic reads without routing every accessor through the mailbox.
pub(crate) struct SharedState {
    pub interface_name: ArcSwapOption<String>,
    pub state_name: ArcSwap<String>,
    pub config: ArcSwap<ApConfiguration>,
    pub capability: ArcSwap<Capability>,
}

impl SharedState {
    pub fn new(config: ApConfiguration, capability: Capability) -> Arc<Self> {
        Arc::new(Self {
            interface_name: ArcSwapOption::from(None),
            state_name: ArcSwap::from_pointee(LifecycleState::Idle.name().to_string()),
            config: ArcSwap::from_pointee(config),
            capability: ArcSwap::from_pointee(capability),
        })
    }
}

pub struct StateMachine {
    state: LifecycleState,
    role: Role,
    requestor: Requestor,
    interface_name: Option<String>,
    iface_up: bool,
    iface_destroyed: bool,
    config: ApConfiguration,
    capability: Capability,
    registry: ClientRegistry,
    pending: PendingDisconnectQueue,
    timers: TimerSet,
    radio_info: IndexMap<RadioInstanceId, crate::model::RadioInstanceInfo>,
    max_clients_reported: bool,
    force_disconnect_retry: Option<CancellationToken>,
    start_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    mailbox: mpsc::UnboundedSender<Event>,
    event_sink: Arc<EventSink>,
    driver: Box<dyn NativeDriver>,
    channel_planner: Box<dyn ChannelPlanner>,
    capability_provider: Box<dyn CapabilityProvider>,
    coex: Box<dyn CoexAdvisor>,
    observers: Box<dyn Observers>,
    shared: Arc<SharedState>,
}

impl StateMachine {
    pub fn new(
        role: Role,
        requestor: Requestor,
        config: ApConfiguration,
        capability: Capability,
        mailbox: mpsc::UnboundedSender<Event>,
        collaborators: Collaborators,
        shared: Arc<SharedState>,
    ) -> Self {
        let event_sink = Arc::new(EventSink::new(mailbox.clone()));
        Self {
            state: LifecycleState::Idle,
            role,
            requestor,
            interface_name: None,
            iface_up: false,
            iface_destroyed: false,
            config,
            capability,
            registry: ClientRegistry::new(),
            pending: PendingDisconnectQueue::new(),
            timers: TimerSet::new(),
            radio_info: IndexMap::new(),
            max_clients_reported: false,
            force_disconnect_retry: None,
            start_timestamp: None,
            mailbox,
            event_sink,
            driver: collaborators.driver,
            channel_planner: collaborators.channel_planner,
            capability_provider: collaborators.capability_provider,
            coex: collaborators.coex,
            observers: collaborators.observers,
            shared,
        }
    }

    pub fn current_state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn dump(&self) -> String {
        format!(
            "state={} iface={:?} iface_up={} iface_destroyed={} clients={} pending={} \
             radio_instances={} shutdown_armed={} bridged_idle_armed={} start_timestamp={:?}",
            self.state.name(),
            self.interface_name,
            self.iface_up,
            self.iface_destroyed,
            self.registry.total_count(),
            self.pending.iter().count(),
            self.radio_info.len(),
            self.timers.shutdown_armed(),
            self.timers.bridged_idle_armed(),
            self.start_timestamp,
        )
    }

    pub fn dispatch(&mut self, event: Event) -> DispatchOutcome {
        debug!(state = self.state.name(), event = %event, "dispatch");
        match self.state {
            LifecycleState::Idle => self.handle_idle(event),
            LifecycleState::Running => self.handle_running(event),
        }
    }

    // ── Idle ──

    fn handle_idle(&mut self, event: Event) -> DispatchOutcome {
        match event {
            Event::Start(requestor) => {
                self.idle_on_start(requestor);
                DispatchOutcome::Continue
            }
            Event::Stop => self.idle_quit(),
            Event::UpdateCapability(cap) => {
                if self.role == Role::Tethered {
                    self.set_capability(cap);
                }
                DispatchOutcome::Continue
            }
            Event::UpdateConfig(cfg) => {
                self.set_config(cfg);
                DispatchOutcome::Continue
            }
            _ => DispatchOutcome::Continue,
        }
    }

    fn idle_quit(&mut self) -> DispatchOutcome {
        self.observers.on_stopped();
        DispatchOutcome::Quit
    }

    fn idle_on_start(&mut self, requestor: Requestor) {
        if self.config.ssid.is_empty() {
            warn!("Start rejected: SSID missing");
            self.report_start_failure(FailureReason::General);
            return;
        }

        let bands = self.compute_fallback_bands(self.config.bands);
        let bridged = bands.is_bridged();
        let name = self.driver.setup_interface(self.event_sink.clone(), &requestor.0, bands, bridged);
        if name.is_empty() {
            warn!("Start rejected: setup_interface returned no interface");
            self.report_start_failure(FailureReason::General);
            return;
        }

        self.observers.dismiss_shutdown_expired_notification();
        self.interface_name = Some(name.clone());
        self.shared.interface_name.store(Some(Arc::new(name.clone())));
        self.requestor = requestor;
        self.publish_state(ApState::Enabling);

        match self.start_soft_ap(&name, bands) {
            Ok(()) => self.enter_running(),
            Err(err) => {
                let reason = FailureReason::from(err);
                self.publish_state(ApState::Failed(reason));
                self.observers.on_start_failure();
                self.driver.teardown_interface(&name);
                self.interface_name = None;
                self.shared.interface_name.store(None);
            }
        }
    }

    fn report_start_failure(&mut self, reason: FailureReason) {
        self.publish_state(ApState::Failed(reason));
        self.observers.on_start_failure();
    }

    /// 's bridged-to-single-band capability fallback.
    ///
    /// The spec's "bitwise-OR of available bands" reads, taken literally,
    /// can still leave more than one band set; since the stated goal is
    /// explicitly *single*-band mode, this narrows a still-bridged result
    /// down to 2.4 GHz (if it survived) or the lowest surviving band.
    fn compute_fallback_bands(&self, requested: BandMask) -> BandMask {
        if !requested.is_bridged() {
            return requested;
        }
        let any_unavailable =
            requested.iter().any(|b| !self.capability_provider.is_band_available(b));
        if !any_unavailable {
            return requested;
        }

        let mut fallback =
            BandMask::from_bands(requested.iter().filter(|b| self.capability_provider.is_band_available(*b)));
        if self.capability_provider.is_band_available(Band::Ghz2_4) {
            fallback.insert(Band::Ghz2_4);
        }
        if fallback.is_empty() {
            return BandMask::single(requested.iter().next().unwrap_or(Band::Ghz2_4));
        }
        if fallback.is_bridged() {
            let chosen = if fallback.contains(Band::Ghz2_4) {
                Band::Ghz2_4
            } else {
                fallback.iter().next().unwrap_or(Band::Ghz2_4)
            };
            return BandMask::single(chosen);
        }
        fallback
    }

    /// `startSoftAp` sub-procedure.
    fn start_soft_ap(&mut self, iface: &str, bands: BandMask) -> Result<(), StartSoftApError> {
        match self.config.bssid.clone() {
            None => {
                if !self.driver.reset_factory_mac(iface) {
                    warn!(iface, "reset_factory_mac failed; continuing");
                }
            }
            Some(bssid) => {
                if self.capability.mac_address_customization && self.driver.is_set_mac_supported(iface) {
                    if !self.driver.set_mac(iface, &bssid) {
                        return Err(StartSoftApError::General);
                    }
                } else if self.config.bssid_was_randomized {
                    // A framework-chosen BSSID we can't program is no worse
                    // than having none; fall back to the unset path instead
                    // of failing a config the caller never explicitly set.
                    if !self.driver.reset_factory_mac(iface) {
                        warn!(iface, "reset_factory_mac failed; continuing");
                    }
                } else {
                    return Err(StartSoftApError::UnsupportedConfiguration);
                }
            }
        }

        let requires_cc = bands.iter().any(Band::requires_country_code);
        let country_code = self.capability_provider.country_code();
        if requires_cc {
            if country_code.is_empty() {
                return Err(StartSoftApError::General);
            }
            if !self.driver.set_country_code(iface, &country_code) {
                return Err(StartSoftApError::General);
            }
        } else if !country_code.is_empty() {
            let _ = self.driver.set_country_code(iface, &country_code);
        }

        self.channel_planner.update_band_and_channel(iface, &self.config)?;

        if bands.is_bridged() && !self.capability.acs_offload {
            return Err(StartSoftApError::UnsupportedConfiguration);
        }

        let tethered = self.role == Role::Tethered;
        if !self.driver.start_soft_ap(iface, &self.config, tethered, self.event_sink.clone()) {
            return Err(StartSoftApError::General);
        }

        self.driver.start_logging(iface);
        self.start_timestamp = Some(chrono::Utc::now());
        Ok(())
    }

    fn enter_running(&mut self) {
        self.state = LifecycleState::Running;
        self.iface_up =
            self.interface_name.as_deref().map(|name| self.driver.is_interface_up(name)).unwrap_or(false);
        self.iface_destroyed = false;
        self.registry.clear();
        self.pending.clear();
        self.max_clients_reported = false;
        self.coex.register(Box::new(NullCoexListener));
        self.shared.state_name.store(Arc::new(LifecycleState::Running.name().to_string()));
        self.reschedule_timers();
        debug!("entered Running");
    }

    // ── Running ──

    fn handle_running(&mut self, event: Event) -> DispatchOutcome {
        match event {
            Event::ClientAssocChanged { client, connected } => {
                self.running_client_assoc_changed(client, connected);
                DispatchOutcome::Continue
            }
            Event::ApInfoChanged(info) => {
                self.running_ap_info_changed(info);
                DispatchOutcome::Continue
            }
            Event::IfaceStatusChanged { up } => self.running_iface_status_changed(up),
            Event::Stop => self.running_quit(false),
            Event::Start(_) => DispatchOutcome::Continue,
            Event::NoClientsTimeout => self.running_no_clients_timeout(),
            Event::NoClientsTimeoutOneInstance => {
                self.running_bridged_idle_timeout();
                DispatchOutcome::Continue
            }
            Event::IfaceDestroyed => self.running_iface_destroyed(),
            Event::Failure | Event::IfaceDown => self.running_failure(),
            Event::UpdateCapability(cap) => {
                self.running_update_capability(cap);
                DispatchOutcome::Continue
            }
            Event::UpdateConfig(cfg) => {
                self.running_update_config(cfg);
                DispatchOutcome::Continue
            }
            Event::ForceDisconnectPending => {
                self.running_force_disconnect_pending();
                DispatchOutcome::Continue
            }
        }
    }

    fn running_client_assoc_changed(&mut self, client: crate::model::Client, connected: bool) {
        if connected {
            if self.pending.remove(&client.mac) {
                debug!(mac = %client.mac, "dropped pending retry on re-association");
            }
            if self.registry.contains(&client.mac) {
                warn!(mac = %client.mac, "duplicate ClientAssocChanged(true); dropping");
                return;
            }
            match AdmissionPolicy::evaluate(&self.config, &self.capability, &client.mac, &self.registry) {
                Admission::Accept => {
                    self.registry.insert(client);
                    self.observers.on_connected_clients_or_info_changed();
                    self.reschedule_timers();
                }
                Admission::Reject(reason) => {
                    if reason == RejectReason::NoMoreStas && !self.max_clients_reported {
                        self.max_clients_reported = true;
                        debug!("max-clients-reached recorded for this config epoch");
                    }
                    self.issue_disconnect(client.mac, reason.into());
                }
                Admission::RejectNotifyBlocked => {
                    self.observers.on_blocked_client_connecting(&client.mac);
                    self.issue_disconnect(client.mac, DisconnectReason::BlockedByUser);
                }
            }
        } else {
            self.registry.remove(&client.instance_id, &client.mac);
            self.observers.on_connected_clients_or_info_changed();
            self.reschedule_timers();
        }
    }

    fn running_ap_info_changed(&mut self, mut info: crate::model::RadioInstanceInfo) {
        if info.frequency < 0 {
            if self.radio_info.shift_remove(&info.instance_id).is_some() {
                self.registry.remove_instance(&info.instance_id);
                self.observers.on_connected_clients_or_info_changed();
                self.reschedule_timers();
            }
            return;
        }

        info.auto_shutdown_timeout_ms = self.effective_shutdown_timeout_ms();
        let is_noop = self
            .radio_info
            .get(&info.instance_id)
            .is_some_and(|existing| existing.same_radio_params(&info));
        if is_noop {
            return;
        }

        let bridged = self.config.is_bridged_mode();
        self.radio_info.insert(info.instance_id.clone(), info.clone());
        self.registry.ensure_instance(&info.instance_id);

        if bridged && self.radio_info.len() < 2 {
            // Suppress the "changed" notification until the second
            // instance's info has also arrived.
            return;
        }

        self.observers.on_connected_clients_or_info_changed();
        self.reschedule_timers();
        if !bridged {
            debug!(instance = %info.instance_id, "band preference check (single-AP mode)");
        }
    }

    fn running_iface_status_changed(&mut self, up: bool) -> DispatchOutcome {
        if self.iface_up == up {
            return DispatchOutcome::Continue;
        }
        self.iface_up = up;
        if up {
            self.publish_state(ApState::Enabled);
            self.observers.on_started();
            self.registry.clear();
            self.radio_info.clear();
        } else if self.mailbox.send(Event::IfaceDown).is_err() {
            error!("failed to enqueue IfaceDown after interface went down");
        }
        DispatchOutcome::Continue
    }

    fn running_quit(&mut self, already_destroyed: bool) -> DispatchOutcome {
        self.exit_running(already_destroyed);
        self.observers.on_stopped();
        self.publish_state(ApState::Disabled);
        DispatchOutcome::Quit
    }

    fn running_failure(&mut self) -> DispatchOutcome {
        self.publish_state(ApState::Failed(FailureReason::General));
        self.exit_running(false);
        self.observers.on_stopped();
        DispatchOutcome::Quit
    }

    fn running_no_clients_timeout(&mut self) -> DispatchOutcome {
        if !self.config.auto_shutdown_enabled || self.registry.total_count() > 0 {
            error!("NoClientsTimeout fired while I4 did not hold; dropping");
            return DispatchOutcome::Continue;
        }
        self.observers.show_shutdown_expired_notification();
        self.running_quit(false)
    }

    fn running_iface_destroyed(&mut self) -> DispatchOutcome {
        self.iface_destroyed = true;
        self.running_quit(true)
    }

    fn running_update_capability(&mut self, cap: Capability) {
        if self.role != Role::Tethered {
            return;
        }
        self.set_capability(cap);
        debug!("capability updated");
        self.reevaluate_admission();
    }

    fn running_update_config(&mut self, cfg: ApConfiguration) {
        if restart_required(&self.config, &cfg) {
            warn!("UpdateConfig ignored: would require an AP restart");
            return;
        }
        let max_clients_changed = self.config.max_clients != cfg.max_clients;
        let timer_fields_changed = self.config.auto_shutdown_enabled != cfg.auto_shutdown_enabled
            || self.config.shutdown_timeout_ms != cfg.shutdown_timeout_ms
            || self.config.bridged_opportunistic_shutdown_enabled != cfg.bridged_opportunistic_shutdown_enabled;

        self.set_config(cfg);
        if max_clients_changed {
            self.max_clients_reported = false;
        }
        if timer_fields_changed {
            self.timers.cancel_all();
            self.reschedule_timers();
            self.rebroadcast_radio_info();
        }
        self.reevaluate_admission();
    }

    fn running_force_disconnect_pending(&mut self) {
        let iface = self.interface_name.clone().unwrap_or_default();
        let entries: Vec<_> = self.pending.iter().map(|(mac, reason)| (mac.clone(), *reason)).collect();
        for (mac, reason) in entries {
            if self.driver.force_client_disconnect(&iface, &mac, reason) {
                self.pending.remove(&mac);
            }
        }
        if !self.pending.is_empty() {
            self.schedule_force_disconnect_retry();
        }
    }

    fn running_bridged_idle_timeout(&mut self) {
        // The timer already fired and its task has run to completion;
        // acknowledge it unconditionally before evaluating anything else, so
        // that whatever `reschedule_timers` decides below can re-arm it
        // rather than seeing a stale "already armed" flag.
        self.timers.acknowledge_bridged_idle_fired();

        if !self.config.bridged_opportunistic_shutdown_enabled {
            error!("NoClientsTimeoutOneInstance fired while opportunistic shutdown disabled; dropping");
            return;
        }
        let idle = self.registry.idle_instances();
        if idle.is_empty() {
            self.reschedule_timers();
            return;
        }
        let chosen = idle
            .into_iter()
            .filter_map(|id| self.radio_info.get(&id).map(|info| (id, info.band.nominal_frequency_mhz())))
            .max_by_key(|(_, freq)| *freq)
            .map(|(id, _)| id);
        let Some(instance_id) = chosen else {
            self.reschedule_timers();
            return;
        };
        let iface = self.interface_name.clone().unwrap_or_default();
        self.driver.remove_instance_from_bridge(&iface, &instance_id);
        self.radio_info.shift_remove(&instance_id);
        self.registry.remove_instance(&instance_id);
        self.observers.on_connected_clients_or_info_changed();
        self.reschedule_timers();
    }

    // ── shared helpers ──

    fn exit_running(&mut self, already_destroyed: bool) {
        if !already_destroyed {
            self.stop_soft_ap();
        }
        self.coex.unregister();
        self.registry.clear();
        self.pending.clear();
        self.timers.cancel_all();
        if let Some(token) = self.force_disconnect_retry.take() {
            token.cancel();
        }
        self.publish_state(ApState::Disabling);
        self.radio_info.clear();
        self.observers.on_connected_clients_or_info_changed();
        self.interface_name = None;
        self.shared.interface_name.store(None);
    }

    fn stop_soft_ap(&mut self) {
        let iface = self.interface_name.clone().unwrap_or_default();
        let clients: Vec<_> = self.registry.list_all().cloned().collect();
        for client in clients {
            let _ = self.driver.force_client_disconnect(&iface, &client.mac, DisconnectReason::NoMoreStas);
        }
        self.driver.stop_logging(&iface);
        self.driver.teardown_interface(&iface);
    }

    fn issue_disconnect(&mut self, mac: crate::model::MacAddress, reason: DisconnectReason) {
        let iface = self.interface_name.clone().unwrap_or_default();
        if !self.driver.force_client_disconnect(&iface, &mac, reason) {
            self.pending.insert(mac, reason);
            self.schedule_force_disconnect_retry();
        }
    }

    fn schedule_force_disconnect_retry(&mut self) {
        if let Some(token) = self.force_disconnect_retry.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        let child = token.clone();
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(tokio::time::Duration::from_millis(RETRY_DELAY_MS)) => {
                    let _ = mailbox.send(Event::ForceDisconnectPending);
                }
                () = child.cancelled() => {}
            }
        });
        self.force_disconnect_retry = Some(token);
    }

    fn reevaluate_admission(&mut self) {
        let evictions = AdmissionPolicy::reevaluate(&self.config, &self.capability, &self.registry);
        if evictions.is_empty() {
            return;
        }
        for (client, reason) in evictions {
            self.registry.remove(&client.instance_id, &client.mac);
            self.issue_disconnect(client.mac, reason.into());
        }
        self.observers.on_connected_clients_or_info_changed();
        self.reschedule_timers();
    }

    fn rebroadcast_radio_info(&mut self) {
        let effective = self.effective_shutdown_timeout_ms();
        let ids: Vec<_> = self.radio_info.keys().cloned().collect();
        for id in ids {
            if let Some(info) = self.radio_info.get_mut(&id) {
                info.auto_shutdown_timeout_ms = effective;
            }
        }
        self.observers.on_connected_clients_or_info_changed();
    }

    fn reschedule_timers(&mut self) {
        if self.state != LifecycleState::Running {
            return;
        }
        let total_clients = self.registry.total_count();

        let should_arm_shutdown = self.config.auto_shutdown_enabled && total_clients == 0;
        if should_arm_shutdown {
            if !self.timers.shutdown_armed() {
                self.timers.arm_shutdown(self.effective_shutdown_timeout_ms(), self.mailbox.clone());
            }
        } else {
            self.timers.cancel_shutdown();
        }

        let bridged = self.config.is_bridged_mode();
        let multiple_instances = self.radio_info.len() > 1;
        let idle_present = total_clients == 0 || !self.registry.idle_instances().is_empty();
        let should_arm_bridged =
            bridged && self.config.bridged_opportunistic_shutdown_enabled && idle_present && multiple_instances;
        if should_arm_bridged {
            self.timers.arm_bridged_idle(self.capability_provider.default_bridged_idle_ms(), self.mailbox.clone());
        } else {
            self.timers.cancel_bridged_idle();
        }
    }

    fn effective_shutdown_timeout_ms(&self) -> u64 {
        if !self.config.auto_shutdown_enabled {
            return 0;
        }
        if self.config.shutdown_timeout_ms > 0 {
            self.config.shutdown_timeout_ms
        } else {
            self.capability_provider.default_shutdown_ms()
        }
    }

    fn publish_state(&mut self, state: ApState) {
        self.shared.state_name.store(Arc::new(state.to_string()));
        self.observers.on_state_changed(state);
        debug!(%state, "state published");
    }

    fn set_config(&mut self, cfg: ApConfiguration) {
        self.config = cfg.clone();
        self.shared.config.store(Arc::new(cfg));
    }

    fn set_capability(&mut self, cap: Capability) {
        self.capability = cap;
        self.shared.capability.store(Arc::new(cap));
    }
}

impl Drop for StateMachine {
    fn drop(&mut self) {
        if let Some(token) = self.force_disconnect_retry.take() {
            token.cancel();
        }
    }
}
