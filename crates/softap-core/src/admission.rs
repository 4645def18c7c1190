// ── AdmissionPolicy ──
//
// five ordered rules, first match wins, plus a re-evaluation
// procedure run after a capability/config update. Pure decision logic —
// issuing the driver disconnect and queuing retries is the state machine's
// job, since that's what owns the collaborators.

use crate::capability::Capability;
use crate::collaborators::DisconnectReason;
use crate::config::ApConfiguration;
use crate::model::{Client, MacAddress};
use crate::registry::ClientRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    BlockedByUser,
    NoMoreStas,
}

impl From<RejectReason> for DisconnectReason {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::BlockedByUser => DisconnectReason::BlockedByUser,
            RejectReason::NoMoreStas => DisconnectReason::NoMoreStas,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    Reject(RejectReason),
    /// Rule 3's "notify + reject" path additionally wants the observer hook
    /// fired on the caller's side, so it's flagged distinctly from a plain
    /// blocked-list reject even though the driver reason is the same.
    RejectNotifyBlocked,
}

pub struct AdmissionPolicy;

impl AdmissionPolicy {
    /// Evaluates the five admission rules in order, short-circuiting on
    /// the first match.
    pub fn evaluate(
        config: &ApConfiguration,
        capability: &Capability,
        mac: &MacAddress,
        registry: &ClientRegistry,
    ) -> Admission {
        // Rule 1: cannot enforce without force-disconnect support.
        if !capability.client_force_disconnect {
            return Admission::Accept;
        }
        // Rule 2.
        if config.is_explicitly_blocked(mac) {
            return Admission::Reject(RejectReason::BlockedByUser);
        }
        // Rule 3.
        if !config.is_allowed_when_controlled(mac) {
            return Admission::RejectNotifyBlocked;
        }
        // Rule 4.
        let cap = capability.effective_client_cap(config.max_clients);
        if registry.total_count() as u32 >= cap {
            return Admission::Reject(RejectReason::NoMoreStas);
        }
        // Rule 5.
        Admission::Accept
    }

    /// Re-evaluation after `UpdateCapability`/`UpdateConfig`:
    /// evict blocked/disallowed clients first, then evict by insertion order
    /// until at or below `cap`. Returns the clients to evict, in the order
    /// they should be disconnected.
    pub fn reevaluate(
        config: &ApConfiguration,
        capability: &Capability,
        registry: &ClientRegistry,
    ) -> Vec<(Client, RejectReason)> {
        let mut evictions = Vec::new();
        let mut remaining: Vec<Client> = Vec::new();

        for client in registry.list_all() {
            if config.is_explicitly_blocked(&client.mac) {
                evictions.push((client.clone(), RejectReason::BlockedByUser));
            } else if !config.is_allowed_when_controlled(&client.mac) {
                evictions.push((client.clone(), RejectReason::BlockedByUser));
            } else {
                remaining.push(client.clone());
            }
        }

        let cap = capability.effective_client_cap(config.max_clients) as usize;
        if remaining.len() > cap {
            let overflow = remaining.len() - cap;
            for client in remaining.into_iter().take(overflow) {
                evictions.push((client, RejectReason::NoMoreStas));
            }
        }

        evictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Band;
    use std::collections::BTreeSet;

    fn cap(max_supported: u32, force_disconnect: bool) -> Capability {
        Capability {
            max_supported_clients: max_supported,
            mac_address_customization: true,
            client_force_disconnect: force_disconnect,
            acs_offload: false,
        }
    }

    fn config() -> ApConfiguration {
        ApConfiguration {
            ssid: "net".into(),
            bssid: None,
            bssid_was_randomized: false,
            bands: crate::model::BandMask::single(Band::Ghz2_4),
            security: crate::config::SecurityMode::Open,
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

    #[test]
    fn rule1_accepts_when_force_disconnect_unsupported() {
        let cfg = config();
        let capability = cap(1, false);
        let reg = ClientRegistry::new();
        let mac = MacAddress::new("aa:bb:cc:dd:ee:01");
        assert_eq!(AdmissionPolicy::evaluate(&cfg, &capability, &mac, &reg), Admission::Accept);
    }

    #[test]
    fn rule2_rejects_blocked_mac() {
        let mut cfg = config();
        let mac = MacAddress::new("aa:bb:cc:dd:ee:01");
        cfg.blocked_macs.insert(mac.clone());
        let capability = cap(8, true);
        let reg = ClientRegistry::new();
        assert_eq!(
            AdmissionPolicy::evaluate(&cfg, &capability, &mac, &reg),
            Admission::Reject(RejectReason::BlockedByUser)
        );
    }

    #[test]
    fn rule3_rejects_unlisted_when_controlled() {
        let mut cfg = config();
        cfg.client_control_enabled = true;
        let capability = cap(8, true);
        let reg = ClientRegistry::new();
        let mac = MacAddress::new("aa:bb:cc:dd:ee:01");
        assert_eq!(AdmissionPolicy::evaluate(&cfg, &capability, &mac, &reg), Admission::RejectNotifyBlocked);
    }

    #[test]
    fn rule4_rejects_at_capacity() {
        let cfg = config();
        let capability = cap(1, true);
        let mut reg = ClientRegistry::new();
        reg.insert(Client::new("aa:bb:cc:dd:ee:01", "wlan0"));
        let mac = MacAddress::new("aa:bb:cc:dd:ee:02");
        assert_eq!(
            AdmissionPolicy::evaluate(&cfg, &capability, &mac, &reg),
            Admission::Reject(RejectReason::NoMoreStas)
        );
    }

    #[test]
    fn reevaluate_evicts_blocked_then_overflow_by_insertion_order() {
        let mut cfg = config();
        let blocked = MacAddress::new("aa:bb:cc:dd:ee:02");
        cfg.blocked_macs.insert(blocked.clone());
        cfg.max_clients = 1;
        let capability = cap(8, true);
        let mut reg = ClientRegistry::new();
        reg.insert(Client::new("aa:bb:cc:dd:ee:01", "wlan0"));
        reg.insert(Client::new("aa:bb:cc:dd:ee:02", "wlan0"));
        reg.insert(Client::new("aa:bb:cc:dd:ee:03", "wlan0"));

        let evictions = AdmissionPolicy::reevaluate(&cfg, &capability, &reg);
        assert_eq!(evictions.len(), 2);
        assert_eq!(evictions[0].0.mac, blocked);
        assert_eq!(evictions[0].1, RejectReason::BlockedByUser);
        assert_eq!(evictions[1].0.mac.as_str(), "aa:bb:cc:dd:ee:01");
        assert_eq!(evictions[1].1, RejectReason::NoMoreStas);
    }
}
