// ── AP configuration ──
//
// Immutable value type. Replaced wholesale — never mutated in
// place — which is what lets `SoftApLifecycle` hold it in an `ArcSwap` and
// satisfy "replaced atomically" without a lock.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{BandMask, MacAddress};

/// Opaque security mode identifier.
///
/// WPA/authentication details are explicitly out of scope here; this exists
/// only so the restart-required predicate has something to compare — no key
/// exchange or auth protocol logic lives in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SecurityMode {
    Open,
    WpaPersonal,
    WpaEnterprise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApConfiguration {
    pub ssid: String,
    /// `None` means "randomize if supported".
    pub bssid: Option<String>,
    /// Set by `ConfigStore::randomize_bssid_if_unset` when it fills `bssid`
    /// in with a framework-chosen address rather than a user-supplied one
    ///. Used only by
    /// `restart_required`'s carve-out: going from a
    /// randomized `bssid` back to `None` ("randomize again") is not a
    /// meaningful change and must not force a restart.
    #[serde(default)]
    pub bssid_was_randomized: bool,
    pub bands: BandMask,
    pub security: SecurityMode,
    pub hidden: bool,
    pub blocked_macs: BTreeSet<MacAddress>,
    pub allowed_macs: BTreeSet<MacAddress>,
    pub client_control_enabled: bool,
    /// `0` means unlimited by user (still bounded by `Capability::max_supported_clients`).
    pub max_clients: u32,
    /// `0` means "use capability-provided default".
    pub shutdown_timeout_ms: u64,
    pub auto_shutdown_enabled: bool,
    pub bridged_opportunistic_shutdown_enabled: bool,
}

impl ApConfiguration {
    /// `true` iff `bands` names more than one band.
    pub fn is_bridged_mode(&self) -> bool {
        self.bands.is_bridged()
    }

    /// `true` iff `mac` is in neither `blocked_macs` nor excluded by
    /// `client_control_enabled`'s allow-list. Used by `AdmissionPolicy`.
    pub fn is_explicitly_blocked(&self, mac: &MacAddress) -> bool {
        self.blocked_macs.contains(mac)
    }

    pub fn is_allowed_when_controlled(&self, mac: &MacAddress) -> bool {
        !self.client_control_enabled || self.allowed_macs.contains(mac)
    }
}

/// Restart-required predicate.
///
/// Fields that do **not** require a restart: blocked list, allowed list,
/// `client_control_enabled`, `max_clients`, `shutdown_timeout_ms`,
/// `auto_shutdown_enabled`, `bridged_opportunistic_shutdown_enabled`, and
/// BSSID specifically "when the old BSSID was randomized and the new one is
/// null" — that transition is just "randomize again", so it's carved out of
/// the plain `bssid` comparison below.
pub fn restart_required(old: &ApConfiguration, new: &ApConfiguration) -> bool {
    let bssid_changed = if old.bssid_was_randomized && new.bssid.is_none() {
        false
    } else {
        old.bssid != new.bssid
    };
    old.ssid != new.ssid
        || old.security != new.security
        || old.bands != new.bands
        || old.hidden != new.hidden
        || bssid_changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Band;

    fn base() -> ApConfiguration {
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

    #[test]
    fn ssid_change_requires_restart() {
        let old = base();
        let mut new = base();
        new.ssid = "other".into();
        assert!(restart_required(&old, &new));
    }

    #[test]
    fn max_clients_change_does_not_require_restart() {
        let old = base();
        let mut new = base();
        new.max_clients = 4;
        assert!(!restart_required(&old, &new));
    }

    #[test]
    fn blocked_list_change_does_not_require_restart() {
        let old = base();
        let mut new = base();
        new.blocked_macs.insert(MacAddress::new("aa:bb:cc:dd:ee:ff"));
        assert!(!restart_required(&old, &new));
    }

    #[test]
    fn both_bssid_randomized_does_not_require_restart() {
        let old = base();
        let new = base();
        assert!(!restart_required(&old, &new));
    }

    #[test]
    fn randomized_bssid_reverting_to_null_does_not_require_restart() {
        let mut old = base();
        old.bssid = Some("de:ad:be:ef:00:01".into());
        old.bssid_was_randomized = true;
        let new = base();
        assert!(!restart_required(&old, &new));
    }

    #[test]
    fn non_randomized_bssid_change_requires_restart() {
        let mut old = base();
        old.bssid = Some("de:ad:be:ef:00:01".into());
        let new = base();
        assert!(restart_required(&old, &new));
    }

    #[test]
    fn band_change_requires_restart() {
        let old = base();
        let mut new = base();
        new.bands = BandMask::from_bands([Band::Ghz2_4, Band::Ghz5]);
        assert!(restart_required(&old, &new));
    }
}
