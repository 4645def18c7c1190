// ── Radio instance info ──

use serde::{Deserialize, Serialize};
use std::fmt;

use super::band::Band;

/// Stable identifier for one per-band radio endpoint inside a (possibly
/// bridged) AP. Newtype over `String` so the registry/info map can't be
/// indexed with an unrelated string by accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RadioInstanceId(String);

impl RadioInstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RadioInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RadioInstanceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RadioInstanceId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Per-instance radio parameters reported by the driver.
///
/// `auto_shutdown_timeout_ms` is annotated with the *effective* shutdown
/// timeout by `StateMachine::on_ap_info_changed` before broadcast;
/// it is not copied verbatim from the driver report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioInstanceInfo {
    pub instance_id: RadioInstanceId,
    pub band: Band,
    /// Frequency in driver-native units (kHz or MHz, per driver convention).
    pub frequency: i64,
    pub bandwidth_code: i32,
    pub standard_code: i32,
    pub bssid: Option<String>,
    pub auto_shutdown_timeout_ms: u64,
}

impl RadioInstanceInfo {
    /// Equality ignoring `auto_shutdown_timeout_ms`, used by
    /// `StateMachine::on_ap_info_changed` to detect a genuine no-op update.
    pub fn same_radio_params(&self, other: &RadioInstanceInfo) -> bool {
        self.instance_id == other.instance_id
            && self.band == other.band
            && self.frequency == other.frequency
            && self.bandwidth_code == other.bandwidth_code
            && self.standard_code == other.standard_code
            && self.bssid == other.bssid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, freq: i64) -> RadioInstanceInfo {
        RadioInstanceInfo {
            instance_id: id.into(),
            band: Band::Ghz2_4,
            frequency: freq,
            bandwidth_code: 0,
            standard_code: 0,
            bssid: None,
            auto_shutdown_timeout_ms: 0,
        }
    }

    #[test]
    fn same_radio_params_ignores_timeout_annotation() {
        let mut a = info("wlan0", 2412);
        let mut b = a.clone();
        a.auto_shutdown_timeout_ms = 30_000;
        b.auto_shutdown_timeout_ms = 60_000;
        assert!(a.same_radio_params(&b));
    }

    #[test]
    fn differing_frequency_is_not_same() {
        let a = info("wlan0", 2412);
        let b = info("wlan0", 2437);
        assert!(!a.same_radio_params(&b));
    }
}
