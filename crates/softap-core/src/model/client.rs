// ── Client domain type ──
//
// Trimmed to the two fields a station is
// identified by MAC address plus the radio instance it associated to.

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;
use super::radio::RadioInstanceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub mac: MacAddress,
    pub instance_id: RadioInstanceId,
}

impl Client {
    pub fn new(mac: impl Into<MacAddress>, instance_id: impl Into<RadioInstanceId>) -> Self {
        Self { mac: mac.into(), instance_id: instance_id.into() }
    }
}
