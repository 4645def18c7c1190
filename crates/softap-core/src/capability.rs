// ── Hardware / carrier capability ──
//
// Replaceable value. Unlike `ApConfiguration`, updates to this
// arrive from the platform (`UpdateCapability`), not the orchestrator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub max_supported_clients: u32,
    pub mac_address_customization: bool,
    pub client_force_disconnect: bool,
    pub acs_offload: bool,
}

impl Capability {
    /// The effective client cap given a user-requested `max_clients`
    /// (`0` = unlimited by user), clamped to `max_supported_clients`.
    pub fn effective_client_cap(&self, user_max_clients: u32) -> u32 {
        if user_max_clients == 0 {
            self.max_supported_clients
        } else {
            self.max_supported_clients.min(user_max_clients)
        }
    }
}
