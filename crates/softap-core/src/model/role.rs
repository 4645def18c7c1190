// ── Role ──
//
// Assigned at construction and immutable thereafter. Gates
// `UpdateCapability` acceptance in both `Idle` and `Running` — accepted
// only when the target mode is tethered.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// AP's IP plane is local-only.
    Local,
    /// AP's IP plane is attached to the device's upstream connection.
    Tethered,
}
