// ── ClientRegistry ──
//
// `instance_id -> insertion-ordered Client list`, owned solely
// by the dispatcher (never shared, never locked) — a single-owner access
// pattern, using `IndexMap`/`Vec` for deterministic iteration instead of a
// concurrent map with change notification, which solves a different
// problem: fan-out to many reader tasks. There is exactly one reader and
// writer here, so that reactive machinery would be dead weight.

use indexmap::IndexMap;
use tracing::error;

use crate::model::{Client, MacAddress, RadioInstanceId};

/// `instance_id -> insertion-ordered Client list`, plus a separate
/// cross-instance insertion order. `by_instance` alone isn't enough for
/// "global insertion order" (§4.2's eviction selection order, §4.4's
/// `oldest`/`list_all`): flattening its per-instance vectors in `IndexMap`
/// key order reflects the order *instances* were first seen, not the order
/// clients actually joined when two instances' associations interleave. The
/// `order` vec is the single source of truth for that chronology;
/// `by_instance` exists purely for the per-instance/idle-instance queries
/// §4.4 also names.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    by_instance: IndexMap<RadioInstanceId, Vec<Client>>,
    order: Vec<Client>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a client. Ensures an (possibly empty) entry exists for its
    /// instance even if it was never explicitly created.
    pub fn insert(&mut self, client: Client) {
        self.by_instance.entry(client.instance_id.clone()).or_default().push(client.clone());
        self.order.push(client);
    }

    /// Remove `(instance_id, mac)`. An unknown pair is logged as an
    /// internal-invariant violation and otherwise ignored.
    pub fn remove(&mut self, instance_id: &RadioInstanceId, mac: &MacAddress) {
        let Some(clients) = self.by_instance.get_mut(instance_id) else {
            error!(%instance_id, %mac, "remove of unknown instance from client registry");
            return;
        };
        let Some(pos) = clients.iter().position(|c| &c.mac == mac) else {
            error!(%instance_id, %mac, "remove of unknown client from client registry");
            return;
        };
        clients.remove(pos);
        if let Some(order_pos) = self.order.iter().position(|c| &c.mac == mac && &c.instance_id == instance_id) {
            self.order.remove(order_pos);
        }
    }

    /// Ensure an instance has an entry (possibly empty) —
    /// `ApInfoChanged`: "ensure an empty client list exists for the instance."
    pub fn ensure_instance(&mut self, instance_id: &RadioInstanceId) {
        self.by_instance.entry(instance_id.clone()).or_default();
    }

    /// Drop an instance's entry entirely.
    pub fn remove_instance(&mut self, instance_id: &RadioInstanceId) {
        self.by_instance.shift_remove(instance_id);
        self.order.retain(|c| &c.instance_id != instance_id);
    }

    pub fn clear(&mut self) {
        self.by_instance.clear();
        self.order.clear();
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.by_instance.values().any(|clients| clients.iter().any(|c| &c.mac == mac))
    }

    pub fn total_count(&self) -> usize {
        self.by_instance.values().map(Vec::len).sum()
    }

    /// All admitted clients, in true global insertion order.
    pub fn list_all(&self) -> impl Iterator<Item = &Client> {
        self.order.iter()
    }

    /// All clients for a single instance, in insertion order.
    pub fn list_instance(&self, instance_id: &RadioInstanceId) -> &[Client] {
        self.by_instance.get(instance_id).map_or(&[], Vec::as_slice)
    }

    /// Instances known to the registry with zero admitted clients. Only counts instances explicitly
    /// tracked via `ensure_instance`/`insert` — not every instance that has
    /// ever existed.
    pub fn idle_instances(&self) -> Vec<RadioInstanceId> {
        self.by_instance
            .iter()
            .filter(|(_, clients)| clients.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Oldest client across all instances, by global insertion order —
    /// used for capacity eviction.
    pub fn oldest(&self) -> Option<&Client> {
        self.order.first()
    }
}
