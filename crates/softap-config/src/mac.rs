// ── BSSID randomization ──
//
// The workspace carries no `rand` dependency, so a locally-administered MAC
// is synthesized by hashing a monotonically increasing counter together
// with wall-clock time and the process id — enough entropy to avoid
// collisions between calls without pulling in a dedicated RNG crate for one
// call site.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A colon-separated, locally-administered, unicast MAC address.
pub(crate) fn random_locally_administered() -> String {
    let mut hasher = DefaultHasher::new();
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos());
    nanos.hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    COUNTER.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    let bytes = hasher.finish().to_be_bytes();

    // Clear the multicast bit, set the locally-administered bit, on the
    // first octet (IEEE 802 convention).
    let first = (bytes[0] & 0b1111_1100) | 0b0000_0010;
    format!("{first:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", bytes[1], bytes[2], bytes[3], bytes[4], bytes[5])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_locally_administered_unicast_address() {
        let mac = random_locally_administered();
        let first_octet = u8::from_str_radix(&mac[0..2], 16).expect("valid hex octet");
        assert_eq!(first_octet & 0b0000_0001, 0, "must be unicast");
        assert_eq!(first_octet & 0b0000_0010, 0b0000_0010, "must be locally administered");
    }

    #[test]
    fn successive_calls_differ() {
        let a = random_locally_administered();
        let b = random_locally_administered();
        assert_ne!(a, b);
    }
}
