use parking_lot::Mutex;
use std::collections::HashMap;

/// Per-nonce use counter feeding the `nc` field.
///
/// Entries are never evicted: a long-lived tracker that sees many distinct server nonces keeps
/// one small entry for each of them.
#[derive(Debug, Default)]
pub struct NonceTracker {
    counts: Mutex<HashMap<String, u32>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more use of `nonce` and return the new count, starting at 1.
    ///
    /// Concurrent callers for the same nonce each get a distinct value, up to `u32::MAX`
    /// (`nc=ffffffff`, the largest value the 8 hex digit field can carry). From there on the
    /// count stays at `u32::MAX`, so values repeat; a server is expected to have issued a
    /// fresh nonce long before that.
    pub fn increment(&self, nonce: &str) -> u32 {
        let mut counts = self.counts.lock();
        let nc = match counts.get_mut(nonce) {
            Some(nc) => {
                *nc = nc.saturating_add(1);
                *nc
            }
            None => {
                counts.insert(nonce.to_string(), 1);
                1
            }
        };
        tracing::trace!(nc, "nonce counter incremented");
        nc
    }

    /// Current count for `nonce`, 0 if it was never used
    pub fn count(&self, nonce: &str) -> u32 {
        self.counts.lock().get(nonce).copied().unwrap_or(0)
    }

    /// Number of distinct nonces seen
    pub fn len(&self) -> usize {
        self.counts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }
}
