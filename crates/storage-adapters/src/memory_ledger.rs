//! `AbuseLedger` backed by a sharded concurrent map.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{AbuseLedger, Identity};
use tracing::trace;

/// Identity → last time an abuse alert was claimed.
///
/// `try_claim` goes through the map's entry API, which holds the shard lock
/// for the whole check-and-record, so two submissions from one identity can
/// never both win the same window.
#[derive(Debug, Default)]
pub struct MemoryAbuseLedger {
    entries: DashMap<Identity, DateTime<Utc>>,
}

impl MemoryAbuseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_notified(&self, identity: &Identity) -> Option<DateTime<Utc>> {
        self.entries.get(identity).map(|e| *e.value())
    }
}

impl AbuseLedger for MemoryAbuseLedger {
    fn try_claim(&self, identity: &Identity, now: DateTime<Utc>, window: TimeDelta) -> bool {
        match self.entries.entry(identity.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
            Entry::Occupied(mut slot) => {
                if now - *slot.get() > window {
                    slot.insert(now);
                    true
                } else {
                    trace!(%identity, "claim rejected inside window");
                    false
                }
            }
        }
    }

    fn sweep(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, last| {
            let keep = *last >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
