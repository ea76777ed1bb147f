//! Process-wide response cache keyed by content fingerprint.
//!
//! The key is content-derived, not session-derived, so any session's turn can
//! populate or hit any entry. Writes are last-writer-wins: a lost computation
//! is acceptable because analysis resolution is pure and idempotent. The lock
//! is a plain std mutex and is never held across an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use pulse_core::ResolvedAnalysis;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Clone, Debug)]
struct CacheSlot {
    analysis: ResolvedAnalysis,
    inserted_at: Instant,
    /// Monotonic insertion order; eviction ties on `inserted_at` are
    /// resolved by this.
    seq: u64,
}

#[derive(Debug)]
pub struct ResponseCache {
    slots: Mutex<HashMap<String, CacheSlot>>,
    ttl: Duration,
    capacity: usize,
    next_seq: AtomicU64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { slots: Mutex::new(HashMap::new()), ttl, capacity, next_seq: AtomicU64::new(0) }
    }

    pub fn get(&self, key: &str) -> Option<ResolvedAnalysis> {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match slots.get(key) {
            Some(slot) if slot.inserted_at.elapsed() < self.ttl => Some(slot.analysis.clone()),
            Some(_) => {
                slots.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, analysis: ResolvedAnalysis) {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let ttl = self.ttl;
        slots.retain(|_, slot| slot.inserted_at.elapsed() < ttl);

        while slots.len() >= self.capacity {
            let oldest_key =
                slots.iter().min_by_key(|(_, slot)| slot.seq).map(|(key, _)| key.clone());
            match oldest_key {
                Some(oldest) => slots.remove(&oldest),
                None => break,
            };
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        slots.insert(key, CacheSlot { analysis, inserted_at: Instant::now(), seq });
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
