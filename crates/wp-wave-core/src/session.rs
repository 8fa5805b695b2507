use std::cell::Cell;
use wp_api_types::{Address, TxHash, Wave};

/// Everything the page renders. Owned by [`crate::WaveApp`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub account: Option<Address>,
    /// Last successful `getTotalWaves()` read, or the cached value before one.
    pub wave_count: u64,
    /// Contract order, oldest first.
    pub waves: Vec<Wave>,
    pub draft: String,
    pub pending_tx: Option<TxHash>,
}

impl SessionState {
    pub fn needs_connect(&self) -> bool {
        self.account.is_none()
    }

    /// Waves newest first.
    pub fn feed(&self) -> impl Iterator<Item = &Wave> {
        self.waves.iter().rev()
    }

    pub fn is_mining(&self) -> bool {
        self.pending_tx.is_some()
    }
}

/// Persistent mirror of the wave count. Best effort: no reconciliation.
pub trait CountCache {
    fn load(&self) -> Option<u64>;
    fn store(&self, count: u64);
}

#[derive(Debug, Default)]
pub struct MemoryCountCache {
    value: Cell<Option<u64>>,
}

impl MemoryCountCache {
    pub fn with(count: u64) -> Self {
        Self {
            value: Cell::new(Some(count)),
        }
    }
}

impl CountCache for MemoryCountCache {
    fn load(&self) -> Option<u64> {
        self.value.get()
    }

    fn store(&self, count: u64) {
        self.value.set(Some(count));
    }
}
