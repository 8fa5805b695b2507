//! localStorage-backed wave count cache.

use gloo_storage::{LocalStorage, Storage};
use tracing::warn;
use wp_wave_core::CountCache;

pub const COUNT_KEY: &str = "wave_portal.wave_count";

/// Last count read from the contract, shown until the first live read lands.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalCountCache;

impl CountCache for LocalCountCache {
    fn load(&self) -> Option<u64> {
        LocalStorage::get(COUNT_KEY).ok()
    }

    fn store(&self, count: u64) {
        if let Err(e) = LocalStorage::set(COUNT_KEY, count) {
            warn!("could not cache wave count: {e}");
        }
    }
}
