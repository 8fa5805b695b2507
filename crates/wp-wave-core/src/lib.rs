//! Wave Portal client core.
//!
//! `portal` binds the deployed contract, `session` holds what the page shows,
//! and `app` runs the load / connect / wave / watch flows against any
//! [`wp_chain_client::WalletProvider`].

pub mod app;
pub mod portal;
pub mod session;

#[cfg(test)]
mod mock;

pub use app::WaveApp;
pub use portal::{WaveEvent, WavePortal};
pub use session::{CountCache, MemoryCountCache, SessionState};
