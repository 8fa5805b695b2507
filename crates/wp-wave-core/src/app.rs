//! Page controller.
//!
//! Owns the [`SessionState`] and runs every user-visible flow. Each state
//! change is pushed to the registered listener so the UI can re-render.
//! State is never borrowed across an `.await`.

use anyhow::{Context, Result, anyhow};
use std::cell::{Cell, RefCell};
use tracing::info;
use wp_api_types::{Address, TxHash, Wave};
use wp_chain_client::WalletProvider;

use crate::portal::{WaveEvent, WavePortal};
use crate::session::{CountCache, SessionState};

type Listener = Box<dyn Fn(&SessionState)>;

pub struct WaveApp<P, C> {
    portal: WavePortal<P>,
    cache: C,
    state: RefCell<SessionState>,
    listener: RefCell<Option<Listener>>,
    /// Next block to scan for `NewWave`; `None` until `start_watch`.
    watch_cursor: Cell<Option<u64>>,
    /// Head block just before and just after the last `getAllWaves` read.
    /// Logs at or below the first bound are already in the list; logs up to
    /// the second one may be.
    history_span: Cell<Option<(u64, u64)>>,
    polling: Cell<bool>,
}

impl<P: WalletProvider, C: CountCache> WaveApp<P, C> {
    pub fn new(portal: WavePortal<P>, cache: C) -> Self {
        let state = SessionState {
            wave_count: cache.load().unwrap_or(0),
            ..SessionState::default()
        };
        Self {
            portal,
            cache,
            state: RefCell::new(state),
            listener: RefCell::new(None),
            watch_cursor: Cell::new(None),
            history_span: Cell::new(None),
            polling: Cell::new(false),
        }
    }

    pub fn portal(&self) -> &WavePortal<P> {
        &self.portal
    }

    pub fn on_change(&self, listener: impl Fn(&SessionState) + 'static) {
        *self.listener.borrow_mut() = Some(Box::new(listener));
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let snapshot = {
            let mut state = self.state.borrow_mut();
            f(&mut state);
            state.clone()
        };
        if let Some(listener) = self.listener.borrow().as_ref() {
            listener(&snapshot);
        }
    }

    // ── Account ──

    /// Adopt an already-authorized account, if the wallet reports one.
    pub async fn bootstrap(&self) -> Result<Option<Address>> {
        let accounts = self
            .portal
            .provider()
            .accounts()
            .await
            .context("eth_accounts failed")?;
        match accounts.into_iter().next() {
            Some(account) => {
                info!(%account, "found an authorized account");
                self.adopt(account.clone()).await?;
                Ok(Some(account))
            }
            None => {
                info!("no authorized account found");
                Ok(None)
            }
        }
    }

    /// Prompt the wallet for authorization and adopt the first account.
    pub async fn connect(&self) -> Result<Address> {
        let accounts = self
            .portal
            .provider()
            .request_accounts()
            .await
            .context("wallet authorization failed")?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("wallet authorized no accounts"))?;
        info!(%account, "connected");
        self.adopt(account.clone()).await?;
        Ok(account)
    }

    async fn adopt(&self, account: Address) -> Result<()> {
        self.update(|s| s.account = Some(account));
        self.refresh().await
    }

    // ── Reads ──

    /// Re-read count and history. Both reads run even if one fails.
    pub async fn refresh(&self) -> Result<()> {
        let count = self.refresh_count().await;
        let waves = self.refresh_waves().await;
        count?;
        waves
    }

    pub async fn refresh_count(&self) -> Result<u64> {
        let count = self.portal.total_waves().await?;
        info!(count, "retrieved total wave count");
        self.update(|s| s.wave_count = count);
        self.cache.store(count);
        Ok(count)
    }

    pub async fn refresh_waves(&self) -> Result<()> {
        let first = self.portal.latest_block().await?;
        let waves = self.portal.all_waves().await?;
        let last = self.portal.latest_block().await?;
        info!(count = waves.len(), block = first, "got waves");
        self.history_span.set(Some((first, last.max(first))));
        self.update(|s| s.waves = waves);
        Ok(())
    }

    // ── Waving ──

    pub fn set_draft(&self, text: &str) {
        if self.state.borrow().draft == text {
            return;
        }
        self.update(|s| s.draft = text.to_owned());
    }

    /// Send the current draft, clear it, wait for mining, then re-read the count.
    pub async fn submit_wave(&self) -> Result<TxHash> {
        let (account, message) = {
            let state = self.state.borrow();
            (state.account.clone(), state.draft.clone())
        };
        let account = account.ok_or_else(|| anyhow!("connect a wallet before waving"))?;

        let before = self.portal.total_waves().await?;
        info!(count = before, "retrieved total wave count");

        let tx_hash = self.portal.wave(&account, &message).await?;
        self.update(|s| {
            s.draft.clear();
            s.pending_tx = Some(tx_hash.clone());
        });
        info!(%tx_hash, "mining");

        let mined = self.portal.wait_mined(&tx_hash).await;
        self.update(|s| s.pending_tx = None);
        let receipt = mined?;
        info!(%tx_hash, block = receipt.block_number, "mined");

        self.refresh_count().await?;
        Ok(tx_hash)
    }

    // ── NewWave subscription ──

    /// Start listening right after the last history read, or after the
    /// current head if the history has not been read yet.
    pub async fn start_watch(&self) -> Result<()> {
        let from = match self.history_span.get() {
            Some((first, _)) => first.saturating_add(1),
            None => self.portal.latest_block().await?.saturating_add(1),
        };
        self.watch_cursor.set(Some(from));
        info!(from_block = from, "watching for NewWave events");
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.watch_cursor.get().is_some()
    }

    /// Pull `NewWave` events since the last poll. Returns how many were new.
    /// A poll that starts while another is in flight does nothing.
    pub async fn poll_new_waves(&self) -> Result<usize> {
        let Some(from) = self.watch_cursor.get() else {
            return Ok(0);
        };
        if self.polling.replace(true) {
            return Ok(0);
        }
        let result = self.poll_from(from).await;
        self.polling.set(false);
        result
    }

    async fn poll_from(&self, from: u64) -> Result<usize> {
        let head = self.portal.latest_block().await?;
        if head < from {
            return Ok(0);
        }
        let events = self.portal.new_waves(from, head).await?;
        self.watch_cursor.set(Some(head.saturating_add(1)));

        let span = self.history_span.get();
        let mut added = 0;
        for WaveEvent { block_number, wave } in events {
            info!(from = %wave.waver, timestamp = wave.timestamp, message = %wave.message, "NewWave");
            let appended = match span {
                Some((first, _)) if block_number <= first => false,
                Some((_, last)) if block_number <= last => self.apply_new_wave(wave),
                _ => {
                    self.update(|s| s.waves.push(wave));
                    true
                }
            };
            if appended {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Append a wave unless an identical one is already listed. Used for
    /// events that may or may not be part of the last history read.
    pub fn apply_new_wave(&self, wave: Wave) -> bool {
        if self.state.borrow().waves.contains(&wave) {
            return false;
        }
        self.update(|s| s.waves.push(wave));
        true
    }
}
