//! Wallet session lifecycle: `Disconnected → Connecting → Connected`.
//!
//! The session is the only writer of its own state. While connected, a
//! periodic task refreshes the wallet balance; the task is tied to the
//! connection through a cancellation token and stops deterministically on
//! disconnect. Balance refresh is stale-on-error: a failed fetch keeps the
//! previous value.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use omniyield_core::events::VaultEvent;

use crate::config::Network;
use crate::error::{ClientError, Result};
use crate::provider::{WalletAccount, WalletProvider};
use crate::store::{self, KvStore, KEY_SESSION_CONNECTED, KEY_SESSION_KEY_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(WalletAccount),
}

struct SessionInner {
    state: SessionState,
    balance: u64,
    network: Network,
    refresh: Option<CancellationToken>,
}

/// Cheaply cloneable handle to the wallet session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<RwLock<SessionInner>>,
    provider: Arc<dyn WalletProvider>,
    store: Arc<dyn KvStore>,
    events: broadcast::Sender<VaultEvent>,
    balance_refresh_interval: Duration,
}

impl WalletSession {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        store: Arc<dyn KvStore>,
        events: broadcast::Sender<VaultEvent>,
        network: Network,
        balance_refresh_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                state: SessionState::Disconnected,
                balance: 0,
                network,
                refresh: None,
            })),
            provider,
            store,
            events,
            balance_refresh_interval,
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.read().unwrap().state.clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.inner.read().unwrap().state, SessionState::Connected(_))
    }

    pub fn account(&self) -> Option<WalletAccount> {
        match &self.inner.read().unwrap().state {
            SessionState::Connected(account) => Some(account.clone()),
            _ => None,
        }
    }

    pub fn balance(&self) -> u64 {
        self.inner.read().unwrap().balance
    }

    pub fn network(&self) -> Network {
        self.inner.read().unwrap().network
    }

    pub fn switch_network(&self, network: Network) {
        self.inner.write().unwrap().network = network;
        info!(?network, "switched network");
    }

    /// Request a wallet connection. A failure is terminal for this attempt
    /// and leaves the session disconnected.
    pub async fn connect(&self) -> Result<WalletAccount> {
        {
            let mut inner = self.inner.write().unwrap();
            if let SessionState::Connected(account) = &inner.state {
                return Ok(account.clone());
            }
            inner.state = SessionState::Connecting;
        }

        let account = match self.provider.connect().await {
            Ok(account) => account,
            Err(err) => {
                self.inner.write().unwrap().state = SessionState::Disconnected;
                warn!(error = %err, "wallet connect failed");
                return Err(err.into());
            }
        };

        let balance = match self.provider.fetch_balance(&account).await {
            Ok(balance) => balance,
            Err(err) => {
                debug!(error = %err, "initial balance fetch failed");
                0
            }
        };

        let token = CancellationToken::new();
        {
            let mut inner = self.inner.write().unwrap();
            inner.state = SessionState::Connected(account.clone());
            inner.balance = balance;
            inner.refresh = Some(token.clone());
        }

        self.persist(&account);
        let _ = self.events.send(VaultEvent::SessionConnected {
            public_key: account.public_key.clone(),
        });
        info!(public_key = %account.public_key, "wallet connected");

        self.spawn_balance_refresh(token);
        Ok(account)
    }

    /// Unconditional disconnect; never fails from the caller's perspective.
    pub fn disconnect(&self) {
        let token = {
            let mut inner = self.inner.write().unwrap();
            inner.state = SessionState::Disconnected;
            inner.balance = 0;
            inner.refresh.take()
        };
        if let Some(token) = token {
            token.cancel();
        }

        for key in [KEY_SESSION_CONNECTED, KEY_SESSION_KEY_ID] {
            if let Err(err) = self.store.remove(key) {
                warn!(key, error = %err, "failed to clear persisted session");
            }
        }
        let _ = self.events.send(VaultEvent::SessionDisconnected);
        info!("wallet disconnected");
    }

    /// Best-effort resume of a persisted session. Anything missing or
    /// unreadable leaves the session disconnected without an error.
    pub async fn restore(&self) -> bool {
        // a live session already owns a refresh task; nothing to resume
        if self.is_connected() {
            return true;
        }

        let connected: Option<bool> = store::load(self.store.as_ref(), KEY_SESSION_CONNECTED);
        let key_id: Option<String> = store::load(self.store.as_ref(), KEY_SESSION_KEY_ID);
        let (Some(true), Some(key_id)) = (connected, key_id) else {
            return false;
        };

        let account = WalletAccount::from_public_key(key_id);
        let balance = self
            .provider
            .fetch_balance(&account)
            .await
            .unwrap_or_default();

        let token = CancellationToken::new();
        {
            let mut inner = self.inner.write().unwrap();
            inner.state = SessionState::Connected(account.clone());
            inner.balance = balance;
            inner.refresh = Some(token.clone());
        }
        let _ = self.events.send(VaultEvent::SessionConnected {
            public_key: account.public_key.clone(),
        });
        info!(public_key = %account.public_key, "restored wallet session");

        self.spawn_balance_refresh(token);
        true
    }

    /// One balance refresh. Failures are swallowed and the previous balance
    /// is retained.
    pub async fn refresh_balance(&self) {
        let Some(account) = self.account() else {
            return;
        };
        match self.provider.fetch_balance(&account).await {
            Ok(balance) => {
                let mut inner = self.inner.write().unwrap();
                // the session may have disconnected while the fetch was in flight
                if matches!(inner.state, SessionState::Connected(_)) {
                    inner.balance = balance;
                }
            }
            Err(err) => debug!(error = %err, "balance refresh failed, keeping stale value"),
        }
    }

    pub async fn sign_message(&self, message: &str) -> Result<String> {
        let account = self.account().ok_or(ClientError::NotConnected)?;
        self.provider
            .sign_message(&account, message)
            .await
            .map_err(|err| ClientError::BackendUnavailable(err.to_string()))
    }

    fn persist(&self, account: &WalletAccount) {
        if let Err(err) = store::save(self.store.as_ref(), KEY_SESSION_CONNECTED, &true) {
            warn!(error = %err, "failed to persist session flag");
        }
        if let Err(err) = store::save(
            self.store.as_ref(),
            KEY_SESSION_KEY_ID,
            &account.public_key,
        ) {
            warn!(error = %err, "failed to persist session key");
        }
    }

    fn spawn_balance_refresh(&self, token: CancellationToken) {
        let session = self.clone();
        let interval = self.balance_refresh_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // immediate first tick
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => session.refresh_balance().await,
                }
            }
            debug!("balance refresh task stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubProvider {
        balance: u64,
        reject: bool,
        fail_balance: Arc<AtomicBool>,
    }

    impl StubProvider {
        fn new(balance: u64) -> Self {
            Self {
                balance,
                reject: false,
                fail_balance: Arc::new(AtomicBool::new(false)),
            }
        }

        fn rejecting() -> Self {
            Self {
                reject: true,
                ..Self::new(0)
            }
        }
    }

    #[async_trait]
    impl WalletProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn connect(&self) -> std::result::Result<WalletAccount, ConnectError> {
            if self.reject {
                return Err(ConnectError::UserRejected);
            }
            Ok(WalletAccount::from_public_key("0202stubstubstubstub"))
        }

        async fn fetch_balance(&self, _account: &WalletAccount) -> anyhow::Result<u64> {
            if self.fail_balance.load(Ordering::SeqCst) {
                anyhow::bail!("node unreachable");
            }
            Ok(self.balance)
        }

        async fn sign_message(
            &self,
            _account: &WalletAccount,
            message: &str,
        ) -> anyhow::Result<String> {
            Ok(format!("signed:{message}"))
        }
    }

    fn session_with(provider: StubProvider, store: Arc<MemoryStore>) -> WalletSession {
        let (events, _) = broadcast::channel(16);
        WalletSession::new(
            Arc::new(provider),
            store,
            events,
            Network::Testnet,
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_connect_persists_and_sets_balance() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(StubProvider::new(5_000_000_000), store.clone());

        let account = session.connect().await.unwrap();
        assert!(session.is_connected());
        assert_eq!(session.balance(), 5_000_000_000);
        assert_eq!(
            store::load::<bool>(store.as_ref(), KEY_SESSION_CONNECTED),
            Some(true)
        );
        assert_eq!(
            store::load::<String>(store.as_ref(), KEY_SESSION_KEY_ID),
            Some(account.public_key),
        );
    }

    #[tokio::test]
    async fn test_rejected_connect_falls_back_to_disconnected() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(StubProvider::rejecting(), store.clone());

        let err = session.connect().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Connect(ConnectError::UserRejected)
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(
            store::load::<bool>(store.as_ref(), KEY_SESSION_CONNECTED),
            None
        );
    }

    #[tokio::test]
    async fn test_disconnect_clears_state_and_store() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(StubProvider::new(10), store.clone());

        session.connect().await.unwrap();
        session.disconnect();

        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.balance(), 0);
        assert_eq!(
            store::load::<bool>(store.as_ref(), KEY_SESSION_CONNECTED),
            None
        );
    }

    #[tokio::test]
    async fn test_restore_resumes_persisted_session() {
        let store = Arc::new(MemoryStore::new());
        store::save(store.as_ref(), KEY_SESSION_CONNECTED, &true).unwrap();
        store::save(store.as_ref(), KEY_SESSION_KEY_ID, &"0202feedface".to_string()).unwrap();

        let session = session_with(StubProvider::new(77), store);
        assert!(session.restore().await);
        assert!(session.is_connected());
        assert_eq!(session.balance(), 77);
        assert_eq!(session.account().unwrap().public_key, "0202feedface");
    }

    #[tokio::test]
    async fn test_restore_without_persisted_state_is_noop() {
        let session = session_with(StubProvider::new(0), Arc::new(MemoryStore::new()));
        assert!(!session.restore().await);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_restore_is_noop_when_already_connected() {
        let store = Arc::new(MemoryStore::new());
        let session = session_with(StubProvider::new(10), store.clone());
        let account = session.connect().await.unwrap();

        // a conflicting persisted key must not replace the live session
        store::save(store.as_ref(), KEY_SESSION_KEY_ID, &"0202other".to_string()).unwrap();
        assert!(session.restore().await);
        assert_eq!(session.account().unwrap().public_key, account.public_key);
    }

    #[tokio::test]
    async fn test_balance_refresh_keeps_stale_value_on_error() {
        let provider = StubProvider::new(77);
        let fail = provider.fail_balance.clone();
        let session = session_with(provider, Arc::new(MemoryStore::new()));

        session.connect().await.unwrap();
        assert_eq!(session.balance(), 77);

        fail.store(true, Ordering::SeqCst);
        session.refresh_balance().await;
        assert_eq!(session.balance(), 77);
    }

    #[tokio::test]
    async fn test_network_switch() {
        let session = session_with(StubProvider::new(0), Arc::new(MemoryStore::new()));
        assert_eq!(session.network(), Network::Testnet);
        session.switch_network(Network::Mainnet);
        assert_eq!(session.network(), Network::Mainnet);
    }
}
