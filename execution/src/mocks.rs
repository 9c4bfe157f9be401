use crate::{
    casino::GameRng,
    state::{Document, Observer, Store, StoreError, WatchId},
    wallet::Wallet,
};
use casino_types::{Key, LedgerEntry, Principal, PrincipalId, Value};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Creates a principal with a fresh id
pub fn create_principal(email: &str) -> Principal {
    Principal {
        id: PrincipalId::random(),
        email: email.to_string(),
    }
}

/// Creates a game RNG from a small integer seed
pub fn create_rng(seed: u64) -> GameRng {
    GameRng::new(&seed.to_be_bytes(), 0)
}

/// Writes a ledger entry for `principal` holding `credits`
pub async fn create_ledger<S: Store>(store: &S, principal: &Principal, credits: u64) {
    store
        .write_if(
            Key::Ledger(principal.id),
            None,
            Value::Ledger(LedgerEntry::new(principal.email.clone(), credits, 0)),
        )
        .await
        .expect("ledger already exists");
}

/// Creates a wallet bound to a new principal holding `credits`
pub async fn create_wallet<S: Store>(store: S, credits: u64) -> (Wallet<S>, Principal) {
    let principal = create_principal("player@example.com");
    create_ledger(&store, &principal, credits).await;
    let wallet = Wallet::new(store);
    wallet
        .bind(Some(principal.clone()))
        .expect("failed to bind wallet");
    (wallet, principal)
}

/// Store that yields to the scheduler between every operation, widening the
/// window in which concurrent transactions can collide.
#[derive(Clone)]
pub struct Interleaved<S: Store> {
    inner: S,
}

impl<S: Store> Interleaved<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: Store> Store for Interleaved<S> {
    async fn read(&self, key: &Key) -> Result<Option<Document>, StoreError> {
        tokio::task::yield_now().await;
        let document = self.inner.read(key).await;
        tokio::task::yield_now().await;
        document
    }

    async fn write_if(
        &self,
        key: Key,
        expected: Option<u64>,
        value: Value,
    ) -> Result<u64, StoreError> {
        tokio::task::yield_now().await;
        self.inner.write_if(key, expected, value).await
    }

    fn watch(&self, key: Key, observer: Observer) -> Result<WatchId, StoreError> {
        self.inner.watch(key, observer)
    }

    fn unwatch(&self, id: WatchId) {
        self.inner.unwatch(id)
    }
}

/// Store whose writes can be made to fail on demand.
#[derive(Clone)]
pub struct Faulty<S: Store> {
    inner: S,
    failing: Arc<AtomicBool>,
}

impl<S: Store> Faulty<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl<S: Store> Store for Faulty<S> {
    async fn read(&self, key: &Key) -> Result<Option<Document>, StoreError> {
        self.inner.read(key).await
    }

    async fn write_if(
        &self,
        key: Key,
        expected: Option<u64>,
        value: Value,
    ) -> Result<u64, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.write_if(key, expected, value).await
    }

    fn watch(&self, key: Key, observer: Observer) -> Result<WatchId, StoreError> {
        self.inner.watch(key, observer)
    }

    fn unwatch(&self, id: WatchId) {
        self.inner.unwatch(id)
    }
}
