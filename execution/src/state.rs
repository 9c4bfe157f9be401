use casino_types::{Key, Value};
use commonware_codec::{DecodeExt, Encode};
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;
use tracing::{debug, warn};

/// Maximum attempts [transact] makes before giving up on a contended key.
pub const MAX_TRANSACTION_ATTEMPTS: usize = 5;

/// Callback invoked with the latest value of a watched key.
///
/// Observers run while the store commits a write and must not call back
/// into the store.
pub type Observer = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// A stored value and the version it was committed at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub value: Value,
    pub version: u64,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("version conflict (expected {expected:?}, found {found:?})")]
    Conflict {
        expected: Option<u64>,
        found: Option<u64>,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt document: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum TransactionError<E> {
    #[error("transaction aborted: {0}")]
    Aborted(E),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("gave up after {attempts} conflicting attempts")]
    Contended { attempts: usize },
}

/// Document store with per-key conditional updates and live subscriptions.
pub trait Store: Clone + Send + Sync + 'static {
    /// Read the current document stored under `key`.
    fn read(&self, key: &Key) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Write `value` only if the stored version still equals `expected`
    /// (`None` requires the key to be absent). Returns the new version.
    fn write_if(
        &self,
        key: Key,
        expected: Option<u64>,
        value: Value,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Register `observer` for `key`. It is called once with the current
    /// value and again after every committed write, in commit order.
    fn watch(&self, key: Key, observer: Observer) -> Result<WatchId, StoreError>;

    /// Stop notifying a previously registered observer.
    fn unwatch(&self, id: WatchId);
}

/// Serializable read-modify-write of a single key.
///
/// `apply` receives the current value and returns the replacement plus an
/// output, or an error that aborts without writing. Version conflicts are
/// retried up to [MAX_TRANSACTION_ATTEMPTS] times.
pub async fn transact<S, T, E, F>(
    store: &S,
    key: &Key,
    mut apply: F,
) -> Result<T, TransactionError<E>>
where
    S: Store,
    F: FnMut(Option<&Value>) -> Result<(Value, T), E>,
{
    for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
        let current = store.read(key).await?;
        let expected = current.as_ref().map(|document| document.version);
        let (value, output) = apply(current.as_ref().map(|document| &document.value))
            .map_err(TransactionError::Aborted)?;
        match store.write_if(key.clone(), expected, value).await {
            Ok(_) => return Ok(output),
            Err(StoreError::Conflict { .. }) => {
                debug!(?key, attempt, "transaction conflict, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
    warn!(?key, "transaction contended");
    Err(TransactionError::Contended {
        attempts: MAX_TRANSACTION_ATTEMPTS,
    })
}

/// Encoded value and the version it was committed at.
struct Record {
    bytes: Vec<u8>,
    version: u64,
}

impl Record {
    fn decode(&self) -> Result<Document, StoreError> {
        let value = Value::decode(self.bytes.as_slice())
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        Ok(Document {
            value,
            version: self.version,
        })
    }
}

/// Records and observers, both keyed by the encoded [Key].
#[derive(Default)]
struct Inner {
    records: HashMap<Vec<u8>, Record>,
    observers: HashMap<WatchId, (Vec<u8>, Observer)>,
    next_watch: u64,
}

impl Inner {
    fn notify(&self, key: &[u8], value: &Value) {
        for (watched, observer) in self.observers.values() {
            if watched.as_slice() == key {
                observer(Some(value));
            }
        }
    }
}

/// In-memory [Store] shared by cloning.
///
/// Values are kept in their binary encoding and decoded on every read.
#[derive(Clone, Default)]
pub struct Memory {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory").finish_non_exhaustive()
    }
}

impl Memory {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn get(&self, key: &Key) -> Result<Option<Document>, StoreError> {
        let encoded = key.encode();
        self.lock()?
            .records
            .get(&encoded[..])
            .map(Record::decode)
            .transpose()
    }

    fn commit(&self, key: Key, expected: Option<u64>, value: Value) -> Result<u64, StoreError> {
        let encoded = key.encode().to_vec();
        let mut inner = self.lock()?;
        let found = inner.records.get(&encoded).map(|record| record.version);
        if found != expected {
            return Err(StoreError::Conflict { expected, found });
        }
        let version = found.map_or(1, |version| version + 1);
        inner.records.insert(
            encoded.clone(),
            Record {
                bytes: value.encode().to_vec(),
                version,
            },
        );
        inner.notify(&encoded, &value);
        Ok(version)
    }
}

impl Store for Memory {
    async fn read(&self, key: &Key) -> Result<Option<Document>, StoreError> {
        self.get(key)
    }

    async fn write_if(
        &self,
        key: Key,
        expected: Option<u64>,
        value: Value,
    ) -> Result<u64, StoreError> {
        self.commit(key, expected, value)
    }

    fn watch(&self, key: Key, observer: Observer) -> Result<WatchId, StoreError> {
        let encoded = key.encode().to_vec();
        let mut inner = self.lock()?;
        let current = inner.records.get(&encoded).map(Record::decode).transpose()?;
        let id = WatchId(inner.next_watch);
        inner.next_watch += 1;
        observer(current.as_ref().map(|document| &document.value));
        inner.observers.insert(id, (encoded, observer));
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        match self.inner.lock() {
            Ok(mut inner) => {
                inner.observers.remove(&id);
            }
            Err(_) => warn!(?id, "failed to unwatch: memory store lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casino_types::{LedgerEntry, PrincipalId};
    use commonware_runtime::{deterministic::Runner, Runner as _};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn ledger(credits: u64) -> Value {
        Value::Ledger(LedgerEntry::new("a@b.c".to_string(), credits, 0))
    }

    fn credits(value: Option<&Value>) -> Option<u64> {
        match value {
            Some(Value::Ledger(entry)) => Some(entry.credits),
            _ => None,
        }
    }

    #[test]
    fn test_write_if_versions() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());

            assert_eq!(store.read(&key).await.unwrap(), None);
            assert_eq!(store.write_if(key.clone(), None, ledger(10)).await, Ok(1));
            assert_eq!(
                store.write_if(key.clone(), None, ledger(20)).await,
                Err(StoreError::Conflict {
                    expected: None,
                    found: Some(1)
                })
            );
            assert_eq!(store.write_if(key.clone(), Some(1), ledger(30)).await, Ok(2));
            assert!(matches!(
                store.write_if(key.clone(), Some(1), ledger(40)).await,
                Err(StoreError::Conflict { .. })
            ));

            let document = store.read(&key).await.unwrap().unwrap();
            assert_eq!(document.version, 2);
            assert_eq!(document.value, ledger(30));
        });
    }

    #[test]
    fn test_documents_are_stored_encoded() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());
            store.write_if(key.clone(), None, ledger(12)).await.unwrap();
            {
                let inner = store.inner.lock().unwrap();
                let record = inner.records.get(&key.encode()[..]).unwrap();
                assert_eq!(record.bytes, ledger(12).encode().to_vec());
            }

            // Unknown value tag
            store
                .inner
                .lock()
                .unwrap()
                .records
                .get_mut(&key.encode()[..])
                .unwrap()
                .bytes[0] = 9;
            assert!(matches!(
                store.read(&key).await,
                Err(StoreError::Corrupt(_))
            ));
            assert!(matches!(
                store.watch(key.clone(), Arc::new(|_: Option<&Value>| {})),
                Err(StoreError::Corrupt(_))
            ));
        });
    }

    #[test]
    fn test_watch_pushes_commits() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());
            let other = Key::Ledger(PrincipalId::random());
            let seen = Arc::new(Mutex::new(Vec::new()));

            let sink = seen.clone();
            let id = store
                .watch(
                    key.clone(),
                    Arc::new(move |value: Option<&Value>| {
                        sink.lock().unwrap().push(credits(value))
                    }),
                )
                .unwrap();
            store.write_if(key.clone(), None, ledger(5)).await.unwrap();
            store.write_if(other.clone(), None, ledger(99)).await.unwrap();
            store.write_if(key.clone(), Some(1), ledger(7)).await.unwrap();
            store.unwatch(id);
            store.write_if(key.clone(), Some(2), ledger(9)).await.unwrap();

            assert_eq!(*seen.lock().unwrap(), vec![None, Some(5), Some(7)]);
        });
    }

    #[test]
    fn test_transact_increments() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());
            store.write_if(key.clone(), None, ledger(1)).await.unwrap();

            for _ in 0..3 {
                let result: Result<u64, TransactionError<()>> =
                    transact(&store, &key, |value| {
                        let next = credits(value).unwrap() * 2;
                        Ok((ledger(next), next))
                    })
                    .await;
                assert!(result.is_ok());
            }
            let document = store.read(&key).await.unwrap().unwrap();
            assert_eq!(document.value, ledger(8));
            assert_eq!(document.version, 4);
        });
    }

    #[test]
    fn test_transact_abort_leaves_document() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());
            store.write_if(key.clone(), None, ledger(3)).await.unwrap();

            let result: Result<(), _> =
                transact(&store, &key, |_| Err::<(Value, ()), _>("refused")).await;
            assert!(matches!(result, Err(TransactionError::Aborted("refused"))));
            assert_eq!(store.read(&key).await.unwrap().unwrap().version, 1);
        });
    }

    #[test]
    fn test_transact_retries_conflicts() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());
            store.write_if(key.clone(), None, ledger(0)).await.unwrap();

            // Sneak a competing write in during the first two attempts
            let attempts = AtomicU64::new(0);
            let competitor = store.clone();
            let result: Result<u64, TransactionError<()>> = transact(&store, &key, |value| {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    let version = attempt + 1;
                    competitor
                        .commit(key.clone(), Some(version), ledger(100))
                        .unwrap();
                }
                let next = credits(value).unwrap() + 1;
                Ok((ledger(next), next))
            })
            .await;

            assert_eq!(result.unwrap(), 101);
            assert_eq!(attempts.load(Ordering::SeqCst), 3);
        });
    }

    #[test]
    fn test_transact_gives_up() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let store = Memory::default();
            let key = Key::Ledger(PrincipalId::random());
            store.write_if(key.clone(), None, ledger(0)).await.unwrap();

            let version = AtomicU64::new(1);
            let competitor = store.clone();
            let result: Result<(), TransactionError<()>> = transact(&store, &key, |_| {
                let current = version.fetch_add(1, Ordering::SeqCst);
                competitor
                    .commit(key.clone(), Some(current), ledger(current))
                    .unwrap();
                Ok((ledger(0), ()))
            })
            .await;

            assert!(matches!(
                result,
                Err(TransactionError::Contended {
                    attempts: MAX_TRANSACTION_ATTEMPTS
                })
            ));
        });
    }
}
