//! Credit ledger of the signed-in principal.
//!
//! Every balance change is a single [transact] against the principal's
//! ledger document, so concurrent rounds can neither overdraw the balance
//! nor lose an increment. The committed balance is pushed to subscribers
//! through a store watch that follows the bound principal.

use crate::state::{transact, Store, StoreError, TransactionError, WatchId};
use casino_types::{Key, Principal, PrincipalId, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("insufficient credits (balance {balance}, required {amount})")]
    InsufficientFunds { balance: u64, amount: u64 },
    #[error("amount must be a positive number of credits")]
    InvalidAmount,
    #[error("no ledger for principal {0}")]
    MissingLedger(PrincipalId),
    #[error("ledger busy, try again")]
    Contended,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TransactionError<WalletError>> for WalletError {
    fn from(err: TransactionError<WalletError>) -> Self {
        match err {
            TransactionError::Aborted(err) => err,
            TransactionError::Store(err) => Self::Store(err),
            TransactionError::Contended { .. } => Self::Contended,
        }
    }
}

struct Binding {
    principal: Principal,
    watch: WatchId,
}

/// Ledger service for one session.
pub struct Wallet<S: Store> {
    store: S,
    binding: Mutex<Option<Binding>>,
    credits: Arc<watch::Sender<u64>>,
}

impl<S: Store> Wallet<S> {
    pub fn new(store: S) -> Self {
        let (credits, _) = watch::channel(0);
        Self {
            store,
            binding: Mutex::new(None),
            credits: Arc::new(credits),
        }
    }

    fn binding(&self) -> MutexGuard<'_, Option<Binding>> {
        self.binding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Point the wallet at `principal`, or detach it with `None`.
    ///
    /// The previous balance subscription is torn down before the new one is
    /// registered. Detaching resets the published balance to zero.
    pub fn bind(&self, principal: Option<Principal>) -> Result<(), WalletError> {
        let mut binding = self.binding();
        if let Some(previous) = binding.take() {
            self.store.unwatch(previous.watch);
            debug!(principal = %previous.principal.id, "unbound wallet");
        }
        let Some(principal) = principal else {
            self.credits.send_replace(0);
            return Ok(());
        };

        let credits = self.credits.clone();
        let watch = self.store.watch(
            Key::Ledger(principal.id),
            Arc::new(move |value: Option<&Value>| {
                let balance = match value {
                    Some(Value::Ledger(entry)) => entry.credits,
                    _ => 0,
                };
                credits.send_replace(balance);
            }),
        )?;
        debug!(principal = %principal.id, "bound wallet");
        *binding = Some(Binding { principal, watch });
        Ok(())
    }

    pub fn principal(&self) -> Option<Principal> {
        self.binding()
            .as_ref()
            .map(|binding| binding.principal.clone())
    }

    /// Subscribe to balance changes.
    pub fn credits(&self) -> watch::Receiver<u64> {
        self.credits.subscribe()
    }

    /// Latest committed balance (zero when unbound).
    pub fn balance(&self) -> u64 {
        *self.credits.borrow()
    }

    fn require(&self, amount: u64) -> Result<Principal, WalletError> {
        let principal = self.principal().ok_or(WalletError::NotAuthenticated)?;
        if amount == 0 {
            return Err(WalletError::InvalidAmount);
        }
        Ok(principal)
    }

    /// Debit `amount`, refusing if the balance does not cover it.
    ///
    /// Returns the balance after the debit.
    pub async fn spend(&self, amount: u64) -> Result<u64, WalletError> {
        let principal = self.require(amount)?;
        let id = principal.id;
        let balance = transact(&self.store, &Key::Ledger(id), |value| {
            let mut entry = match value {
                Some(Value::Ledger(entry)) => entry.clone(),
                _ => return Err(WalletError::MissingLedger(id)),
            };
            if entry.credits < amount {
                return Err(WalletError::InsufficientFunds {
                    balance: entry.credits,
                    amount,
                });
            }
            entry.credits -= amount;
            let balance = entry.credits;
            Ok((Value::Ledger(entry), balance))
        })
        .await?;
        debug!(principal = %id, amount, balance, "spent credits");
        Ok(balance)
    }

    /// Credit `amount`.
    ///
    /// Returns the balance after the credit.
    pub async fn add_credits(&self, amount: u64) -> Result<u64, WalletError> {
        let principal = self.require(amount)?;
        let id = principal.id;
        let balance = transact(&self.store, &Key::Ledger(id), |value| {
            let mut entry = match value {
                Some(Value::Ledger(entry)) => entry.clone(),
                _ => return Err(WalletError::MissingLedger(id)),
            };
            entry.credits = entry.credits.saturating_add(amount);
            let balance = entry.credits;
            Ok((Value::Ledger(entry), balance))
        })
        .await?;
        debug!(principal = %id, amount, balance, "added credits");
        Ok(balance)
    }

    /// Credit winnings from a settled round.
    pub async fn payout(&self, amount: u64) -> Result<u64, WalletError> {
        let balance = self.add_credits(amount).await?;
        info!(amount, balance, "paid out winnings");
        Ok(balance)
    }
}

impl<S: Store> Drop for Wallet<S> {
    fn drop(&mut self) {
        if let Some(binding) = self.binding().take() {
            self.store.unwatch(binding.watch);
        }
    }
}
