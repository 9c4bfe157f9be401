//! Email/password identity provider and the per-client session built on it.

use crate::{
    state::{Store, StoreError},
    wallet::{Wallet, WalletError},
};
use casino_types::{
    casino::{MAX_EMAIL_LENGTH, MIN_PASSWORD_LENGTH},
    Credential, Key, LedgerEntry, Principal, PrincipalId, Value, SALT_LENGTH,
};
use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use rand::{rngs::OsRng, RngCore};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("email already registered")]
    EmailInUse,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn normalize_email(email: &str) -> Result<String, IdentityError> {
    let email = email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(IdentityError::InvalidEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(IdentityError::InvalidEmail),
    }
}

fn password_digest(salt: &[u8; SALT_LENGTH], password: &str) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Credential directory backed by the document store.
#[derive(Clone)]
pub struct Directory<S: Store> {
    store: S,
}

impl<S: Store> Directory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a principal for `email`.
    ///
    /// The credential is written with an absent-only condition, so two
    /// racing registrations of the same address cannot both succeed.
    pub async fn register(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        let principal = Principal {
            id: PrincipalId::random(),
            email: email.clone(),
        };
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);
        let credential = Credential {
            principal: principal.clone(),
            salt,
            digest: password_digest(&salt, password),
        };
        match self
            .store
            .write_if(Key::Credential(email), None, Value::Credential(credential))
            .await
        {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => return Err(IdentityError::EmailInUse),
            Err(err) => return Err(err.into()),
        }
        info!(principal = %principal.id, email = %principal.email, "registered principal");
        Ok(principal)
    }

    /// Resolve the principal owning `email` if `password` matches.
    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let email = normalize_email(email).map_err(|_| IdentityError::InvalidCredentials)?;
        let Some(document) = self.store.read(&Key::Credential(email)).await? else {
            return Err(IdentityError::InvalidCredentials);
        };
        let Value::Credential(credential) = document.value else {
            return Err(IdentityError::InvalidCredentials);
        };
        if password_digest(&credential.salt, password) != credential.digest {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(credential.principal)
    }
}

/// Signed-in state of one client.
///
/// Owns the client's [Wallet] and keeps it bound to whichever principal is
/// currently signed in.
pub struct Session<S: Store> {
    store: S,
    directory: Directory<S>,
    wallet: Arc<Wallet<S>>,
    principal: watch::Sender<Option<Principal>>,
    initial_credits: u64,
}

impl<S: Store> Session<S> {
    pub fn new(store: S, initial_credits: u64) -> Self {
        let (principal, _) = watch::channel(None);
        Self {
            directory: Directory::new(store.clone()),
            wallet: Arc::new(Wallet::new(store.clone())),
            store,
            principal,
            initial_credits,
        }
    }

    pub fn wallet(&self) -> Arc<Wallet<S>> {
        self.wallet.clone()
    }

    pub fn current_user(&self) -> Option<Principal> {
        self.principal.borrow().clone()
    }

    /// Subscribe to sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.principal.subscribe()
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let principal = self.directory.register(email, password).await?;
        self.sign_in(principal.clone()).await?;
        Ok(principal)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Principal, IdentityError> {
        let principal = self.directory.login(email, password).await?;
        self.sign_in(principal.clone()).await?;
        Ok(principal)
    }

    pub fn logout(&self) -> Result<(), IdentityError> {
        let previous = self.principal.send_replace(None);
        self.wallet.bind(None)?;
        if let Some(principal) = previous {
            info!(principal = %principal.id, "signed out");
        }
        Ok(())
    }

    async fn sign_in(&self, principal: Principal) -> Result<(), IdentityError> {
        let entry = LedgerEntry::new(principal.email.clone(), self.initial_credits, now_ms());
        match self
            .store
            .write_if(Key::Ledger(principal.id), None, Value::Ledger(entry))
            .await
        {
            Ok(_) => info!(principal = %principal.id, credits = self.initial_credits, "created ledger"),
            Err(StoreError::Conflict { .. }) => {}
            Err(err) => return Err(err.into()),
        }
        self.wallet.bind(Some(principal.clone()))?;
        info!(principal = %principal.id, "signed in");
        self.principal.send_replace(Some(principal));
        Ok(())
    }
}
