pub mod casino;
pub mod identity;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub mod state;
pub mod wallet;

pub use identity::{Directory, IdentityError, Session};
pub use state::{transact, Document, Memory, Store, StoreError, TransactionError};
pub use wallet::{Wallet, WalletError};
