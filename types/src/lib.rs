pub mod api;
pub mod casino;
pub mod ledger;

pub use ledger::{Credential, Key, LedgerEntry, Principal, PrincipalId, Value, SALT_LENGTH};
