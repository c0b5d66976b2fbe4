//! Account balance storage for the tollgate credit ledger.
//!
//! This crate holds the durable mapping from account identifier to remaining
//! credit balance. It knows nothing about quotas or verdicts; the decision
//! logic lives in `tollgate-ledger`, which is the only intended caller.
//!
//! # Storage Backends
//!
//! All backends implement the [`AccountStore`] trait:
//!
//! - [`InMemoryAccountStore`] -- `HashMap`-based store, lives as long as the process
//! - [`WalAccountStore`] -- write-ahead log on disk, replayed on open
//!
//! # Design Rules
//!
//! 1. Provisioning never overwrites an existing balance.
//! 2. Balances are unsigned and are only ever decremented, one credit at a time.
//! 3. Mutations take `&mut self`; callers serialize access themselves.
//! 4. A mutation is committed before it is visible to any subsequent read.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod account;
pub mod error;
pub mod memory;
pub mod traits;
pub mod wal;

pub use account::AccountId;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryAccountStore;
pub use traits::AccountStore;
pub use wal::{SyncMode, WalAccountStore, WalRecord};
