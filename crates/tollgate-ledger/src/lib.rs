//! Credit ledger engine for tollgate.
//!
//! Before an inference service does any work for a caller it asks the ledger
//! for one credit. The ledger looks the caller up, refuses unknown or
//! exhausted accounts, and otherwise deducts exactly one credit -- all as one
//! indivisible step per call.
//!
//! # Quick Start
//!
//! ```rust
//! use tollgate_ledger::{Denial, Ledger, Outcome, Provisioning};
//! use tollgate_store::{AccountId, InMemoryAccountStore};
//!
//! let ledger = Ledger::open(InMemoryAccountStore::new(), &Provisioning::new(1, ["avy"])).unwrap();
//! let avy = AccountId::new("avy");
//! assert_eq!(ledger.consume(&avy).unwrap(), Outcome::Approved { remaining: 0 });
//! assert_eq!(ledger.consume(&avy).unwrap(), Outcome::Denied(Denial::Exhausted));
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod outcome;

pub use config::{Provisioning, STARTING_CREDITS};
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use outcome::{Denial, Outcome};
