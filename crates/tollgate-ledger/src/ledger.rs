use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use tollgate_store::{AccountId, AccountStore};

use crate::config::Provisioning;
use crate::error::{LedgerError, LedgerResult};
use crate::outcome::{Denial, Outcome};

/// The credit ledger: sole owner of the account store and sole arbiter of
/// check-and-deduct decisions.
///
/// All access to the store goes through one mutex. `consume` holds it for
/// the full lookup-check-deduct-commit sequence, so concurrent calls for the
/// same account are linearized and no two callers ever deduct from the same
/// pre-call balance. The store's mutating methods take `&mut self`, which is
/// only obtainable through the guard.
pub struct Ledger<S> {
    store: Mutex<S>,
}

impl<S: AccountStore> Ledger<S> {
    /// Wrap a store without provisioning anything.
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Wrap a store and seed every configured account.
    ///
    /// Seeding is idempotent: accounts already present keep their balance.
    pub fn open(store: S, provisioning: &Provisioning) -> LedgerResult<Self> {
        let ledger = Self::new(store);
        let inserted = ledger.provision(provisioning)?;
        info!(
            configured = provisioning.accounts.len(),
            inserted,
            starting_credits = provisioning.starting_credits,
            "ledger initialized and seeded"
        );
        Ok(ledger)
    }

    /// Seed the allow-list. Returns how many accounts were newly inserted.
    fn provision(&self, provisioning: &Provisioning) -> LedgerResult<usize> {
        let mut store = self.lock()?;
        let mut inserted = 0;
        for id in &provisioning.accounts {
            if store.provision(&AccountId::new(id.as_str()), provisioning.starting_credits)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Atomically check the balance and deduct one credit.
    ///
    /// 1. Unknown account -> `Denied(NotConfigured)`, nothing created.
    /// 2. Zero balance -> `Denied(Exhausted)`, nothing changed.
    /// 3. Otherwise deduct exactly one, commit, and return the new balance.
    ///
    /// A store failure during the commit surfaces as `Err` and the balance is
    /// left as it was. Once `Approved` is returned the deduction is final.
    pub fn consume(&self, id: &AccountId) -> LedgerResult<Outcome> {
        let mut store = self.lock()?;

        let balance = match store.balance(id)? {
            Some(balance) => balance,
            None => {
                warn!(account = %id, "account not configured for credits");
                return Ok(Outcome::Denied(Denial::NotConfigured));
            }
        };

        if balance == 0 {
            warn!(account = %id, "no credits remaining; blocking request");
            return Ok(Outcome::Denied(Denial::Exhausted));
        }

        let remaining = store.apply_deduction(id)?;
        info!(account = %id, remaining, "credit approved");
        Ok(Outcome::Approved { remaining })
    }

    /// Current balance, or `None` for an unconfigured account.
    pub fn balance(&self, id: &AccountId) -> LedgerResult<Option<u64>> {
        Ok(self.lock()?.balance(id)?)
    }

    /// Snapshot of every account and its balance.
    pub fn accounts(&self) -> LedgerResult<Vec<(AccountId, u64)>> {
        Ok(self.lock()?.accounts()?)
    }

    /// Readiness check: the store must complete a trivial read.
    pub fn probe(&self) -> LedgerResult<()> {
        Ok(self.lock()?.ping()?)
    }

    /// Run `f` with exclusive access to the store (maintenance tasks such as
    /// log compaction). Holds the same lock as `consume`.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> T) -> LedgerResult<T> {
        let mut store = self.lock()?;
        Ok(f(&mut store))
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, S>> {
        self.store.lock().map_err(|_| LedgerError::Poisoned)
    }
}

impl<S> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}
