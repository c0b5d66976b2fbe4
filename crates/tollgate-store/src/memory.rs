use std::collections::HashMap;

use crate::account::AccountId;
use crate::error::{StoreError, StoreResult};
use crate::traits::AccountStore;

/// In-memory, HashMap-based account store.
///
/// Balances live for the lifetime of the process. This is the default backend
/// and the one used by tests; it is also the index that [`WalAccountStore`]
/// rebuilds from its log on open.
///
/// [`WalAccountStore`]: crate::wal::WalAccountStore
#[derive(Default)]
pub struct InMemoryAccountStore {
    balances: HashMap<AccountId, u64>,
}

impl InMemoryAccountStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with the given balances.
    pub fn with_balances<I, K>(balances: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<AccountId>,
    {
        Self {
            balances: balances.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Number of provisioned accounts.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Returns `true` if no account has been provisioned.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Balance the account would have after one deduction, without applying it.
    pub(crate) fn deducted_balance(&self, id: &AccountId) -> StoreResult<u64> {
        let current = self
            .balances
            .get(id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        current
            .checked_sub(1)
            .ok_or_else(|| StoreError::Underflow(id.clone()))
    }

    /// Overwrite a balance unconditionally. Used by log replay only.
    pub(crate) fn set_balance(&mut self, id: AccountId, balance: u64) {
        self.balances.insert(id, balance);
    }
}

impl AccountStore for InMemoryAccountStore {
    fn provision(&mut self, id: &AccountId, starting_balance: u64) -> StoreResult<bool> {
        if self.balances.contains_key(id) {
            return Ok(false);
        }
        self.balances.insert(id.clone(), starting_balance);
        Ok(true)
    }

    fn balance(&self, id: &AccountId) -> StoreResult<Option<u64>> {
        Ok(self.balances.get(id).copied())
    }

    fn apply_deduction(&mut self, id: &AccountId) -> StoreResult<u64> {
        let next = self.deducted_balance(id)?;
        self.balances.insert(id.clone(), next);
        Ok(next)
    }

    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn accounts(&self) -> StoreResult<Vec<(AccountId, u64)>> {
        let mut all: Vec<(AccountId, u64)> =
            self.balances.iter().map(|(k, v)| (k.clone(), *v)).collect();
        all.sort();
        Ok(all)
    }
}

impl std::fmt::Debug for InMemoryAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAccountStore")
            .field("account_count", &self.balances.len())
            .finish()
    }
}
