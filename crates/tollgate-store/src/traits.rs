use crate::account::AccountId;
use crate::error::StoreResult;

/// Key -> balance storage for credit accounts.
///
/// All implementations must satisfy these invariants:
/// - `provision` inserts only if absent and never overwrites a balance.
/// - `apply_deduction` decrements by exactly one and never below zero.
/// - A mutation is committed before the call returns; no partial write is
///   ever observable by a later read.
///
/// Mutating methods take `&mut self`. The store carries no concurrency
/// guarantee of its own: the owner (the ledger) holds it behind a lock, and
/// the check-then-deduct sequence runs while that lock is held.
pub trait AccountStore: Send {
    /// Seed an account with `starting_balance` if it does not exist yet.
    ///
    /// Returns `true` if the account was inserted, `false` if it was already
    /// present (its balance is left untouched).
    fn provision(&mut self, id: &AccountId, starting_balance: u64) -> StoreResult<bool>;

    /// Point read of an account's balance.
    ///
    /// Returns `Ok(None)` if the account was never provisioned.
    fn balance(&self, id: &AccountId) -> StoreResult<Option<u64>>;

    /// Decrement the balance by exactly one and return the new balance.
    ///
    /// Fails with `NotFound` for unknown accounts and `Underflow` when the
    /// balance is already zero.
    fn apply_deduction(&mut self, id: &AccountId) -> StoreResult<u64>;

    /// Trivial round-trip read used by readiness probes. Must not mutate.
    fn ping(&self) -> StoreResult<()>;

    /// All accounts with their current balances, sorted by identifier.
    fn accounts(&self) -> StoreResult<Vec<(AccountId, u64)>>;
}

impl<S: AccountStore + ?Sized> AccountStore for Box<S> {
    fn provision(&mut self, id: &AccountId, starting_balance: u64) -> StoreResult<bool> {
        (**self).provision(id, starting_balance)
    }

    fn balance(&self, id: &AccountId) -> StoreResult<Option<u64>> {
        (**self).balance(id)
    }

    fn apply_deduction(&mut self, id: &AccountId) -> StoreResult<u64> {
        (**self).apply_deduction(id)
    }

    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn accounts(&self) -> StoreResult<Vec<(AccountId, u64)>> {
        (**self).accounts()
    }
}
