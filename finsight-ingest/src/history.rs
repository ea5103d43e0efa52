//! Read-side access to a user's transaction history.

use anyhow::Result;
use finsight_core::{DateWindow, Transaction};
use std::collections::HashMap;

/// The one query the allocator needs from a transaction store.
pub trait ExpenseHistory {
    /// Sum of expense amounts per category label for `user_id` within `window`.
    ///
    /// Categories with no matching rows are simply absent.
    fn expense_totals(&self, user_id: &str, window: DateWindow) -> Result<HashMap<String, f64>>;
}

impl<T: ExpenseHistory + ?Sized> ExpenseHistory for &T {
    fn expense_totals(&self, user_id: &str, window: DateWindow) -> Result<HashMap<String, f64>> {
        (**self).expense_totals(user_id, window)
    }
}

/// Transactions held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    txns: Vec<Transaction>,
}

impl MemoryStore {
    pub fn new(txns: Vec<Transaction>) -> Self {
        Self { txns }
    }

    pub fn push(&mut self, txn: Transaction) {
        self.txns.push(txn);
    }

    pub fn len(&self) -> usize {
        self.txns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txns
    }
}

impl FromIterator<Transaction> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl ExpenseHistory for MemoryStore {
    fn expense_totals(&self, user_id: &str, window: DateWindow) -> Result<HashMap<String, f64>> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for txn in self
            .txns
            .iter()
            .filter(|t| t.user_id == user_id && t.is_expense() && window.contains(t.date))
        {
            *totals.entry(txn.category.clone()).or_insert(0.0) += txn.amount;
        }
        Ok(totals)
    }
}
