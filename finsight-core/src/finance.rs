//! Finance record types: stored transactions and the values derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::category::Category;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

/// A recorded transaction, as read from the transaction store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Owning user
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Category label. Usually one of [`Category`], but the store may hold others.
    pub category: String,
    /// Non-negative, currency-agnostic
    pub amount: f64,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: impl Into<String>,
        kind: TransactionKind,
        category: impl Into<String>,
        amount: f64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            category: category.into(),
            amount: amount.abs(),
            date,
        }
    }

    pub fn expense(
        user_id: impl Into<String>,
        category: impl Into<String>,
        amount: f64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, TransactionKind::Expense, category, amount, date)
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// Integer monthly caps per category, Savings included.
///
/// Serializes as a flat `{"Food": 3600, ...}` object in table order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BudgetAllocation {
    caps: BTreeMap<Category, u64>,
}

impl BudgetAllocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, category: Category, cap: u64) {
        self.caps.insert(category, cap);
    }

    /// Cap for `category`, zero when absent
    pub fn get(&self, category: Category) -> u64 {
        self.caps.get(&category).copied().unwrap_or(0)
    }

    pub fn savings(&self) -> u64 {
        self.get(Category::Savings)
    }

    /// Sum of every cap except Savings, saturating at `u64::MAX`
    pub fn spending_total(&self) -> u64 {
        self.caps
            .iter()
            .filter(|(c, _)| !c.is_savings())
            .fold(0, |acc, (_, cap)| acc.saturating_add(*cap))
    }

    /// Sum of every cap, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.caps.values().fold(0, |acc, cap| acc.saturating_add(*cap))
    }

    /// True when the caps add up to more than `income`.
    ///
    /// Happens only when the blended spending caps alone overshoot income,
    /// since Savings is floored at zero rather than going negative.
    pub fn exceeds(&self, income: f64) -> bool {
        self.total() as f64 > income
    }

    pub fn len(&self) -> usize {
        self.caps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        self.caps.iter().map(|(c, cap)| (*c, *cap))
    }
}

/// Category guess for one transaction description
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    /// Category label; from the model this is passed through unvalidated
    pub category: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// Empty when unknown
    pub merchant: String,
}
