//! The fixed spending category set shared by the classifier and the allocator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spending categories, in baseline table order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Food,
    Groceries,
    Transport,
    Bills,
    Shopping,
    Health,
    Entertainment,
    Education,
    Other,
    /// Residual bucket; never blended, always whatever income is left over.
    Savings,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Groceries,
        Category::Transport,
        Category::Bills,
        Category::Shopping,
        Category::Health,
        Category::Entertainment,
        Category::Education,
        Category::Other,
        Category::Savings,
    ];

    /// Every category except Savings.
    pub const SPENDING: [Category; 9] = [
        Category::Food,
        Category::Groceries,
        Category::Transport,
        Category::Bills,
        Category::Shopping,
        Category::Health,
        Category::Entertainment,
        Category::Education,
        Category::Other,
    ];

    /// Label as stored on transactions and reported to callers
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Groceries => "Groceries",
            Category::Transport => "Transport",
            Category::Bills => "Bills",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Entertainment => "Entertainment",
            Category::Education => "Education",
            Category::Other => "Other",
            Category::Savings => "Savings",
        }
    }

    /// Exact, case-sensitive label lookup. `FromStr` is the lenient form.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn is_savings(&self) -> bool {
        matches!(self, Category::Savings)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow::anyhow!("unknown category: {wanted:?}"))
    }
}
