//! finsight-core: shared types for the transaction classifier and budget allocator

pub mod category;
pub mod config;
pub mod finance;
pub mod month;

pub use category::Category;
pub use config::{AllocatorConfig, BaselineFractions, ClassifierConfig};
pub use finance::{BudgetAllocation, ClassificationResult, Transaction, TransactionKind};
pub use month::{DateWindow, MonthKey};
