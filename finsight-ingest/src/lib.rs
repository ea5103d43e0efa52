//! finsight-ingest: transaction history sources and payment-text parsers.

pub mod csv_loader;
pub mod history;
pub mod parsers;

pub use csv_loader::{StatementLine, load_statement_csv, load_transactions_csv};
pub use history::{ExpenseHistory, MemoryStore};
pub use parsers::{PaymentRef, parse_payment_reference};
