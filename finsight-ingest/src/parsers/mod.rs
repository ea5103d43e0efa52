//! Text parsers for statement and payment strings.

pub mod payment_ref;

pub use payment_ref::{PaymentRef, parse_payment_reference};
