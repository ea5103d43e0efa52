//! finsight-finance: keyword category rules, the transaction classifier, and
//! the dynamic budget allocator

pub mod allocator;
pub mod category_rules;
pub mod classifier;

pub use allocator::{Allocator, blend_caps, compute_allocation, monthly_averages};
pub use category_rules::{categorize_or, rule_based_category};
pub use classifier::{Classification, Classifier, PredictError, PredictRequest, Prediction};
