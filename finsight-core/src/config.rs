//! Tunables for the allocator and classifier.
//!
//! Callers build these (usually from `config.toml`) and pass them in; nothing
//! here reads the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::category::Category;

/// Nominal share of income per category before blending with history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineFractions {
    pub food: f64,
    pub groceries: f64,
    pub transport: f64,
    pub bills: f64,
    pub shopping: f64,
    pub health: f64,
    pub entertainment: f64,
    pub education: f64,
    pub other: f64,
    /// Listed for completeness. Savings is always the residual, so the
    /// allocator never reads this.
    pub savings: f64,
}

impl Default for BaselineFractions {
    fn default() -> Self {
        Self {
            food: 0.12,
            groceries: 0.10,
            transport: 0.08,
            bills: 0.12,
            shopping: 0.08,
            health: 0.05,
            entertainment: 0.05,
            education: 0.05,
            other: 0.05,
            savings: 0.30,
        }
    }
}

impl BaselineFractions {
    pub fn fraction(&self, category: Category) -> f64 {
        match category {
            Category::Food => self.food,
            Category::Groceries => self.groceries,
            Category::Transport => self.transport,
            Category::Bills => self.bills,
            Category::Shopping => self.shopping,
            Category::Health => self.health,
            Category::Entertainment => self.entertainment,
            Category::Education => self.education,
            Category::Other => self.other,
            Category::Savings => self.savings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Weight on `fraction * income`
    pub baseline_weight: f64,
    /// Weight on the trailing monthly average
    pub history_weight: f64,
    /// Calendar months of history before the target month
    pub history_months: u32,
    /// Category totals are divided by this, however many months actually had data
    pub history_divisor: f64,
    pub baseline: BaselineFractions,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            baseline_weight: 0.6,
            history_weight: 0.4,
            history_months: 3,
            history_divisor: 3.0,
            baseline: BaselineFractions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of the prediction service; `/predict` is appended
    pub ml_service_url: String,
    pub timeout_ms: u64,
    /// Confidence reported for rule-based results
    pub fallback_confidence: f64,
    /// Category when no rule matches
    pub default_category: Category,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            ml_service_url: "http://localhost:5001".to_string(),
            timeout_ms: 1000,
            fallback_confidence: 0.6,
            default_category: Category::Other,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.ml_service_url.trim_end_matches('/'))
    }
}
