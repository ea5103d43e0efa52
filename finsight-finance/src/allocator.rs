//! Dynamic budget allocation.
//!
//! Each spending category gets `baseline_weight * fraction * income +
//! history_weight * trailing_average`, rounded and floored at zero. Savings
//! takes whatever income is left, floored at zero, so the caps only exceed
//! income when the blended spending caps alone already do.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use finsight_core::{AllocatorConfig, BudgetAllocation, Category, DateWindow, MonthKey};
use finsight_ingest::ExpenseHistory;
use std::collections::HashMap;

/// Per-category monthly averages over `window`.
///
/// Totals are divided by `divisor` whether or not every month in the window
/// has data. Labels must equal a spending category's label exactly; anything
/// else (case variants, Savings, unknown labels) is dropped.
pub fn monthly_averages(
    history: &impl ExpenseHistory,
    user_id: &str,
    window: DateWindow,
    divisor: f64,
) -> Result<HashMap<Category, f64>> {
    let totals = history
        .expense_totals(user_id, window)
        .with_context(|| format!("fetching expense history for user {user_id}"))?;

    let mut averages: HashMap<Category, f64> = HashMap::new();
    for (label, total) in totals {
        match Category::from_label(&label).filter(|c| !c.is_savings()) {
            Some(category) => {
                averages.insert(category, total / divisor);
            }
            None => tracing::debug!(%label, total, "ignoring history outside the category set"),
        }
    }
    Ok(averages)
}

/// Blend baseline and history into caps. Pure; `averages` may be empty.
///
/// Caps too large for `u64` saturate, as does their running sum.
pub fn blend_caps(
    config: &AllocatorConfig,
    income: f64,
    averages: &HashMap<Category, f64>,
) -> BudgetAllocation {
    let mut caps = BudgetAllocation::new();
    let mut allocated: u64 = 0;

    for category in Category::SPENDING {
        let hist = averages.get(&category).copied().unwrap_or(0.0);
        let blended = config.baseline_weight * (config.baseline.fraction(category) * income)
            + config.history_weight * hist;
        let cap = blended.max(0.0).round() as u64;
        caps.set(category, cap);
        allocated = allocated.saturating_add(cap);
    }

    let savings = (income - allocated as f64).round().max(0.0) as u64;
    caps.set(Category::Savings, savings);
    caps
}

/// Compute caps for `user_id` in `target` from their trailing history.
pub fn compute_allocation(
    history: &impl ExpenseHistory,
    config: &AllocatorConfig,
    user_id: &str,
    income: f64,
    target: MonthKey,
) -> Result<BudgetAllocation> {
    if !income.is_finite() || income < 0.0 {
        bail!("income must be a non-negative number, got {income}");
    }
    if config.history_divisor <= 0.0 {
        bail!("history_divisor must be positive, got {}", config.history_divisor);
    }

    let window = DateWindow::trailing_months(target, config.history_months)?;
    let averages = monthly_averages(history, user_id, window, config.history_divisor)?;
    let caps = blend_caps(config, income, &averages);

    tracing::debug!(
        user_id,
        month = %target,
        income,
        spending = caps.spending_total(),
        savings = caps.savings(),
        "computed budget allocation"
    );
    if caps.exceeds(income) {
        tracing::debug!(
            user_id,
            total = caps.total(),
            income,
            "spending caps alone exceed income"
        );
    }
    Ok(caps)
}

/// Allocator bound to a history source and configuration.
pub struct Allocator<H> {
    history: H,
    config: AllocatorConfig,
    /// IANA zone deciding which month is "current"
    timezone: String,
}

impl<H: ExpenseHistory> Allocator<H> {
    pub fn new(history: H, config: AllocatorConfig) -> Self {
        Self {
            history,
            config,
            timezone: "UTC".to_string(),
        }
    }

    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = tz.into();
        self
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Caps for `target`, or the current month when `None`.
    pub fn compute(
        &self,
        user_id: &str,
        income: f64,
        target: Option<MonthKey>,
    ) -> Result<BudgetAllocation> {
        let target = match target {
            Some(month) => month,
            None => MonthKey::current_in(&self.timezone, Utc::now())?,
        };
        compute_allocation(&self.history, &self.config, user_id, income, target)
    }
}
