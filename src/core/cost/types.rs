//! Usage ledger and budget types

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::registry::model_config;
use crate::core::types::ApplicationContext;

/// One record per completed request attempt. Append-only; the source of
/// truth for every budget and reporting query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub app: ApplicationContext,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub request_id: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost: f64,
    pub response_time_ms: u64,
    pub cache_hit: bool,
    pub retry_count: u32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl UsageEvent {
    /// Build the event for a completed upstream call. Cost is recomputed
    /// from the catalog cost table and the token counts, never taken from
    /// upstream.
    #[allow(clippy::too_many_arguments)]
    pub fn for_completion(
        app: ApplicationContext,
        model: &str,
        request_id: &str,
        user_id: Option<String>,
        input_tokens: u32,
        output_tokens: u32,
        response_time_ms: u64,
        retry_count: u32,
    ) -> Self {
        let cost = model_config(model)
            .map(|c| c.cost_for(input_tokens, output_tokens))
            .unwrap_or(0.0);
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            app,
            model: model.to_string(),
            user_id,
            request_id: request_id.to_string(),
            input_tokens,
            output_tokens,
            cost,
            response_time_ms,
            cache_hit: false,
            retry_count,
            success: true,
            error_code: None,
        }
    }

    /// Zero-cost event for a cache hit
    pub fn for_cache_hit(
        app: ApplicationContext,
        model: &str,
        request_id: &str,
        user_id: Option<String>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            app,
            model: model.to_string(),
            user_id,
            request_id: request_id.to_string(),
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            response_time_ms,
            cache_hit: true,
            retry_count: 0,
            success: true,
            error_code: None,
        }
    }

    /// Zero-cost event for a failed request, keeping budget accounting
    /// accurate for failures too
    pub fn for_failure(
        app: ApplicationContext,
        model: &str,
        request_id: &str,
        user_id: Option<String>,
        response_time_ms: u64,
        error_code: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            app,
            model: model.to_string(),
            user_id,
            request_id: request_id.to_string(),
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            response_time_ms,
            cache_hit: false,
            retry_count: 0,
            success: false,
            error_code: Some(error_code.to_string()),
        }
    }
}

/// Budget accounting window. Boundaries are fixed calendar marks in local
/// time, recomputed from the wall clock on every query rather than from a
/// cached reset timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetWindow {
    Daily,
    Monthly,
}

impl BudgetWindow {
    /// Start of the window containing `now`
    pub fn start(&self, now: DateTime<Local>) -> DateTime<Local> {
        let day = match self {
            Self::Daily => now.date_naive(),
            Self::Monthly => now.date_naive().with_day(1).expect("day 1 always valid"),
        };
        Local
            .from_local_datetime(&day.and_hms_opt(0, 0, 0).expect("midnight always valid"))
            .earliest()
            .expect("window boundary resolves in local time")
    }

    /// Time remaining until the next window boundary
    pub fn until_reset(&self, now: DateTime<Local>) -> ChronoDuration {
        let next = match self {
            Self::Daily => self.start(now) + ChronoDuration::days(1),
            Self::Monthly => {
                let start = self.start(now);
                let (year, month) = if start.month() == 12 {
                    (start.year() + 1, 1)
                } else {
                    (start.year(), start.month() + 1)
                };
                Local
                    .with_ymd_and_hms(year, month, 1, 0, 0, 0)
                    .earliest()
                    .expect("first of month resolves in local time")
            }
        };
        next - now
    }
}

/// Budget health bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetHealth {
    Healthy,
    /// At or above 75% of budget
    Warning,
    /// At or above 90% of budget
    Critical,
    /// At or above 100% of budget
    Exceeded,
}

impl BudgetHealth {
    pub fn from_percent(percent_used: f64) -> Self {
        if percent_used >= 1.0 {
            Self::Exceeded
        } else if percent_used >= 0.9 {
            Self::Critical
        } else if percent_used >= 0.75 {
            Self::Warning
        } else {
            Self::Healthy
        }
    }
}

/// Derived budget view for one app and window; recomputed on demand,
/// never stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub window: BudgetWindow,
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percent_used: f64,
    pub health: BudgetHealth,
    pub alert_triggered: bool,
    pub should_block: bool,
}

/// Reporting timeframe for `usage_stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Hour,
    Day,
    Week,
}

impl Timeframe {
    /// Start of the reporting period containing `now`
    pub fn start(&self, now: DateTime<Local>) -> DateTime<Local> {
        match self {
            Self::Hour => now - ChronoDuration::hours(1),
            Self::Day => BudgetWindow::Daily.start(now),
            Self::Week => BudgetWindow::Daily.start(now) - ChronoDuration::days(7),
        }
    }
}

/// Per-model request count inside a reporting period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopModel {
    pub model: String,
    pub requests: u64,
}

/// Aggregated usage for one app over a timeframe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub requests: u64,
    pub cost: f64,
    /// Remaining daily budget, floored at zero
    pub remaining_budget: f64,
    pub top_models: Vec<TopModel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_window_starts_at_midnight() {
        let now = Local.with_ymd_and_hms(2025, 6, 15, 14, 30, 0).unwrap();
        let start = BudgetWindow::Daily.start(now);
        assert_eq!(start, Local.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_window_starts_first_of_month() {
        let now = Local.with_ymd_and_hms(2025, 6, 15, 14, 30, 0).unwrap();
        let start = BudgetWindow::Monthly.start(now);
        assert_eq!(start, Local.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_reset_wraps_december() {
        let now = Local.with_ymd_and_hms(2025, 12, 20, 8, 0, 0).unwrap();
        let until = BudgetWindow::Monthly.until_reset(now);
        let expected = Local.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() - now;
        assert_eq!(until, expected);
    }

    #[test]
    fn test_budget_health_bands() {
        assert_eq!(BudgetHealth::from_percent(0.2), BudgetHealth::Healthy);
        assert_eq!(BudgetHealth::from_percent(0.75), BudgetHealth::Warning);
        assert_eq!(BudgetHealth::from_percent(0.9), BudgetHealth::Critical);
        assert_eq!(BudgetHealth::from_percent(1.0), BudgetHealth::Exceeded);
    }

    #[test]
    fn test_completion_event_recomputes_cost() {
        let event = UsageEvent::for_completion(
            ApplicationContext::Staff,
            "llama-4-scout-17b-16e-instruct",
            "r-1",
            None,
            1000,
            500,
            350,
            0,
        );
        assert!((event.cost - (1000.0 * 0.0001 + 500.0 * 0.0002)).abs() < 1e-12);
        assert!(event.success);
        assert!(!event.cache_hit);
    }

    #[test]
    fn test_cache_hit_event_is_zero_cost() {
        let event = UsageEvent::for_cache_hit(ApplicationContext::Staff, "qwq-32b", "r-2", None, 3);
        assert_eq!(event.cost, 0.0);
        assert!(event.cache_hit);
    }
}
