//! Cost monitor: usage ledger, budget enforcement, admission control
//!
//! Owns the shared mutable state that admission decisions read: the
//! append-only ledger, the emergency-stop flag, and per-model dispatch
//! times. One instance is owned by one gateway; tests construct isolated
//! instances and use `reset` for control.

use std::time::{Duration, Instant};

use chrono::Local;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use super::types::{
    BudgetHealth, BudgetStatus, BudgetWindow, Timeframe, TopModel, UsageEvent, UsageStats,
};
use crate::core::registry::{ModelConfig, app_rate_limits};
use crate::core::types::ApplicationContext;
use crate::utils::error::{GatewayError, Result};

/// Budget share beyond which a projected request is rejected. Deliberately
/// under 100%: concurrent admission checks may interleave, so the ceiling
/// is a soft cap with a safety margin.
const BUDGET_BLOCK_THRESHOLD: f64 = 0.95;
/// Daily spend share that triggers an alert
const DAILY_ALERT_THRESHOLD: f64 = 0.8;
/// Monthly spend share that triggers an alert
const MONTHLY_ALERT_THRESHOLD: f64 = 0.9;
/// Minimum gap between repeated alerts for the same key
const ALERT_COOLDOWN: Duration = Duration::from_secs(15 * 60);
/// Per-request cost considered anomalous
const HIGH_COST_PER_REQUEST: f64 = 1.0;
/// Response time considered anomalous
const SLOW_RESPONSE_MS: u64 = 10_000;

/// Pre-flight token estimate: roughly four characters per token. A
/// documented approximation, not exact tokenization; recorded usage
/// prefers upstream-reported counts.
pub fn estimate_tokens(chars: usize) -> u32 {
    chars.div_ceil(4) as u32
}

/// Per-application, per-model usage ledger with budget enforcement
pub struct CostMonitor {
    ledger: RwLock<Vec<UsageEvent>>,
    emergency_stop: AtomicBool,
    /// Last dispatch instant per model, for cooldown enforcement
    last_dispatch: DashMap<String, Instant>,
    /// Last alert instant per alert key
    alert_times: Mutex<HashMap<String, Instant>>,
}

impl CostMonitor {
    pub fn new() -> Self {
        Self {
            ledger: RwLock::new(Vec::new()),
            emergency_stop: AtomicBool::new(false),
            last_dispatch: DashMap::new(),
            alert_times: Mutex::new(HashMap::new()),
        }
    }

    /// Append one usage event and run alert checks
    pub fn record(&self, event: UsageEvent) {
        if event.cost >= HIGH_COST_PER_REQUEST {
            self.alert(
                format!("high_cost:{}", event.app),
                format_args!("unusually expensive request: ${:.4} on {}", event.cost, event.model),
            );
        }
        if event.response_time_ms >= SLOW_RESPONSE_MS {
            self.alert(
                format!("slow_response:{}", event.app),
                format_args!("slow response: {} ms on {}", event.response_time_ms, event.model),
            );
        }
        let app = event.app;
        self.ledger.write().push(event);
        self.check_budget_alerts(app);
    }

    /// Spend recorded for an app inside the window containing now
    pub fn spent_in_window(&self, app: ApplicationContext, window: BudgetWindow) -> f64 {
        let start = window.start(Local::now()).with_timezone(&chrono::Utc);
        self.ledger
            .read()
            .iter()
            .filter(|e| e.app == app && e.timestamp >= start)
            .map(|e| e.cost)
            .sum()
    }

    /// Requests recorded for an app today
    pub fn requests_today(&self, app: ApplicationContext) -> u32 {
        let start = BudgetWindow::Daily
            .start(Local::now())
            .with_timezone(&chrono::Utc);
        self.ledger
            .read()
            .iter()
            .filter(|e| e.app == app && e.timestamp >= start)
            .count() as u32
    }

    /// Derived budget view for an app and window
    pub fn budget_status(&self, app: ApplicationContext, window: BudgetWindow) -> BudgetStatus {
        let limits = app_rate_limits(app);
        let budget = match window {
            BudgetWindow::Daily => limits.daily_budget_usd,
            BudgetWindow::Monthly => limits.monthly_budget_usd(),
        };
        let spent = self.spent_in_window(app, window);
        let percent_used = if budget > 0.0 { spent / budget } else { 1.0 };
        let alert_threshold = match window {
            BudgetWindow::Daily => DAILY_ALERT_THRESHOLD,
            BudgetWindow::Monthly => MONTHLY_ALERT_THRESHOLD,
        };
        BudgetStatus {
            window,
            budget,
            spent,
            remaining: (budget - spent).max(0.0),
            percent_used,
            health: BudgetHealth::from_percent(percent_used),
            alert_triggered: percent_used >= alert_threshold,
            should_block: percent_used >= 1.0,
        }
    }

    /// Pre-flight admission decision. Checks run in order: emergency stop,
    /// model cooldown, daily request cap, budget projection. No state
    /// changes on rejection; on acceptance the dispatch instant is
    /// recorded so the next cooldown check is accurate.
    ///
    /// `enforce_rate_limits` gates the cooldown and request-cap checks
    /// only; the emergency stop and budget projection always apply.
    pub fn admit(
        &self,
        app: ApplicationContext,
        model: &ModelConfig,
        estimated_tokens: u32,
        enforce_rate_limits: bool,
    ) -> Result<()> {
        if self.emergency_stop.load(Ordering::SeqCst) {
            return Err(GatewayError::EmergencyStop);
        }

        let cooldown = model.rate_limits.cooldown;
        if enforce_rate_limits && !cooldown.is_zero() {
            if let Some(last) = self.last_dispatch.get(model.model) {
                let elapsed = last.elapsed();
                if elapsed < cooldown {
                    let remaining = cooldown - elapsed;
                    debug!(model = model.model, ?remaining, "cooldown not elapsed");
                    return Err(GatewayError::rate_limit(
                        format!("model {} is cooling down", model.model),
                        remaining,
                    ));
                }
            }
        }

        let limits = app_rate_limits(app);
        if enforce_rate_limits && self.requests_today(app) >= limits.daily_request_limit {
            let until_reset = BudgetWindow::Daily
                .until_reset(Local::now())
                .to_std()
                .unwrap_or_default();
            return Err(GatewayError::rate_limit(
                format!("daily request limit reached for {}", app),
                until_reset,
            ));
        }

        // Conservative projection: the worst-case per-token rate, since the
        // input/output split is unknown before dispatch.
        let estimated_cost = estimated_tokens as f64 * model.max_cost_per_token();
        let spent_today = self.spent_in_window(app, BudgetWindow::Daily);
        let projected = spent_today + estimated_cost;
        if projected > limits.daily_budget_usd * BUDGET_BLOCK_THRESHOLD {
            return Err(GatewayError::budget(
                format!(
                    "projected spend ${projected:.2} exceeds daily budget for {app}"
                ),
                spent_today,
                limits.daily_budget_usd,
            ));
        }
        let spent_month = self.spent_in_window(app, BudgetWindow::Monthly);
        let monthly_budget = limits.monthly_budget_usd();
        if spent_month + estimated_cost > monthly_budget * BUDGET_BLOCK_THRESHOLD {
            return Err(GatewayError::budget(
                format!(
                    "projected spend ${:.2} exceeds monthly budget for {app}",
                    spent_month + estimated_cost
                ),
                spent_month,
                monthly_budget,
            ));
        }

        self.last_dispatch
            .insert(model.model.to_string(), Instant::now());
        Ok(())
    }

    /// Aggregated usage for an app over a reporting timeframe
    pub fn usage_stats(&self, app: ApplicationContext, timeframe: Timeframe) -> UsageStats {
        let start = timeframe.start(Local::now()).with_timezone(&chrono::Utc);
        let ledger = self.ledger.read();
        let mut requests = 0u64;
        let mut cost = 0.0;
        let mut by_model: HashMap<String, u64> = HashMap::new();
        for event in ledger.iter().filter(|e| e.app == app && e.timestamp >= start) {
            requests += 1;
            cost += event.cost;
            *by_model.entry(event.model.clone()).or_default() += 1;
        }
        drop(ledger);

        let mut top_models: Vec<TopModel> = by_model
            .into_iter()
            .map(|(model, requests)| TopModel { model, requests })
            .collect();
        top_models.sort_by(|a, b| b.requests.cmp(&a.requests));

        let daily = self.budget_status(app, BudgetWindow::Daily);
        UsageStats {
            requests,
            cost,
            remaining_budget: daily.remaining,
            top_models,
        }
    }

    /// Activate or clear the process-wide emergency stop
    pub fn set_emergency_stop(&self, active: bool) {
        self.emergency_stop.store(active, Ordering::SeqCst);
        if active {
            warn!("emergency stop activated: all requests will be rejected");
        } else {
            debug!("emergency stop cleared");
        }
    }

    /// Current emergency-stop state
    pub fn emergency_stopped(&self) -> bool {
        self.emergency_stop.load(Ordering::SeqCst)
    }

    /// Clear all state: ledger, dispatch times, emergency flag, alerts
    pub fn reset(&self) {
        self.ledger.write().clear();
        self.last_dispatch.clear();
        self.alert_times.lock().clear();
        self.emergency_stop.store(false, Ordering::SeqCst);
    }

    fn check_budget_alerts(&self, app: ApplicationContext) {
        for window in [BudgetWindow::Daily, BudgetWindow::Monthly] {
            let status = self.budget_status(app, window);
            if status.alert_triggered {
                self.alert(
                    format!("budget:{app}:{window:?}"),
                    format_args!(
                        "{app} has used {:.0}% of its {window:?} budget (${:.2}/${:.2})",
                        status.percent_used * 100.0,
                        status.spent,
                        status.budget
                    ),
                );
            }
        }
    }

    /// Emit an alert unless the same key alerted within the cooldown
    fn alert(&self, key: String, message: std::fmt::Arguments<'_>) {
        let mut times = self.alert_times.lock();
        let now = Instant::now();
        if let Some(last) = times.get(&key) {
            if now.duration_since(*last) < ALERT_COOLDOWN {
                return;
            }
        }
        times.insert(key.clone(), now);
        warn!(alert = %key, "{}", message);
    }
}

impl Default for CostMonitor {
    fn default() -> Self {
        Self::new()
    }
}
