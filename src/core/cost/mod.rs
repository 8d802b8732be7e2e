//! Usage accounting and admission control
//!
//! The ledger is the source of truth for all budget and reporting queries;
//! admission decisions run before any upstream cost is incurred.

mod monitor;
mod types;

pub use monitor::{CostMonitor, estimate_tokens};
pub use types::{
    BudgetHealth, BudgetStatus, BudgetWindow, Timeframe, TopModel, UsageEvent, UsageStats,
};
