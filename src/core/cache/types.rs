//! Cache type definitions

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::types::ApplicationContext;

/// How the cache chooses a victim at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Oldest last-access
    #[default]
    Lru,
    /// Fewest hits
    Lfu,
    /// Soonest expiry
    Ttl,
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl: Duration,
    pub eviction_policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: Duration::from_secs(5 * 60),
            eviction_policy: EvictionPolicy::Lru,
        }
    }
}

/// Request attribution stored alongside a cached value
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    pub model: String,
    pub app: ApplicationContext,
    /// Cost the original computation incurred; a hit saves this amount
    pub cost: Option<f64>,
    pub response_time_ms: Option<u64>,
}

/// One cached response with lifecycle bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub hits: u64,
    pub last_accessed: Instant,
    pub metadata: EntryMetadata,
}

impl CacheEntry {
    pub fn new(value: String, ttl: Duration, metadata: EntryMetadata) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            hits: 0,
            last_accessed: now,
            metadata,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }

    pub fn mark_accessed(&mut self) {
        self.hits += 1;
        self.last_accessed = Instant::now();
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    /// Total upstream cost avoided by hits
    pub cost_saved: f64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Usage summary produced by `ResponseCache::analyze`
#[derive(Debug, Clone, Default)]
pub struct CacheAnalysis {
    /// Models ranked by accumulated hits
    pub top_models: Vec<(String, u64)>,
    /// Apps ranked by accumulated hits
    pub top_apps: Vec<(ApplicationContext, u64)>,
}

/// Default TTL per calling application: short for real-time surfaces,
/// long for low-volatility content like educational handouts.
pub fn default_ttl_for(app: ApplicationContext) -> Duration {
    use ApplicationContext::*;
    let minutes = |m: u64| Duration::from_secs(m * 60);
    let hours = |h: u64| Duration::from_secs(h * 3600);
    match app {
        AiReceptionist => minutes(2),
        ClinicalStaffing => minutes(30),
        CheckinKiosk => minutes(5),
        EosL10 => hours(1),
        Inventory => minutes(15),
        Handouts => hours(2),
        MedicationAuth => minutes(10),
        PharmaScheduling => hours(4),
        CallCenterOps => minutes(5),
        BatchCloseout => hours(1),
        SocialsReviews => hours(6),
        ComplianceTraining => hours(24),
        PlatformDashboard => minutes(15),
        ConfigDashboard => hours(1),
        ComponentShowcase => hours(1),
        Staff => minutes(30),
        IntegrationStatus => minutes(10),
    }
}
