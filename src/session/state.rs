//! Per-session bathtub state: running totals and exchange history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impact::ImpactFactors;

/// One question/response pair with its computed impact figures. Immutable
/// once recorded; cleared only by a reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub response: String,
    pub tokens_used: u64,
    pub co2_emission: f64,
    pub water_used: f64,
}

/// Wire payload for a successful ask: this exchange's figures plus the
/// updated running totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskReport {
    pub response: String,
    pub tokens_used: u64,
    pub co2_emission: f64,
    pub water_used: f64,
    pub total_tokens: u64,
    pub total_co2: f64,
    pub total_water: f64,
    pub overflowed: bool,
    pub water_level_percentage: f64,
}

/// Wire payload for `/stats` and the initial page render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_tokens: u64,
    pub total_co2: f64,
    pub total_water: f64,
    pub water_level_percentage: f64,
    pub bathtub_capacity: u64,
}

/// Wire payload for `/reset`: confirmation plus the zeroed totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetReport {
    pub message: String,
    pub total_tokens: u64,
    pub total_co2: f64,
    pub total_water: f64,
    pub water_level_percentage: f64,
}

impl ResetReport {
    pub fn zeroed() -> Self {
        Self {
            message: "Bathtub reset!".to_string(),
            total_tokens: 0,
            total_co2: 0.0,
            total_water: 0.0,
            water_level_percentage: 0.0,
        }
    }
}

/// A user's bathtub. All four tracked fields exist from construction on, so
/// there is never a key-presence check; the CO2/water totals are recomputed
/// from `total_tokens` on every update, which keeps the
/// `total == tokens x coefficient` invariant exact rather than drifting
/// through float accumulation.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub total_tokens: u64,
    pub total_co2: f64,
    pub total_water: f64,
    pub history: Vec<Exchange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            total_tokens: 0,
            total_co2: 0.0,
            total_water: 0.0,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Soft admission gate: would this estimated cost push the total past
    /// capacity? Compared as floats because the estimate is fractional.
    pub fn would_overflow(&self, estimated_tokens: f64, capacity: u64) -> bool {
        self.total_tokens as f64 + estimated_tokens > capacity as f64
    }

    /// True once the tub has actually been filled past capacity.
    pub fn overflowed(&self, capacity: u64) -> bool {
        self.total_tokens > capacity
    }

    /// Fill level as a percentage of capacity, clamped to 100.
    pub fn water_level_percentage(&self, capacity: u64) -> f64 {
        (self.total_tokens as f64 / capacity as f64 * 100.0).min(100.0)
    }

    /// Folds a completed exchange into the totals and appends it to the
    /// history. Returns the wire report computed from the post-update state.
    pub fn record_exchange(
        &mut self,
        question: String,
        response: String,
        tokens_used: u64,
        factors: ImpactFactors,
        capacity: u64,
    ) -> AskReport {
        let co2_emission = factors.co2_for(tokens_used);
        let water_used = factors.water_for(tokens_used);

        self.total_tokens += tokens_used;
        self.total_co2 = factors.co2_for(self.total_tokens);
        self.total_water = factors.water_for(self.total_tokens);
        self.updated_at = Utc::now();

        self.history.push(Exchange {
            timestamp: self.updated_at,
            question,
            response: response.clone(),
            tokens_used,
            co2_emission,
            water_used,
        });

        AskReport {
            response,
            tokens_used,
            co2_emission,
            water_used,
            total_tokens: self.total_tokens,
            total_co2: self.total_co2,
            total_water: self.total_water,
            overflowed: self.overflowed(capacity),
            water_level_percentage: self.water_level_percentage(capacity),
        }
    }

    /// Drains the tub: totals to zero, history cleared.
    pub fn reset(&mut self) {
        self.total_tokens = 0;
        self.total_co2 = 0.0;
        self.total_water = 0.0;
        self.history.clear();
        self.updated_at = Utc::now();
    }

    pub fn snapshot(&self, capacity: u64) -> StatsSnapshot {
        StatsSnapshot {
            total_tokens: self.total_tokens,
            total_co2: self.total_co2,
            total_water: self.total_water,
            water_level_percentage: self.water_level_percentage(capacity),
            bathtub_capacity: capacity,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
