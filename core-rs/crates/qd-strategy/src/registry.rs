//! Strategy registry: CRUD over strategy records and the promotion
//! ladder (`L0Incubate -> L1Backtest -> L2Paper -> L3Live`, with `Killed`
//! reachable from any level).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use qd_schemas::{RunStatus, StrategyLevel};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum StrategyRegistryError {
    NotFound { id: Uuid },
    DuplicateName { name: String },
    IllegalTransition {
        from: StrategyLevel,
        to: StrategyLevel,
    },
}

impl std::fmt::Display for StrategyRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyRegistryError::NotFound { id } => write!(f, "strategy '{id}' not found"),
            StrategyRegistryError::DuplicateName { name } => {
                write!(f, "strategy name '{name}' already registered")
            }
            StrategyRegistryError::IllegalTransition { from, to } => {
                write!(f, "illegal level transition: {from:?} -> {to:?}")
            }
        }
    }
}

impl std::error::Error for StrategyRegistryError {}

/// Condensed record of the most recent backtest run, enough to render a
/// registry listing without pulling the full report back out of storage.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestSummary {
    pub run_id: Uuid,
    pub sharpe_ratio: f64,
    pub final_equity_micros: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Condensed record of the most recent walk-forward validation.
#[derive(Clone, Debug, PartialEq)]
pub struct WalkForwardSummary {
    pub passed: bool,
    pub ratio: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyRecord {
    pub id: Uuid,
    pub name: String,
    pub level: StrategyLevel,
    pub status: RunStatus,
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_backtest: Option<BacktestSummary>,
    pub last_walk_forward: Option<WalkForwardSummary>,
}

#[derive(Default)]
pub struct StrategyRegistry {
    records: BTreeMap<Uuid, StrategyRecord>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: Uuid,
        name: impl Into<String>,
        params: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<&StrategyRecord, StrategyRegistryError> {
        let name = name.into();
        if self.records.values().any(|r| r.name == name) {
            return Err(StrategyRegistryError::DuplicateName { name });
        }
        let record = StrategyRecord {
            id,
            name,
            level: StrategyLevel::L0Incubate,
            status: RunStatus::Paused,
            params,
            created_at: now,
            updated_at: now,
            last_backtest: None,
            last_walk_forward: None,
        };
        self.records.insert(id, record);
        Ok(self.records.get(&id).expect("just inserted"))
    }

    pub fn get(&self, id: Uuid) -> Option<&StrategyRecord> {
        self.records.get(&id)
    }

    pub fn list(&self) -> impl Iterator<Item = &StrategyRecord> {
        self.records.values()
    }

    pub fn promote(
        &mut self,
        id: Uuid,
        to: StrategyLevel,
        now: DateTime<Utc>,
    ) -> Result<&StrategyRecord, StrategyRegistryError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(StrategyRegistryError::NotFound { id })?;
        if !record.level.can_transition_to(to) {
            return Err(StrategyRegistryError::IllegalTransition {
                from: record.level,
                to,
            });
        }
        record.level = to;
        record.updated_at = now;
        Ok(record)
    }

    pub fn set_status(
        &mut self,
        id: Uuid,
        status: RunStatus,
        now: DateTime<Utc>,
    ) -> Result<&StrategyRecord, StrategyRegistryError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(StrategyRegistryError::NotFound { id })?;
        record.status = status;
        record.updated_at = now;
        Ok(record)
    }

    /// Replaces the strategy's last-backtest summary and refreshes
    /// `updated_at`.
    pub fn update_backtest(
        &mut self,
        id: Uuid,
        summary: BacktestSummary,
        now: DateTime<Utc>,
    ) -> Result<&StrategyRecord, StrategyRegistryError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(StrategyRegistryError::NotFound { id })?;
        record.last_backtest = Some(summary);
        record.updated_at = now;
        Ok(record)
    }

    /// Replaces the strategy's last-walk-forward summary and refreshes
    /// `updated_at`.
    pub fn update_walk_forward(
        &mut self,
        id: Uuid,
        summary: WalkForwardSummary,
        now: DateTime<Utc>,
    ) -> Result<&StrategyRecord, StrategyRegistryError> {
        let record = self
            .records
            .get_mut(&id)
            .ok_or(StrategyRegistryError::NotFound { id })?;
        record.last_walk_forward = Some(summary);
        record.updated_at = now;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn register_starts_at_incubate_and_paused() {
        let mut registry = StrategyRegistry::new();
        let id = Uuid::nil();
        let record = registry
            .register(id, "sma_cross", serde_json::json!({}), now())
            .unwrap();
        assert_eq!(record.level, StrategyLevel::L0Incubate);
        assert_eq!(record.status, RunStatus::Paused);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = StrategyRegistry::new();
        registry
            .register(Uuid::nil(), "dup", serde_json::json!({}), now())
            .unwrap();
        let err = registry
            .register(Uuid::max(), "dup", serde_json::json!({}), now())
            .unwrap_err();
        assert!(matches!(err, StrategyRegistryError::DuplicateName { .. }));
    }

    #[test]
    fn cannot_skip_backwards() {
        let mut registry = StrategyRegistry::new();
        let id = Uuid::nil();
        registry
            .register(id, "s", serde_json::json!({}), now())
            .unwrap();
        registry.promote(id, StrategyLevel::L2Paper, now()).unwrap();
        let err = registry
            .promote(id, StrategyLevel::L1Backtest, now())
            .unwrap_err();
        assert!(matches!(err, StrategyRegistryError::IllegalTransition { .. }));
    }

    #[test]
    fn can_always_kill() {
        let mut registry = StrategyRegistry::new();
        let id = Uuid::nil();
        registry
            .register(id, "s", serde_json::json!({}), now())
            .unwrap();
        registry.promote(id, StrategyLevel::L3Live, now()).unwrap();
        registry.promote(id, StrategyLevel::Killed, now()).unwrap();
        assert_eq!(registry.get(id).unwrap().level, StrategyLevel::Killed);
    }

    #[test]
    fn update_backtest_replaces_prior_summary() {
        let mut registry = StrategyRegistry::new();
        let id = Uuid::nil();
        registry
            .register(id, "s", serde_json::json!({}), now())
            .unwrap();
        registry
            .update_backtest(
                id,
                BacktestSummary {
                    run_id: Uuid::nil(),
                    sharpe_ratio: 1.2,
                    final_equity_micros: 100,
                    recorded_at: now(),
                },
                now(),
            )
            .unwrap();
        registry
            .update_backtest(
                id,
                BacktestSummary {
                    run_id: Uuid::max(),
                    sharpe_ratio: 1.8,
                    final_equity_micros: 200,
                    recorded_at: now(),
                },
                now(),
            )
            .unwrap();
        let record = registry.get(id).unwrap();
        assert_eq!(record.last_backtest.as_ref().unwrap().run_id, Uuid::max());
        assert_eq!(record.last_backtest.as_ref().unwrap().final_equity_micros, 200);
    }

    #[test]
    fn update_walk_forward_on_unknown_id_is_not_found() {
        let mut registry = StrategyRegistry::new();
        let err = registry
            .update_walk_forward(
                Uuid::max(),
                WalkForwardSummary {
                    passed: true,
                    ratio: 1.0,
                    recorded_at: now(),
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, StrategyRegistryError::NotFound { .. }));
    }
}
