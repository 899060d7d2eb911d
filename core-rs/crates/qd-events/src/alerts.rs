//! Edge-triggered price/PnL alerts: a condition fires at most once, the
//! moment a tick first satisfies it, following the same sticky-flag idiom
//! the risk engine uses for halted/disarmed state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::AgentEventStore;

#[derive(Clone, Debug, PartialEq)]
pub enum AlertCondition {
    PriceAbove { symbol: String, threshold_micros: i64 },
    PriceBelow { symbol: String, threshold_micros: i64 },
    PnlBelowPct { threshold_pct: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub id: Uuid,
    pub condition: AlertCondition,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
    pub notified: bool,
    pub message: Option<String>,
}

impl Alert {
    fn is_satisfied(&self, prices: &BTreeMap<String, i64>, pnl_pct: Option<f64>) -> bool {
        match &self.condition {
            AlertCondition::PriceAbove {
                symbol,
                threshold_micros,
            } => prices.get(symbol).is_some_and(|p| *p > *threshold_micros),
            AlertCondition::PriceBelow {
                symbol,
                threshold_micros,
            } => prices.get(symbol).is_some_and(|p| *p < *threshold_micros),
            AlertCondition::PnlBelowPct { threshold_pct } => {
                pnl_pct.is_some_and(|pnl| pnl < *threshold_pct)
            }
        }
    }
}

#[derive(Default)]
pub struct AlertEngine {
    alerts: BTreeMap<Uuid, Alert>,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: Uuid, condition: AlertCondition, now: DateTime<Utc>) {
        self.alerts.insert(
            id,
            Alert {
                id,
                condition,
                created_at: now,
                triggered_at: None,
                notified: false,
                message: None,
            },
        );
    }

    pub fn get(&self, id: Uuid) -> Option<&Alert> {
        self.alerts.get(&id)
    }

    pub fn list(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.values()
    }

    /// Evaluates every not-yet-triggered alert against one tick of
    /// prices/pnl, returning the ids that fired just now. Each newly-fired
    /// alert is also recorded as a `Completed` event in `store`, so the
    /// approval feed and the alert feed share one audit trail.
    pub fn evaluate_tick(
        &mut self,
        prices: &BTreeMap<String, i64>,
        pnl_pct: Option<f64>,
        now: DateTime<Utc>,
        store: &mut AgentEventStore,
    ) -> Vec<Uuid> {
        let mut fired = Vec::new();
        for alert in self.alerts.values_mut() {
            if alert.triggered_at.is_some() {
                continue;
            }
            if alert.is_satisfied(prices, pnl_pct) {
                let message = describe(&alert.condition);
                alert.triggered_at = Some(now);
                alert.notified = true;
                alert.message = Some(message.clone());
                fired.push(alert.id);

                store.add_completed_event("alert", message.clone(), message, now.timestamp_millis());
            }
        }
        fired
    }
}

fn describe(condition: &AlertCondition) -> String {
    match condition {
        AlertCondition::PriceAbove {
            symbol,
            threshold_micros,
        } => format!("{symbol} crossed above {threshold_micros}"),
        AlertCondition::PriceBelow {
            symbol,
            threshold_micros,
        } => format!("{symbol} crossed below {threshold_micros}"),
        AlertCondition::PnlBelowPct { threshold_pct } => {
            format!("pnl fell below {threshold_pct}%")
        }
    }
}
