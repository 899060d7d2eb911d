//! Strategy trait, built-in strategies, and the strategy registry.

pub mod builtins;
pub mod registry;
pub mod types;

pub use registry::{
    BacktestSummary, StrategyRecord, StrategyRegistry, StrategyRegistryError, WalkForwardSummary,
};
pub use types::{MarketRegime, MemoryValue, PositionSnapshot, Signal, StrategyContext, StrategyMemory};

/// A trading strategy. `on_bar` is the only required hook; `init` and
/// `on_day_end` default to no-ops for strategies that don't need them.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Called once before the first bar, with the first bar already in
    /// context, so a strategy can seed memory from warm-up data.
    fn init(&mut self, _ctx: &mut StrategyContext<'_>) {}

    fn on_bar(&mut self, ctx: &mut StrategyContext<'_>) -> Option<Signal>;

    /// Called once after the last bar of a trading day has been
    /// processed, for strategies that track daily state (e.g. a
    /// once-per-day cooldown).
    fn on_day_end(&mut self, _ctx: &mut StrategyContext<'_>) {}
}
