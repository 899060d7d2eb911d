//! Paper trading engine: synchronous order intake against external price
//! ticks, plus strategy health/decay classification over the resulting
//! equity curve.

pub mod decay;
pub mod engine;
pub mod types;

pub use decay::{classify as classify_decay, DecayLevel, DecayState};
pub use engine::{submit_order, try_fill_pending, snapshot, PaperError};
pub use types::{OrderStatus, PaperAccountState, PaperOrder, PaperPosition};
