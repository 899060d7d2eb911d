pub mod alerts;
pub mod store;

pub use alerts::{Alert, AlertCondition, AlertEngine};
pub use store::{AgentEvent, AgentEventStore, EventStatus, EventStoreError, CAPACITY};
