pub mod allocator;
pub mod grouping;

pub use allocator::{
    allocate, AllocationConstraints, AllocationDecision, AllocationEntry, AllocationError,
    RejectedCandidate, RejectionReason, StrategyCandidate,
};
pub use grouping::{group_by_correlation, UnionFind};
