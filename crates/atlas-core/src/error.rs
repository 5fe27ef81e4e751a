//! Registry and configuration errors.

use thiserror::Error;
use crate::order::OrderId;

/// Failure of a registry operation. The registry is unchanged whenever one
/// of these is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identifier is not tracked.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
    /// The identifier is already tracked by another live order.
    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),
    /// The pool is bounded and every slot is live.
    #[error("order pool exhausted ({capacity} slots)")]
    CapacityExhausted { capacity: usize },
}

/// Rejected `RegistryConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_capacity must be non-zero")]
    ZeroMaxCapacity,
    #[error("initial_capacity {initial} exceeds max_capacity {max}")]
    InitialExceedsMax { initial: usize, max: usize },
    #[error("capacity {requested} exceeds the handle space ({limit} slots)")]
    CapacityTooLarge { requested: usize, limit: usize },
}
