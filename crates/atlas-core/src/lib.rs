//! # Atlas Core
//!
//! Order registry for a matching engine: every live order, by id.
//!
//! ## Design Principles
//! - O(1) add, lookup, replace, delete
//! - No allocation under steady add/delete churn (slot reuse)
//! - Replace mutates in place, re-keying without moving the order
//! - Single-threaded: one registry per book thread, no locks

#![no_std]

extern crate alloc;

pub mod config;
pub mod error;
pub mod fixed;
pub mod index;
pub mod order;
pub mod pool;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{ConfigError, RegistryError};
pub use fixed::{Price, Quantity};
pub use index::{OrderIdHasher, OrderIndex};
pub use order::{Order, OrderId, OrderMut, OrderType, Side, SymbolId};
pub use pool::{OrderHandle, OrderPool};
pub use registry::{OrderRegistry, RegistryStats};
