//! Order registry.
//!
//! Tracks every live order by id. Orders live in pool slots; the index maps
//! ids to slots. Every operation keeps the two in step: an id is in the
//! index iff its slot is live, and the slot's order carries that id.
//!
//! Replacing an order mutates its slot in place, re-keying the index when
//! the id changes, so amendments never release and re-acquire storage.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

use crate::config::RegistryConfig;
use crate::error::{ConfigError, RegistryError};
use crate::fixed::{Price, Quantity};
use crate::index::OrderIndex;
use crate::order::{Order, OrderId, OrderMut};
use crate::pool::{OrderHandle, OrderPool};

/// Point-in-time counters for a registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryStats {
    /// Live orders.
    pub live: usize,
    /// Slots allocated.
    pub slot_capacity: usize,
    /// Free slots reusable without growing.
    pub free_slots: usize,
    /// Most orders ever live at once.
    pub peak_live: usize,
    /// Pool expansions since construction.
    pub pool_growths: u32,
    /// Ids the index holds before rehashing.
    pub index_capacity: usize,
}

/// Registry of live orders keyed by `OrderId`.
///
/// Not `Clone`: the registry is the sole owner of its slots. It is `Send`,
/// so it can be handed to the thread that drives one book, but not `Sync`;
/// sharing one registry between threads needs external locking, and the
/// intended model is one registry per book thread.
///
/// ```compile_fail
/// use atlas_core::OrderRegistry;
///
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<OrderRegistry>();
/// ```
///
/// ```compile_fail
/// use atlas_core::OrderRegistry;
///
/// let a = OrderRegistry::new();
/// let b = a.clone();
/// ```
pub struct OrderRegistry {
    pool: OrderPool,
    index: OrderIndex,
    _not_sync: PhantomData<Cell<()>>,
}

impl OrderRegistry {
    /// Registry with the default config (1024 slots, growable).
    pub fn new() -> Self {
        Self::from_valid_config(RegistryConfig::default())
    }

    /// Growable registry with `capacity` slots allocated up front.
    ///
    /// # Panics
    /// Panics if `capacity` exceeds `pool::MAX_SLOTS`.
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::with_config(RegistryConfig::growable(capacity)) {
            Ok(registry) => registry,
            Err(err) => panic!("invalid registry capacity: {}", err),
        }
    }

    pub fn with_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: RegistryConfig) -> Self {
        tracing::debug!(
            initial_capacity = config.initial_capacity,
            max_capacity = ?config.max_capacity,
            "order registry created"
        );
        Self {
            pool: OrderPool::new(config.initial_capacity, config.max_capacity),
            index: OrderIndex::with_capacity(config.initial_capacity),
            _not_sync: PhantomData,
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline(always)]
    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains(id)
    }

    #[inline]
    pub fn lookup(&self, id: OrderId) -> Option<&Order> {
        self.index.get(id).map(|handle| self.pool.get(handle))
    }

    /// Mutable access to a live order. The id itself can only be changed
    /// through `replace`.
    #[inline]
    pub fn lookup_mut(&mut self, id: OrderId) -> Option<OrderMut<'_>> {
        let handle = self.index.get(id)?;
        Some(OrderMut::new(self.pool.get_mut(handle)))
    }

    /// Copy `order` into a free slot and index it under `order.id()`.
    ///
    /// Fails without touching the registry if the id is already tracked or
    /// a bounded pool is full.
    #[inline]
    pub fn add(&mut self, order: Order) -> Result<OrderMut<'_>, RegistryError> {
        let id = order.id();
        if self.index.contains(id) {
            tracing::error!(order_id = id.0, "add with an id that is already live");
            return Err(RegistryError::DuplicateOrder(id));
        }

        let Some(handle) = self.pool.acquire(order) else {
            let capacity = self.pool.capacity();
            tracing::warn!(order_id = id.0, capacity, "order pool exhausted");
            return Err(RegistryError::CapacityExhausted { capacity });
        };

        let inserted = self.index.insert(id, handle);
        debug_assert!(inserted.is_ok(), "index and pool out of step");

        Ok(OrderMut::new(self.pool.get_mut(handle)))
    }

    /// Amend price and quantity of order `id`, re-keying it to `new_id`.
    ///
    /// The order keeps its slot and every other field. Fails with
    /// `OrderNotFound` if `id` is not live, or `DuplicateOrder` if `new_id`
    /// belongs to a different live order; either way nothing changes.
    #[inline]
    pub fn replace(
        &mut self,
        id: OrderId,
        new_id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> Result<OrderMut<'_>, RegistryError> {
        let handle = self.index.get(id).ok_or(RegistryError::OrderNotFound(id))?;
        if new_id != id {
            self.rekey(id, new_id, handle)?;
        }

        let order = self.pool.get_mut(handle);
        order.set_id(new_id);
        order.price = new_price;
        order.quantity = new_quantity;
        Ok(OrderMut::new(order))
    }

    /// Overwrite order `id` with `new_order`, re-keying to `new_order.id()`.
    ///
    /// Same failure rules as `replace`.
    #[inline]
    pub fn replace_with(&mut self, id: OrderId, new_order: Order) -> Result<OrderMut<'_>, RegistryError> {
        let handle = self.index.get(id).ok_or(RegistryError::OrderNotFound(id))?;
        let new_id = new_order.id();
        if new_id != id {
            self.rekey(id, new_id, handle)?;
        }

        let order = self.pool.get_mut(handle);
        *order = new_order;
        Ok(OrderMut::new(order))
    }

    /// Remove order `id`, returning it. Its slot is reused by the next add.
    ///
    /// Deleting an id that is not live is a no-op.
    #[inline]
    pub fn delete(&mut self, id: OrderId) -> Option<Order> {
        let handle = self.index.remove(id)?;
        Some(self.pool.release(handle))
    }

    /// Remove every order. Slots and index capacity are kept for reuse.
    pub fn clear(&mut self) {
        self.index.clear();
        self.pool.reset();
    }

    /// Live orders in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.index.iter().map(move |(_, handle)| self.pool.get(handle))
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            live: self.index.len(),
            slot_capacity: self.pool.capacity(),
            free_slots: self.pool.available(),
            peak_live: self.pool.peak_active(),
            pool_growths: self.pool.growths(),
            index_capacity: self.index.capacity(),
        }
    }

    /// Verify that index and pool agree. Walks every entry; for tests and
    /// debug tooling only.
    ///
    /// # Panics
    /// Panics describing the first inconsistency found.
    #[doc(hidden)]
    pub fn assert_consistent(&self) {
        assert_eq!(self.index.len(), self.pool.active(), "index size != live slots");
        assert_eq!(
            self.pool.active() + self.pool.available(),
            self.pool.capacity(),
            "live + free != capacity"
        );

        let mut seen = alloc::vec![false; self.pool.capacity()];
        for (id, handle) in self.index.iter() {
            assert!(handle.index() < seen.len(), "handle {:?} out of range", handle);
            assert!(!seen[handle.index()], "slot {:?} indexed twice", handle);
            seen[handle.index()] = true;
            assert_eq!(self.pool.get(handle).id(), id, "slot {:?} holds the wrong order", handle);
        }
    }

    /// Move the index entry for `old_id` to `new_id`.
    #[inline]
    fn rekey(&mut self, old_id: OrderId, new_id: OrderId, handle: OrderHandle) -> Result<(), RegistryError> {
        if self.index.contains(new_id) {
            tracing::error!(order_id = old_id.0, new_order_id = new_id.0, "replace onto an id that is already live");
            return Err(RegistryError::DuplicateOrder(new_id));
        }

        let removed = self.index.remove(old_id);
        debug_assert_eq!(removed, Some(handle), "index and pool out of step");
        let inserted = self.index.insert(new_id, handle);
        debug_assert!(inserted.is_ok(), "index and pool out of step");
        Ok(())
    }
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OrderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderRegistry")
            .field("len", &self.len())
            .field("slot_capacity", &self.pool.capacity())
            .finish()
    }
}
