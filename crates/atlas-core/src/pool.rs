//! Slot pool for order records.
//!
//! Slots are handed out from a LIFO free list so a slot released by a
//! delete is the first one reused by the next add, while it is still warm
//! in cache. The pool only grows when every slot is live, and never
//! shrinks: under steady add/delete churn it performs no allocation.

use alloc::vec::Vec;
use crate::order::Order;

/// Upper bound on slots in one pool (2^28 orders, 16 GiB of records).
pub const MAX_SLOTS: usize = 1 << 28;

/// Smallest step by which a growable pool expands.
const MIN_GROWTH: usize = 64;

/// Index of a slot in the pool.
///
/// Uses u32 to keep index entries small.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OrderHandle(pub u32);

impl OrderHandle {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool of order slots.
pub struct OrderPool {
    /// Slot storage. Free slots hold stale records and are never read.
    slots: Vec<Order>,
    /// LIFO free list, sized to hold every slot so releases never allocate.
    free_list: Vec<u32>,
    /// Growth ceiling in slots.
    max_capacity: usize,
    active_count: usize,
    /// High-water mark of `active_count`.
    peak_active: usize,
    growths: u32,
}

impl OrderPool {
    /// Create a pool with `initial` slots allocated up front.
    ///
    /// `max_capacity = None` lets the pool grow up to `MAX_SLOTS`.
    pub fn new(initial: usize, max_capacity: Option<usize>) -> Self {
        let max_capacity = max_capacity.unwrap_or(MAX_SLOTS).min(MAX_SLOTS);
        let initial = initial.min(max_capacity);

        let mut pool = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            max_capacity,
            active_count: 0,
            peak_active: 0,
            growths: 0,
        };
        pool.extend_to(initial);
        pool
    }

    /// Fixed-size pool.
    pub fn bounded(capacity: usize) -> Self {
        Self::new(capacity, Some(capacity))
    }

    /// Take a free slot and write `order` into it.
    ///
    /// Returns `None` when every slot is live and the pool is at its ceiling.
    #[inline]
    pub fn acquire(&mut self, order: Order) -> Option<OrderHandle> {
        let idx = match self.free_list.pop() {
            Some(idx) => idx,
            None => {
                if !self.grow() {
                    return None;
                }
                self.free_list.pop()?
            }
        };

        self.slots[idx as usize] = order;
        self.active_count += 1;
        if self.active_count > self.peak_active {
            self.peak_active = self.active_count;
        }
        Some(OrderHandle(idx))
    }

    /// Return a slot to the free list, handing back the record it held.
    ///
    /// The handle must be live; releasing it twice corrupts the free list.
    #[inline]
    pub fn release(&mut self, handle: OrderHandle) -> Order {
        debug_assert!(handle.index() < self.slots.len(), "Invalid handle");
        debug_assert!(self.active_count > 0, "Double release");

        self.free_list.push(handle.0);
        self.active_count -= 1;
        self.slots[handle.index()]
    }

    #[inline(always)]
    pub fn get(&self, handle: OrderHandle) -> &Order {
        &self.slots[handle.index()]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, handle: OrderHandle) -> &mut Order {
        &mut self.slots[handle.index()]
    }

    /// Mark every slot free. Capacity and the high-water mark are kept.
    pub fn reset(&mut self) {
        self.free_list.clear();
        self.free_list.extend((0..self.slots.len() as u32).rev());
        self.active_count = 0;
    }

    /// Number of live slots.
    #[inline(always)]
    pub fn active(&self) -> usize {
        self.active_count
    }

    /// Free slots available without growing.
    #[inline(always)]
    pub fn available(&self) -> usize {
        self.free_list.len()
    }

    /// Slots currently allocated.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Most slots ever live at once.
    #[inline(always)]
    pub fn peak_active(&self) -> usize {
        self.peak_active
    }

    /// Times the pool has expanded past its initial size.
    #[inline(always)]
    pub fn growths(&self) -> u32 {
        self.growths
    }

    #[inline(always)]
    pub fn is_full(&self) -> bool {
        self.free_list.is_empty() && self.slots.len() >= self.max_capacity
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }

    /// Double the slot count, clamped to the ceiling. Cold path.
    #[cold]
    fn grow(&mut self) -> bool {
        let capacity = self.slots.len();
        if capacity >= self.max_capacity {
            return false;
        }

        let target = capacity
            .saturating_mul(2)
            .max(capacity + MIN_GROWTH)
            .min(self.max_capacity);
        self.extend_to(target);
        self.growths += 1;

        tracing::debug!(from = capacity, to = target, active = self.active_count, "order pool grown");
        true
    }

    fn extend_to(&mut self, target: usize) {
        let capacity = self.slots.len();
        if target <= capacity {
            return;
        }

        self.slots.resize(target, Order::default());
        self.free_list.reserve_exact(target - self.free_list.len());
        // Lowest new index ends up on top of the stack.
        self.free_list.extend((capacity as u32..target as u32).rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;

    fn order(id: u64) -> Order {
        Order::limit(id, Side::Buy, 100, 10)
    }

    #[test]
    fn test_pool_acquire_release() {
        let mut pool = OrderPool::bounded(16);
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.available(), 16);

        let h1 = pool.acquire(order(1)).unwrap();
        assert_eq!(pool.available(), 15);
        assert_eq!(pool.active(), 1);

        let h2 = pool.acquire(order(2)).unwrap();
        assert_eq!(pool.active(), 2);
        assert_ne!(h1, h2);

        let released = pool.release(h1);
        assert_eq!(released.id().0, 1);
        assert_eq!(pool.available(), 15);
        assert_eq!(pool.active(), 1);

        // LIFO: next acquire reuses h1's slot
        let h3 = pool.acquire(order(3)).unwrap();
        assert_eq!(h3, h1);
        assert_eq!(pool.get(h3).id().0, 3);
    }

    #[test]
    fn test_pool_get_mut() {
        let mut pool = OrderPool::bounded(4);
        let handle = pool.acquire(order(42)).unwrap();

        pool.get_mut(handle).quantity.0 = 7;
        assert_eq!(pool.get(handle).quantity.0, 7);
        assert_eq!(pool.get(handle).id().0, 42);
    }

    #[test]
    fn test_bounded_pool_exhaustion() {
        let mut pool = OrderPool::bounded(4);
        for id in 0..4 {
            assert!(pool.acquire(order(id)).is_some());
        }

        assert!(pool.is_full());
        assert!(pool.acquire(order(99)).is_none());
        assert_eq!(pool.capacity(), 4);
        assert_eq!(pool.growths(), 0);
    }

    #[test]
    fn test_growable_pool_doubles() {
        let mut pool = OrderPool::new(64, None);
        for id in 0..65 {
            pool.acquire(order(id)).unwrap();
        }

        assert_eq!(pool.capacity(), 128);
        assert_eq!(pool.growths(), 1);
        assert_eq!(pool.active(), 65);
        assert_eq!(pool.available(), 63);
    }

    #[test]
    fn test_growth_clamped_to_ceiling() {
        let mut pool = OrderPool::new(0, Some(10));
        assert_eq!(pool.capacity(), 0);

        for id in 0..10 {
            pool.acquire(order(id)).unwrap();
        }
        assert_eq!(pool.capacity(), 10);
        assert!(pool.acquire(order(10)).is_none());
    }

    #[test]
    fn test_churn_does_not_grow() {
        let mut pool = OrderPool::new(8, None);
        for id in 0..10_000 {
            let handle = pool.acquire(order(id)).unwrap();
            pool.release(handle);
        }

        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.peak_active(), 1);
        assert_eq!(pool.growths(), 0);
    }

    #[test]
    fn test_reset_frees_everything() {
        let mut pool = OrderPool::bounded(8);
        for id in 0..5 {
            pool.acquire(order(id)).unwrap();
        }

        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.available(), 8);
        assert_eq!(pool.peak_active(), 5);
        assert_eq!(pool.acquire(order(9)).unwrap(), OrderHandle(0));
    }
}
