//! Identifier index: `OrderId` → slot handle.
//!
//! A `hashbrown` table keyed with the murmur3 64-bit finalizer. Exchange
//! order ids are usually sequential, which a plain multiplicative hash
//! spreads poorly across SwissTable control groups; the finalizer avalanches
//! every input bit into the top 7 bits hashbrown uses for tag matching.

use core::hash::{BuildHasherDefault, Hasher};
use hashbrown::hash_map::{Entry, HashMap};
use crate::order::OrderId;
use crate::pool::OrderHandle;

/// Hasher for `u64` order identifiers.
#[derive(Default, Clone, Copy)]
pub struct OrderIdHasher {
    hash: u64,
}

impl OrderIdHasher {
    /// murmur3 `fmix64`.
    #[inline(always)]
    pub const fn mix(mut x: u64) -> u64 {
        x ^= x >> 33;
        x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
        x ^= x >> 33;
        x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        x ^= x >> 33;
        x
    }
}

impl Hasher for OrderIdHasher {
    #[inline(always)]
    fn finish(&self) -> u64 {
        self.hash
    }

    #[inline(always)]
    fn write_u64(&mut self, id: u64) {
        self.hash = Self::mix(self.hash ^ id);
    }

    // Only reached if a key type other than `OrderId` is hashed.
    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            self.write_u64(u64::from_le_bytes(buf));
        }
    }
}

pub type BuildOrderIdHasher = BuildHasherDefault<OrderIdHasher>;

/// Map from order id to the slot holding that order.
pub struct OrderIndex {
    map: HashMap<OrderId, OrderHandle, BuildOrderIdHasher>,
}

impl OrderIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, BuildOrderIdHasher::default()),
        }
    }

    #[inline(always)]
    pub fn get(&self, id: OrderId) -> Option<OrderHandle> {
        self.map.get(&id).copied()
    }

    #[inline(always)]
    pub fn contains(&self, id: OrderId) -> bool {
        self.map.contains_key(&id)
    }

    /// Insert `id → handle`. Never overwrites: if `id` is present the
    /// existing handle is returned as the error and the index is unchanged.
    #[inline]
    pub fn insert(&mut self, id: OrderId, handle: OrderHandle) -> Result<(), OrderHandle> {
        match self.map.entry(id) {
            Entry::Occupied(existing) => Err(*existing.get()),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    #[inline(always)]
    pub fn remove(&mut self, id: OrderId) -> Option<OrderHandle> {
        self.map.remove(&id)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries the table can hold before it must rehash.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Drop all entries, keeping the table's allocation.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrderId, OrderHandle)> + '_ {
        self.map.iter().map(|(&id, &handle)| (id, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hash;

    #[test]
    fn test_mix_avalanches_sequential_ids() {
        let a = OrderIdHasher::mix(1);
        let b = OrderIdHasher::mix(2);
        assert_ne!(a, b);
        // Neighbouring ids should differ in roughly half their bits.
        let flipped = (a ^ b).count_ones();
        assert!(flipped > 16 && flipped < 48, "only {} bits differ", flipped);
        // Top 7 bits (hashbrown tag) must not collapse for sequential ids.
        let tags: alloc::collections::BTreeSet<u64> =
            (0..64u64).map(|id| OrderIdHasher::mix(id) >> 57).collect();
        assert!(tags.len() > 32);
    }

    #[test]
    fn test_order_id_hashes_through_write_u64() {
        let mut hasher = OrderIdHasher::default();
        OrderId(99).hash(&mut hasher);
        assert_eq!(hasher.finish(), OrderIdHasher::mix(99));
    }

    #[test]
    fn test_insert_get_remove() {
        let mut index = OrderIndex::with_capacity(8);
        assert!(index.is_empty());

        index.insert(OrderId(10), OrderHandle(3)).unwrap();
        index.insert(OrderId(11), OrderHandle(4)).unwrap();

        assert_eq!(index.get(OrderId(10)), Some(OrderHandle(3)));
        assert_eq!(index.len(), 2);

        assert_eq!(index.remove(OrderId(10)), Some(OrderHandle(3)));
        assert_eq!(index.remove(OrderId(10)), None);
        assert!(!index.contains(OrderId(10)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_refuses_overwrite() {
        let mut index = OrderIndex::with_capacity(8);
        index.insert(OrderId(5), OrderHandle(1)).unwrap();

        assert_eq!(index.insert(OrderId(5), OrderHandle(2)), Err(OrderHandle(1)));
        assert_eq!(index.get(OrderId(5)), Some(OrderHandle(1)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut index = OrderIndex::with_capacity(100);
        for id in 0..50 {
            index.insert(OrderId(id), OrderHandle(id as u32)).unwrap();
        }
        let capacity = index.capacity();

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.capacity(), capacity);
    }
}
