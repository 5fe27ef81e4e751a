//! Order record held in registry slots.
//!
//! `Order` is exactly one cache line. Its identifier is readable by anyone
//! but only the registry may change it, because the identifier doubles as
//! the index key for the slot holding the order.

use core::fmt;
use core::mem::{align_of, size_of};
use core::ops::Deref;
use crate::fixed::{Price, Quantity};

/// Side of the order book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

/// Time-in-force of the order. Carried, never interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OrderType {
    Limit = 0,
    IOC = 1,
    FOK = 2,
    PostOnly = 3,
}

/// Instrument identifier, resolved upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const INVALID: Self = Self(u32::MAX);
}

/// Unique order identifier. Every `u64` value is a valid key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    #[inline(always)]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live order.
///
/// Hot fields first; the rest are opaque domain data that the registry
/// copies in and out without looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct Order {
    /// Limit price.
    pub price: Price,               // 8 bytes
    /// Open quantity.
    pub quantity: Quantity,         // 8 bytes
    id: OrderId,                    // 8 bytes
    /// Entry timestamp (monotonic nanos or TSC ticks).
    pub timestamp: u64,             // 8 bytes
    /// Quantity at entry, untouched by replaces.
    pub original_qty: Quantity,     // 8 bytes
    pub symbol: SymbolId,           // 4 bytes
    pub side: Side,                 // 1 byte
    pub order_type: OrderType,      // 1 byte
    pub flags: u8,                  // 1 byte
    _padding: [u8; 17],             // 17 bytes
}

const _: () = assert!(size_of::<Order>() == 64, "Order must be exactly 64 bytes");
const _: () = assert!(align_of::<Order>() == 64, "Order must be cache-line aligned");

impl Order {
    #[inline(always)]
    pub fn new(
        id: OrderId,
        symbol: SymbolId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        timestamp: u64,
    ) -> Self {
        Self {
            price,
            quantity,
            id,
            timestamp,
            original_qty: quantity,
            symbol,
            side,
            order_type,
            flags: 0,
            _padding: [0; 17],
        }
    }

    /// Good-til-cancelled limit order with no symbol or timestamp attached.
    #[inline]
    pub fn limit(id: u64, side: Side, price: u64, quantity: u64) -> Self {
        Self::new(
            OrderId(id),
            SymbolId::INVALID,
            side,
            OrderType::Limit,
            Price(price),
            Quantity(quantity),
            0,
        )
    }

    #[inline(always)]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    /// Only the registry re-keys orders; see `OrderRegistry::replace`.
    #[inline(always)]
    pub(crate) fn set_id(&mut self, id: OrderId) {
        self.id = id;
    }

    #[inline(always)]
    pub const fn is_filled(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Reduce the open quantity by an execution.
    ///
    /// # Panics
    /// Debug-panics if `qty` exceeds the open quantity.
    #[inline(always)]
    pub fn fill(&mut self, qty: Quantity) {
        debug_assert!(qty <= self.quantity, "Fill quantity exceeds open quantity");
        self.quantity = self.quantity.saturating_sub(qty);
    }

    #[inline(always)]
    pub const fn filled_qty(&self) -> Quantity {
        Quantity(self.original_qty.0.saturating_sub(self.quantity.0))
    }
}

/// Mutable view of a registry-owned order.
///
/// Reads go through `Deref`. Writes are limited to fields that are not the
/// index key, so the record can never be overwritten wholesale with one
/// carrying a different id:
///
/// ```compile_fail
/// use atlas_core::{Order, OrderId, OrderRegistry, Side};
///
/// let mut reg = OrderRegistry::new();
/// reg.add(Order::limit(1, Side::Buy, 100, 10)).unwrap();
/// *reg.lookup_mut(OrderId(1)).unwrap() = Order::limit(2, Side::Buy, 100, 10);
/// ```
pub struct OrderMut<'a> {
    order: &'a mut Order,
}

impl<'a> OrderMut<'a> {
    #[inline(always)]
    pub(crate) fn new(order: &'a mut Order) -> Self {
        Self { order }
    }

    #[inline(always)]
    pub fn price_mut(&mut self) -> &mut Price {
        &mut self.order.price
    }

    #[inline(always)]
    pub fn quantity_mut(&mut self) -> &mut Quantity {
        &mut self.order.quantity
    }

    #[inline(always)]
    pub fn original_qty_mut(&mut self) -> &mut Quantity {
        &mut self.order.original_qty
    }

    #[inline(always)]
    pub fn timestamp_mut(&mut self) -> &mut u64 {
        &mut self.order.timestamp
    }

    #[inline(always)]
    pub fn flags_mut(&mut self) -> &mut u8 {
        &mut self.order.flags
    }

    #[inline(always)]
    pub fn set_side(&mut self, side: Side) {
        self.order.side = side;
    }

    #[inline(always)]
    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.order.order_type = order_type;
    }

    #[inline(always)]
    pub fn set_symbol(&mut self, symbol: SymbolId) {
        self.order.symbol = symbol;
    }

    /// See `Order::fill`.
    #[inline(always)]
    pub fn fill(&mut self, qty: Quantity) {
        self.order.fill(qty);
    }
}

impl Deref for OrderMut<'_> {
    type Target = Order;

    #[inline(always)]
    fn deref(&self) -> &Order {
        self.order
    }
}

impl fmt::Debug for OrderMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.order, f)
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new(
            OrderId::default(),
            SymbolId::INVALID,
            Side::Buy,
            OrderType::Limit,
            Price::ZERO,
            Quantity::ZERO,
            0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_layout() {
        assert_eq!(size_of::<Order>(), 64);
        assert_eq!(align_of::<Order>(), 64);
    }

    #[test]
    fn test_limit_constructor() {
        let order = Order::limit(7, Side::Sell, 100, 10);
        assert_eq!(order.id(), OrderId(7));
        assert_eq!(order.price, Price(100));
        assert_eq!(order.quantity, Quantity(10));
        assert_eq!(order.original_qty, Quantity(10));
        assert_eq!(order.order_type, OrderType::Limit);
    }

    #[test]
    fn test_order_fill() {
        let mut order = Order::limit(1, Side::Buy, 100, 100);

        order.fill(Quantity(40));
        assert_eq!(order.quantity, Quantity(60));
        assert_eq!(order.filled_qty(), Quantity(40));
        assert!(!order.is_filled());

        order.fill(Quantity(60));
        assert!(order.is_filled());
        assert_eq!(order.filled_qty(), Quantity(100));
    }

    #[test]
    fn test_order_mut_edits_everything_but_id() {
        let mut order = Order::limit(5, Side::Buy, 100, 10);
        let mut view = OrderMut::new(&mut order);

        *view.price_mut() = Price(101);
        *view.quantity_mut() = Quantity(8);
        *view.timestamp_mut() = 99;
        *view.flags_mut() = 0b10;
        view.set_side(Side::Sell);
        view.set_order_type(OrderType::PostOnly);
        view.set_symbol(SymbolId(4));
        view.fill(Quantity(3));
        assert_eq!(view.id(), OrderId(5));

        assert_eq!(order.price, Price(101));
        assert_eq!(order.quantity, Quantity(5));
        assert_eq!(order.timestamp, 99);
        assert_eq!(order.flags, 0b10);
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.order_type, OrderType::PostOnly);
        assert_eq!(order.symbol, SymbolId(4));
        assert_eq!(order.id(), OrderId(5));
    }
}
