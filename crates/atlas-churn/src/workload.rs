//! Synthetic order flow.
//!
//! Generates the message mix a busy book sees: new orders, amendments
//! (some renumbering the order), cancels, and lookups from the matching
//! side. Every message is applied to the registry and timed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use atlas_core::{Order, OrderId, OrderRegistry, Price, Quantity, RegistryError, Side};
use atlas_metrics::{Op, OpLatencies};

/// Percentages of each message kind. The remainder are lookups.
#[derive(Clone, Copy, Debug)]
pub struct Mix {
    pub new_pct: u32,
    pub replace_pct: u32,
    pub cancel_pct: u32,
}

impl Default for Mix {
    fn default() -> Self {
        Self {
            new_pct: 40,
            replace_pct: 30,
            cancel_pct: 20,
        }
    }
}

/// Outcome counters for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChurnReport {
    pub messages: u64,
    pub added: u64,
    pub replaced: u64,
    pub rekeyed: u64,
    pub cancelled: u64,
    pub lookups: u64,
    /// Adds refused because a bounded pool was full.
    pub rejected_full: u64,
}

pub struct Workload {
    rng: StdRng,
    mix: Mix,
    next_id: u64,
    /// Ids the workload believes are live, for picking replace/cancel targets.
    live: Vec<OrderId>,
}

impl Workload {
    pub fn new(seed: u64, mix: Mix) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            mix,
            next_id: 1,
            live: Vec::new(),
        }
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Rest `count` orders in the registry before measuring.
    pub fn populate(&mut self, registry: &mut OrderRegistry, count: usize) -> Result<(), RegistryError> {
        self.live.reserve(count);
        for _ in 0..count {
            let order = self.next_order();
            registry.add(order)?;
            self.live.push(order.id());
        }
        Ok(())
    }

    /// Apply `messages` messages, recording per-operation latency.
    ///
    /// Adds refused by a full pool are counted but not timed.
    pub fn run(
        &mut self,
        registry: &mut OrderRegistry,
        messages: u64,
        latencies: &mut OpLatencies,
    ) -> Result<ChurnReport, RegistryError> {
        let mut report = ChurnReport::default();

        for _ in 0..messages {
            report.messages += 1;
            let roll = self.rng.gen_range(0..100);

            if roll < self.mix.new_pct || self.live.is_empty() {
                let order = self.next_order();
                let started = latencies.start();
                let result = registry.add(order).map(|_| ());

                match result {
                    Ok(()) => {
                        latencies.finish(Op::Add, started);
                        self.live.push(order.id());
                        report.added += 1;
                    }
                    Err(RegistryError::CapacityExhausted { .. }) => report.rejected_full += 1,
                    Err(err) => return Err(err),
                }
            } else if roll < self.mix.new_pct + self.mix.replace_pct {
                let slot = self.rng.gen_range(0..self.live.len());
                let id = self.live[slot];
                let new_id = if self.rng.gen_bool(0.5) { self.fresh_id() } else { id };
                let price = Price(self.rng.gen_range(9_900..10_100));
                let qty = Quantity(self.rng.gen_range(1..1_000));

                let started = latencies.start();
                registry.replace(id, new_id, price, qty)?;
                latencies.finish(Op::Replace, started);

                self.live[slot] = new_id;
                report.replaced += 1;
                if new_id != id {
                    report.rekeyed += 1;
                }
            } else if roll < self.mix.new_pct + self.mix.replace_pct + self.mix.cancel_pct {
                let slot = self.rng.gen_range(0..self.live.len());
                let id = self.live.swap_remove(slot);

                let started = latencies.start();
                let removed = registry.delete(id);
                latencies.finish(Op::Delete, started);

                if removed.is_none() {
                    return Err(RegistryError::OrderNotFound(id));
                }
                report.cancelled += 1;
            } else {
                let slot = self.rng.gen_range(0..self.live.len());
                let id = self.live[slot];

                let started = latencies.start();
                let found = registry.lookup(id).is_some();
                latencies.finish(Op::Lookup, started);

                if !found {
                    return Err(RegistryError::OrderNotFound(id));
                }
                report.lookups += 1;
            }
        }

        Ok(report)
    }

    fn fresh_id(&mut self) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;
        id
    }

    fn next_order(&mut self) -> Order {
        let id = self.fresh_id();
        let side = if self.rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = self.rng.gen_range(9_900..10_100);
        let qty = self.rng.gen_range(1..1_000);
        Order::limit(id.0, side, price, qty)
    }
}
