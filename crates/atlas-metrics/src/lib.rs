//! Per-operation latency tracking for the order registry.
//!
//! HdrHistogram for distributions. `OpLatencies` carries its own quanta
//! clock so callers take a raw TSC stamp before an operation and hand it
//! back once the operation is known to have succeeded.

use std::fmt;

use hdrhistogram::{CreationError, Histogram};

/// Registry operation a latency sample belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Replace,
    Delete,
    Lookup,
}

impl Op {
    pub const ALL: [Op; 4] = [Op::Add, Op::Replace, Op::Delete, Op::Lookup];

    pub const fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Replace => "replace",
            Op::Delete => "delete",
            Op::Lookup => "lookup",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Percentile snapshot of one histogram, in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LatencySummary {
    pub count: u64,
    pub p50: u64,
    pub p99: u64,
    pub p999: u64,
    pub max: u64,
    pub mean: f64,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} p50={} p99={} p99.9={} max={}",
            self.count,
            Nanos(self.p50),
            Nanos(self.p99),
            Nanos(self.p999),
            Nanos(self.max),
        )
    }
}

/// Nanosecond count shown in the largest unit that keeps it above one.
struct Nanos(u64);

impl fmt::Display for Nanos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        match n {
            0..=999 => write!(f, "{}ns", n),
            1_000..=999_999 => write!(f, "{:.2}us", n as f64 / 1e3),
            1_000_000..=999_999_999 => write!(f, "{:.2}ms", n as f64 / 1e6),
            _ => write!(f, "{:.2}s", n as f64 / 1e9),
        }
    }
}

/// Latency histogram with nanosecond values.
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    /// Histogram with 3 significant digits.
    pub fn new() -> Self {
        Self::with_precision(3).expect("3 significant digits is always valid")
    }

    /// Custom precision (1-5 significant digits).
    pub fn with_precision(sigfig: u8) -> Result<Self, CreationError> {
        Ok(Self {
            histogram: Histogram::new(sigfig)?,
        })
    }

    #[inline(always)]
    pub fn record(&mut self, nanos: u64) {
        // Auto-resizing histogram: only fails on u64 overflow of the count.
        let _ = self.histogram.record(nanos);
    }

    /// Value at percentile (0.0 - 100.0).
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        self.histogram.value_at_quantile(percentile / 100.0)
    }

    pub fn count(&self) -> u64 {
        self.histogram.len()
    }

    pub fn max(&self) -> u64 {
        self.histogram.max()
    }

    pub fn min(&self) -> u64 {
        self.histogram.min()
    }

    pub fn reset(&mut self) {
        self.histogram.reset();
    }

    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            count: self.count(),
            p50: self.value_at_percentile(50.0),
            p99: self.value_at_percentile(99.0),
            p999: self.value_at_percentile(99.9),
            max: self.max(),
            mean: self.histogram.mean(),
        }
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw clock reading taken before an operation.
#[derive(Clone, Copy, Debug)]
#[must_use = "pass the stamp to `OpLatencies::finish`"]
pub struct Started(u64);

/// One histogram per registry operation, plus the clock that times them.
pub struct OpLatencies {
    histograms: [LatencyHistogram; 4],
    clock: quanta::Clock,
}

impl OpLatencies {
    pub fn new() -> Self {
        Self {
            histograms: Default::default(),
            clock: quanta::Clock::new(),
        }
    }

    /// Stamp the start of an operation.
    #[inline(always)]
    pub fn start(&self) -> Started {
        Started(self.clock.raw())
    }

    /// Record the time elapsed since `started` against `op`.
    ///
    /// Call only for operations that completed; rejected operations take
    /// a different path and would skew the distribution.
    #[inline(always)]
    pub fn finish(&mut self, op: Op, started: Started) {
        let nanos = self.clock.delta_as_nanos(started.0, self.clock.raw());
        self.record(op, nanos);
    }

    #[inline(always)]
    pub fn record(&mut self, op: Op, nanos: u64) {
        self.histograms[op.slot()].record(nanos);
    }

    pub fn get(&self, op: Op) -> &LatencyHistogram {
        &self.histograms[op.slot()]
    }

    /// Summaries for every operation that has samples.
    pub fn summaries(&self) -> impl Iterator<Item = (Op, LatencySummary)> + '_ {
        Op::ALL
            .into_iter()
            .map(|op| (op, self.get(op).summary()))
            .filter(|(_, summary)| summary.count > 0)
    }

    pub fn reset(&mut self) {
        for histogram in &mut self.histograms {
            histogram.reset();
        }
    }
}

impl Default for OpLatencies {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_summary() {
        let mut h = LatencyHistogram::new();
        for i in 1..=100 {
            h.record(i * 100);
        }

        let summary = h.summary();
        assert_eq!(summary.count, 100);
        assert!(summary.p50 >= 4900 && summary.p50 <= 5100);
        assert_eq!(h.min(), 100);
        // HdrHistogram may round max value slightly
        assert!(summary.max >= 10000 && summary.max <= 10100);
    }

    #[test]
    fn test_op_latencies_are_separate() {
        let mut ops = OpLatencies::new();
        ops.record(Op::Add, 50);
        ops.record(Op::Add, 70);
        ops.record(Op::Delete, 900);

        assert_eq!(ops.get(Op::Add).count(), 2);
        assert_eq!(ops.get(Op::Delete).count(), 1);
        assert_eq!(ops.get(Op::Lookup).count(), 0);

        let reported: Vec<Op> = ops.summaries().map(|(op, _)| op).collect();
        assert_eq!(reported, vec![Op::Add, Op::Delete]);

        ops.reset();
        assert_eq!(ops.summaries().count(), 0);
    }

    #[test]
    fn test_nanos_picks_unit() {
        assert_eq!(Nanos(500).to_string(), "500ns");
        assert_eq!(Nanos(5_000).to_string(), "5.00us");
        assert_eq!(Nanos(5_000_000).to_string(), "5.00ms");
        assert_eq!(Nanos(2_500_000_000).to_string(), "2.50s");
    }

    #[test]
    fn test_summary_display() {
        let summary = LatencySummary { count: 3, p50: 40, p99: 1_500, p999: 1_500, max: 1_500, mean: 0.0 };
        assert_eq!(summary.to_string(), "n=3 p50=40ns p99=1.50us p99.9=1.50us max=1.50us");
    }

    #[test]
    fn test_finish_records_one_sample() {
        let mut ops = OpLatencies::new();
        let started = ops.start();
        ops.finish(Op::Replace, started);

        assert_eq!(ops.get(Op::Replace).count(), 1);
        assert_eq!(ops.get(Op::Add).count(), 0);
    }
}
