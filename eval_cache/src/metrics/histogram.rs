use std::time::Duration;

use serde::Serialize;

/// Bucket `i` holds samples below `2^i` microseconds; the last bucket takes
/// everything slower (about a second and up).
const BUCKETS: usize = 21;

/// Fixed-size latency histogram with power-of-two microsecond buckets.
#[derive(Clone, Debug)]
pub struct TimingHistogram {
    buckets: [u64; BUCKETS],
    count: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

impl Default for TimingHistogram {
    fn default() -> Self {
        Self {
            buckets: [0; BUCKETS],
            count: 0,
            total: Duration::ZERO,
            min: None,
            max: Duration::ZERO,
        }
    }
}

impl TimingHistogram {
    pub fn record(&mut self, elapsed: Duration) {
        self.buckets[bucket_for(elapsed)] += 1;
        self.count += 1;
        self.total += elapsed;
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = self.max.max(elapsed);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos((self.total.as_nanos() / self.count as u128) as u64)
        }
    }

    /// Upper bound of the bucket holding the `q`-quantile sample. The
    /// overflow bucket has no bound, so it reports the slowest sample.
    pub fn percentile(&self, q: f64) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let rank = ((q.clamp(0.0, 1.0) * self.count as f64).ceil() as u64).max(1);
        let mut seen = 0;
        for (i, n) in self.buckets.iter().enumerate() {
            seen += n;
            if seen >= rank {
                if i == BUCKETS - 1 {
                    return self.max;
                }
                return bucket_upper_bound(i).min(self.max);
            }
        }
        self.max
    }

    pub fn summary(&self) -> TimingSummary {
        TimingSummary {
            count: self.count,
            total_us: self.total.as_micros() as u64,
            mean_us: self.mean().as_micros() as u64,
            min_us: self.min.unwrap_or_default().as_micros() as u64,
            max_us: self.max.as_micros() as u64,
            p50_us: self.percentile(0.50).as_micros() as u64,
            p95_us: self.percentile(0.95).as_micros() as u64,
            p99_us: self.percentile(0.99).as_micros() as u64,
        }
    }
}

fn bucket_for(elapsed: Duration) -> usize {
    let micros = elapsed.as_micros();
    if micros == 0 {
        return 0;
    }
    // index of the first power of two strictly greater than `micros`
    let bits = (u128::BITS - micros.leading_zeros()) as usize;
    bits.min(BUCKETS - 1)
}

fn bucket_upper_bound(index: usize) -> Duration {
    Duration::from_micros(1u64 << index)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimingSummary {
    pub count: u64,
    pub total_us: u64,
    pub mean_us: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}
