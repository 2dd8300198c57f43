use serde::Serialize;

/// Derived view of a [`Timer`](super::Timer) at snapshot time.
/// All values are nanoseconds, except `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerStats {
    pub count: i64,
    pub min: i64,
    pub max: i64,
    pub mean: i64,
    pub stddev: i64,
    pub p50: i64,
    pub p75: i64,
    pub p90: i64,
    pub p95: i64,
}

/// Running totals a timer keeps over its whole history.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Totals {
    pub count: u64,
    pub sum: u128,
    pub sum_sq: u128,
    pub min: u64,
    pub max: u64,
}

impl TimerStats {
    /// Builds the full stat set from exact totals and the reservoir's live
    /// samples. `samples` is sorted in place.
    pub(crate) fn from_parts(totals: Totals, samples: &mut [u64]) -> Self {
        if totals.count == 0 {
            return Self::empty();
        }

        samples.sort_unstable();

        Self {
            count: clamp(totals.count as u128),
            min: clamp(totals.min as u128),
            max: clamp(totals.max as u128),
            mean: clamp(totals.sum / totals.count as u128),
            stddev: stddev(&totals),
            p50: percentile(samples, 0.50),
            p75: percentile(samples, 0.75),
            p90: percentile(samples, 0.90),
            p95: percentile(samples, 0.95),
        }
    }

    /// All-zero placeholder for a timer that has never seen a sample.
    pub fn empty() -> Self {
        Self {
            count: 0,
            min: 0,
            max: 0,
            mean: 0,
            stddev: 0,
            p50: 0,
            p75: 0,
            p90: 0,
            p95: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

/// Population standard deviation, `sqrt(sumSq/n - mean²)`.
///
/// Evaluated as `(n·sumSq - sum²) / n²` in integers so identical samples give
/// exactly zero; falls back to floats when the products overflow.
fn stddev(t: &Totals) -> i64 {
    let n = t.count as u128;

    let variance = match (n.checked_mul(t.sum_sq), t.sum.checked_mul(t.sum)) {
        (Some(a), Some(b)) => a.saturating_sub(b) as f64 / (n * n) as f64,
        _ => {
            let mean = t.sum as f64 / n as f64;
            (t.sum_sq as f64 / n as f64 - mean * mean).max(0.0)
        }
    };

    variance.sqrt() as i64
}

/// Nearest-rank percentile over sorted samples: index `ceil(p·n) - 1`,
/// clamped to the slice.
fn percentile(sorted: &[u64], p: f64) -> i64 {
    let n = sorted.len();
    if n == 0 {
        return 0;
    }

    let rank = (p * n as f64).ceil() as usize;
    let idx = rank.saturating_sub(1).min(n - 1);
    clamp(sorted[idx] as u128)
}

fn clamp(v: u128) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(samples: &[u64]) -> Totals {
        let mut t = Totals {
            min: u64::MAX,
            ..Totals::default()
        };
        for &s in samples {
            t.count += 1;
            t.sum += s as u128;
            t.sum_sq += (s as u128) * (s as u128);
            t.min = t.min.min(s);
            t.max = t.max.max(s);
        }
        t
    }

    #[test]
    fn empty_is_all_zero() {
        let stats = TimerStats::from_parts(Totals::default(), &mut []);
        assert_eq!(stats, TimerStats::empty());
        assert!(!stats.has_data());
    }

    #[test]
    fn one_through_ten() {
        let mut samples: Vec<u64> = (1..=10).rev().collect();
        let stats = TimerStats::from_parts(totals(&samples), &mut samples);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 10);
        assert_eq!(stats.mean, 5);
        // population variance of 1..=10 is 8.25
        assert_eq!(stats.stddev, 2);
        assert_eq!(stats.p50, 5);
        assert_eq!(stats.p75, 8);
        assert_eq!(stats.p90, 9);
        assert_eq!(stats.p95, 10);
    }

    #[test]
    fn large_identical_samples_have_zero_stddev() {
        let hour = 3_600_000_000_000u64;
        let mut samples = vec![hour; 1000];
        let stats = TimerStats::from_parts(totals(&samples), &mut samples);
        assert_eq!(stats.stddev, 0);
        assert_eq!(stats.mean, hour as i64);
    }

    #[test]
    fn percentile_of_single_sample() {
        assert_eq!(percentile(&[42], 0.5), 42);
        assert_eq!(percentile(&[42], 0.95), 42);
        assert_eq!(percentile(&[], 0.5), 0);
    }
}
