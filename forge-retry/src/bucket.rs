use std::sync::{Arc, Mutex};
use std::time::Instant;

use dashmap::DashMap;

/// Bucket capacity and per-event costs for the scope-keyed token bucket.
///
/// These numbers are not specified by the design (§6: "not specified here
/// and are implementation choices, provided they satisfy §8") — the
/// defaults below mirror the workspace's own token-bucket rate limiter
/// (`RateLimiter`/`InMemoryRateLimiter` in the teacher's rate-limit crate):
/// a capacity that refills continuously rather than on a fixed tick, with
/// a retry costing less than a throttled retry so sustained throttling
/// drains the bucket faster than ordinary transient retries.
#[derive(Clone, Copy, Debug)]
pub struct BucketParams {
    pub capacity: f64,
    pub refill_per_sec: f64,
    pub retry_cost: f64,
    pub throttle_cost: f64,
}

impl Default for BucketParams {
    fn default() -> Self {
        Self {
            capacity: 500.0,
            refill_per_sec: 10.0,
            retry_cost: 5.0,
            throttle_cost: 10.0,
        }
    }
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Process-wide, thread-safe registry of token buckets keyed by scope.
///
/// Each scope lazily creates its bucket on first acquisition and the map is
/// never torn down for the life of the process, the same shape as the
/// workspace's `RateLimiter<K>`/`InMemoryRateLimiter` maps.
#[derive(Clone)]
pub struct BucketRegistry {
    buckets: Arc<DashMap<String, Mutex<Bucket>>>,
    params: BucketParams,
}

impl BucketRegistry {
    pub fn new(params: BucketParams) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            params,
        }
    }

    fn refill(bucket: &mut Bucket, capacity: f64, refill_per_sec: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * refill_per_sec).min(capacity);
        bucket.last_refill = now;
    }

    /// Try to withdraw `cost` tokens from `scope`'s bucket, refilling first.
    /// Returns `false` (without charging anything) if the bucket doesn't
    /// hold enough tokens.
    pub fn try_withdraw(&self, scope: &str, cost: f64) -> bool {
        let entry = self.buckets.entry(scope.to_string()).or_insert_with(|| {
            Mutex::new(Bucket {
                tokens: self.params.capacity,
                last_refill: Instant::now(),
            })
        });
        let mut bucket = entry.lock().expect("bucket mutex poisoned");
        Self::refill(&mut bucket, self.params.capacity, self.params.refill_per_sec);
        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Replenish a small amount of capacity on a successful call, so a
    /// string of successes gradually undoes the draw-down from prior
    /// retries in the same scope.
    pub fn deposit(&self, scope: &str, amount: f64) {
        let entry = self.buckets.entry(scope.to_string()).or_insert_with(|| {
            Mutex::new(Bucket {
                tokens: self.params.capacity,
                last_refill: Instant::now(),
            })
        });
        let mut bucket = entry.lock().expect("bucket mutex poisoned");
        Self::refill(&mut bucket, self.params.capacity, self.params.refill_per_sec);
        bucket.tokens = (bucket.tokens + amount).min(self.params.capacity);
    }

    pub fn retry_cost(&self) -> f64 {
        self.params.retry_cost
    }

    pub fn throttle_cost(&self) -> f64 {
        self.params.throttle_cost
    }
}
