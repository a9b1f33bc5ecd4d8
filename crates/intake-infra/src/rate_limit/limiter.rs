use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use intake_core::ClientIdentity;

/// Shard size above which a check also drops idle identities from its shard.
const SWEEP_THRESHOLD: usize = 256;

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The upload was recorded; `remaining` more fit in the current window.
    Admitted { remaining: usize },
    /// The window is full; the oldest upload expires after `retry_after`.
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted { .. })
    }
}

/// Upload timestamps of one identity, oldest first.
#[derive(Debug, Default)]
struct UploadWindow {
    timestamps: VecDeque<Instant>,
}

impl UploadWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.timestamps.len()
    }

    fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn retry_after(&self, now: Instant, window: Duration) -> Duration {
        self.timestamps
            .front()
            .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or_default()
    }
}

/// Sharded sliding-window rate limiter.
///
/// Each identity hashes to exactly one shard, and a check prunes, counts and
/// records under that shard's lock, so admissions for the same identity are
/// strictly serialized. Different identities usually land on different shards
/// and do not contend.
#[derive(Clone)]
pub struct RateLimiter {
    shards: Vec<Arc<Mutex<HashMap<ClientIdentity, UploadWindow>>>>,
    shard_count: usize,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    fn shard_index(&self, identity: &ClientIdentity) -> usize {
        let mut hasher = DefaultHasher::new();
        identity.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    /// Create a limiter allowing `limit` uploads per `window` (default 16 shards).
    pub fn new(limit: usize, window: Duration) -> Self {
        Self::with_shards(limit, window, 16)
    }

    /// Create a limiter with a custom shard count.
    pub fn with_shards(limit: usize, window: Duration, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            limit,
            window,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit and record an upload for `identity` at `now`, or reject it.
    ///
    /// A rejected upload is not recorded.
    #[tracing::instrument(skip(self), fields(identity = %identity))]
    pub async fn check_and_record(&self, identity: &ClientIdentity, now: Instant) -> Admission {
        let shard = &self.shards[self.shard_index(identity)];
        let mut windows = shard.lock().await;

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| {
                w.prune(now, window);
                !w.is_empty()
            });
        }

        let entry = windows.entry(identity.clone()).or_default();
        entry.prune(now, self.window);

        if entry.len() >= self.limit {
            let retry_after = entry.retry_after(now, self.window);
            tracing::debug!(
                recorded = entry.len(),
                limit = self.limit,
                retry_after_secs = retry_after.as_secs(),
                "Upload rate limit reached"
            );
            return Admission::Rejected { retry_after };
        }

        entry.timestamps.push_back(now);
        let remaining = self.limit - entry.len();
        tracing::trace!(remaining, "Upload admitted");

        Admission::Admitted { remaining }
    }

    /// Number of uploads `identity` may still make at `now`.
    #[tracing::instrument(skip(self), fields(identity = %identity))]
    pub async fn remaining(&self, identity: &ClientIdentity, now: Instant) -> usize {
        let shard = &self.shards[self.shard_index(identity)];
        let mut windows = shard.lock().await;

        let used = match windows.get_mut(identity) {
            Some(entry) => {
                entry.prune(now, self.window);
                entry.len()
            }
            None => 0,
        };

        if used == 0 {
            windows.remove(identity);
        }

        self.limit.saturating_sub(used)
    }

    /// Number of identities currently holding a window.
    pub async fn tracked_identities(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }
}
