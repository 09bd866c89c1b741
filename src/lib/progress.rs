//! Progress logging for the sequential shard scan.

use log::info;

/// Logs scan progress against a known shard total at interval boundaries.
///
/// The scan is strictly sequential, so this tracker is deliberately plain
/// mutable state. Progress is logged every `interval` shards and always on
/// the final shard.
pub struct ScanProgress {
    message: String,
    total: usize,
    interval: usize,
    done: usize,
}

impl ScanProgress {
    /// Create a tracker for `total` shards with the default interval of 10.
    #[must_use]
    pub fn new(message: impl Into<String>, total: usize) -> Self {
        Self { message: message.into(), total, interval: 10, done: 0 }
    }

    /// Set the number of shards between progress lines.
    #[must_use]
    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Record one completed shard, logging on interval boundaries and on
    /// the last shard.
    pub fn advance(&mut self) {
        self.done += 1;
        if self.done % self.interval == 0 || self.done == self.total {
            info!("{} {} of {}", self.message, self.done, self.total);
        }
    }

    /// Number of shards recorded so far.
    #[must_use]
    pub fn done(&self) -> usize {
        self.done
    }
}
