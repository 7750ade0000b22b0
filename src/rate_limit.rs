use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Fixed-window attempt counter keyed by email (trimmed, case-insensitive).
///
/// `check()` does not count; call `record()` for every attempt that should
/// count against the limit.
pub struct AttemptLimiter {
    /// email -> (count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    max_attempts: u32,
    window: Duration,
}

impl AttemptLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_attempts,
            window,
        }
    }

    /// 5 failed logins per 15 minutes.
    pub fn for_login() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// 3 recovery mails per 15 minutes.
    pub fn for_recovery() -> Self {
        Self::new(3, Duration::from_secs(15 * 60))
    }

    /// Returns Err with retry-after seconds when the key is locked out.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&normalize(key)) else {
            return Ok(());
        };
        let (count, start) = entry.value();

        if now.duration_since(*start) > self.window {
            return Ok(());
        }

        if *count >= self.max_attempts {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record(&self, key: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(normalize(key)).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < self.window);
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}
