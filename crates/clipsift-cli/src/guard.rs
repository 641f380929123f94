//! Process memory guard.
//!
//! Polled between pipeline stages and inside assembly; a reading over
//! the configured ceiling aborts the run with a resource-limited
//! outcome instead of letting the process get OOM-killed mid-encode.

use tracing::warn;

/// Result of one guard poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    /// Resident set is under the ceiling.
    Ok { rss_mb: u64 },
    /// Resident set is at or over the ceiling; the run must stop.
    Exceeded { rss_mb: u64, ceiling_mb: u64 },
    /// No ceiling configured, or the platform gives no RSS reading.
    /// Treated as permission to continue.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct ResourceGuard {
    ceiling_mb: Option<u64>,
}

impl ResourceGuard {
    pub fn new(ceiling_mb: Option<u64>) -> Self {
        Self { ceiling_mb }
    }

    /// Poll current memory use against the ceiling. A failed reading is
    /// reported as `Unavailable`, never as `Exceeded`.
    pub fn check(&self) -> GuardStatus {
        let Some(ceiling_mb) = self.ceiling_mb else {
            return GuardStatus::Unavailable;
        };
        match resident_set_mb() {
            Some(rss_mb) if rss_mb >= ceiling_mb => {
                warn!(rss_mb, ceiling_mb, "Memory ceiling exceeded");
                GuardStatus::Exceeded { rss_mb, ceiling_mb }
            }
            Some(rss_mb) => GuardStatus::Ok { rss_mb },
            None => GuardStatus::Unavailable,
        }
    }

    /// Convenience for closures that only need a go/no-go answer.
    pub fn within_limit(&self) -> bool {
        !matches!(self.check(), GuardStatus::Exceeded { .. })
    }

    /// The configured ceiling, if any.
    pub fn ceiling_mb(&self) -> Option<u64> {
        self.ceiling_mb
    }
}

/// Resident set size in MB, from `/proc/self/status` on Linux.
#[cfg(target_os = "linux")]
fn resident_set_mb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb / 1024)
}

#[cfg(not(target_os = "linux"))]
fn resident_set_mb() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ceiling_is_unavailable() {
        assert_eq!(ResourceGuard::new(None).check(), GuardStatus::Unavailable);
        assert!(ResourceGuard::new(None).within_limit());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn generous_ceiling_passes() {
        let guard = ResourceGuard::new(Some(1 << 30));
        assert!(matches!(guard.check(), GuardStatus::Ok { .. }));
        assert!(guard.within_limit());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn zero_ceiling_trips() {
        let guard = ResourceGuard::new(Some(0));
        assert!(matches!(guard.check(), GuardStatus::Exceeded { .. }));
        assert!(!guard.within_limit());
    }
}
