//! Output helpers for the CLI

use std::time::Duration;

/// Renders `duration` with a unit suited to its size: `1.500ms`, `2.250s`
/// or `2m 5s`.
pub fn format_duration(duration: Duration) -> String {
    match duration.as_secs() {
        0 => format!("{}.{:03}ms", duration.as_millis(), duration.subsec_micros() % 1000),
        secs @ 1..=59 => format!("{}.{:03}s", secs, duration.subsec_millis()),
        secs => format!("{}m {}s", secs / 60, secs % 60),
    }
}

/// Round-trip time summary of a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RttStats {
    sorted: Vec<Duration>,
}

impl RttStats {
    pub fn new(mut samples: Vec<Duration>) -> Self {
        samples.sort_unstable();
        Self { sorted: samples }
    }

    pub fn count(&self) -> usize {
        self.sorted.len()
    }

    pub fn min(&self) -> Option<Duration> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<Duration> {
        self.sorted.last().copied()
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.sorted.is_empty() {
            return None;
        }
        Some(self.sorted.iter().sum::<Duration>() / self.sorted.len() as u32)
    }

    /// Nearest-rank percentile, `p` in 0..=100.
    pub fn percentile(&self, p: u32) -> Option<Duration> {
        if self.sorted.is_empty() {
            return None;
        }
        let rank = (p.min(100) as usize * self.sorted.len()).div_ceil(100);
        Some(self.sorted[rank.saturating_sub(1)])
    }
}

/// Print a section header in the CLI output
pub fn print_header(title: &str) {
    println!("\n{}\n{}", title, "-".repeat(title.len()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.500ms");
        assert_eq!(format_duration(Duration::from_millis(2250)), "2.250s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_rtt_stats() {
        let stats = RttStats::new((1..=10).rev().map(Duration::from_millis).collect());
        assert_eq!(stats.count(), 10);
        assert_eq!(stats.min(), Some(Duration::from_millis(1)));
        assert_eq!(stats.max(), Some(Duration::from_millis(10)));
        assert_eq!(stats.mean(), Some(Duration::from_micros(5500)));
        assert_eq!(stats.percentile(50), Some(Duration::from_millis(5)));
        assert_eq!(stats.percentile(99), Some(Duration::from_millis(10)));
        assert_eq!(stats.percentile(0), Some(Duration::from_millis(1)));

        let empty = RttStats::new(Vec::new());
        assert_eq!(empty.mean(), None);
        assert_eq!(empty.percentile(50), None);
    }
}
