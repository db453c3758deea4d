use std::time::Duration;

/// Position within the now-playing track, clamped to its duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackProgress {
    elapsed: Duration,
    total: Duration,
}

impl PlaybackProgress {
    /// Returns `None` when the total duration is unknown or zero.
    pub fn new(elapsed: Duration, total: Option<Duration>) -> Option<Self> {
        let total = total.filter(|t| !t.is_zero())?;
        Some(Self {
            elapsed: elapsed.min(total),
            total,
        })
    }

    /// Ratio of progress (0.0 to 1.0)
    pub fn ratio(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.total.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn percent(&self) -> u8 {
        (self.ratio() * 100.0).round() as u8
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    /// Target of a relative seek, clamped to `[0, total]`.
    pub fn offset_by(&self, offset_secs: i64) -> Duration {
        let magnitude = Duration::from_secs(offset_secs.unsigned_abs());
        let target = if offset_secs < 0 {
            self.elapsed.saturating_sub(magnitude)
        } else {
            self.elapsed.saturating_add(magnitude)
        };
        target.min(self.total)
    }
}
