use crate::modules::acquisition::AcquisitionProgress;
use crate::modules::playback::playback_progress::PlaybackProgress;
use std::time::Duration;

/// Formats a duration as MM:SS or HH:MM:SS
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Text bar of `width` cells, e.g. `[#####-----]`.
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Label strategies for the playback position.
pub trait ProgressLabelFormatter {
    fn format(&self, elapsed: Duration, total: Option<Duration>) -> String;
}

/// "00:34 / 03:10", or "00:34 / --:--" when the total is unknown
pub struct DefaultProgressFormatter;

impl ProgressLabelFormatter for DefaultProgressFormatter {
    fn format(&self, elapsed: Duration, total: Option<Duration>) -> String {
        let total = total.map(format_duration).unwrap_or_else(|| "--:--".to_string());
        format!("{} / {}", format_duration(elapsed), total)
    }
}

/// "18% 00:34 / 03:10"
pub struct PercentageProgressFormatter;

impl ProgressLabelFormatter for PercentageProgressFormatter {
    fn format(&self, elapsed: Duration, total: Option<Duration>) -> String {
        match PlaybackProgress::new(elapsed, total) {
            Some(p) => format!(
                "{}% {}",
                p.percent(),
                DefaultProgressFormatter.format(p.elapsed(), Some(p.total()))
            ),
            None => DefaultProgressFormatter.format(elapsed, total),
        }
    }
}

/// One-line acquisition status: "Downloading audio [#####-----] 50%"
pub fn format_acquisition(progress: &AcquisitionProgress, bar_width: usize) -> String {
    format!(
        "{} {} {}%",
        progress.status,
        progress_bar(f64::from(progress.percent) / 100.0, bar_width),
        progress.percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_use_hours_only_when_needed() {
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(format_duration(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "[----]");
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(2.0, 4), "[####]");
    }

    #[test]
    fn unknown_total_is_dashed() {
        let label = PercentageProgressFormatter.format(Duration::from_secs(5), None);
        assert_eq!(label, "00:05 / --:--");
    }

    #[test]
    fn percentage_label_includes_percent() {
        let label = PercentageProgressFormatter
            .format(Duration::from_secs(30), Some(Duration::from_secs(120)));
        assert_eq!(label, "25% 00:30 / 02:00");
    }

    #[test]
    fn acquisition_line() {
        let progress = AcquisitionProgress {
            percent: 50,
            status: "Converting".to_string(),
        };
        assert_eq!(format_acquisition(&progress, 4), "Converting [##--] 50%");
    }
}
