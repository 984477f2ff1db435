//! Time window model.
//!
//! Operators declare availability as an ordered list of working windows.
//!
//! # Time Model
//! All times are in minutes relative to the instance epoch (00:00 of
//! [`Instance::epoch`](super::Instance)). Windows are half-open `[start, end)`.

use serde::{Deserialize, Serialize};

/// A time interval `[start, end)` in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// Interval start (minutes, inclusive).
    pub start_min: i64,
    /// Interval end (minutes, exclusive).
    pub end_min: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_min: i64, end_min: i64) -> Self {
        Self { start_min, end_min }
    }

    /// Creates a window from wall-clock hours on day `day` (0 = epoch day).
    ///
    /// `TimeWindow::hours(0, 9, 17)` is the 09:00-17:00 shift on the epoch day.
    pub fn hours(day: i64, start_hour: i64, end_hour: i64) -> Self {
        let base = day * 24 * 60;
        Self::new(base + start_hour * 60, base + end_hour * 60)
    }

    /// Duration of this window (minutes). Zero for malformed windows.
    #[inline]
    pub fn duration_min(&self) -> i64 {
        (self.end_min - self.start_min).max(0)
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time_min: i64) -> bool {
        time_min >= self.start_min && time_min < self.end_min
    }

    /// Whether another window lies entirely within this one.
    #[inline]
    pub fn covers(&self, other: &Self) -> bool {
        other.start_min >= self.start_min && other.end_min <= self.end_min
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }
}

/// Minute at which `effort_min` of work completes when packed from the
/// first window onward.
///
/// Returns `None` if the windows cannot hold that much work.
pub fn earliest_completion(windows: &[TimeWindow], effort_min: i64) -> Option<i64> {
    let mut remaining = effort_min;
    for w in windows {
        let d = w.duration_min();
        if d == 0 {
            continue;
        }
        if remaining <= d {
            return Some(w.start_min + remaining);
        }
        remaining -= d;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_basics() {
        let w = TimeWindow::new(100, 200);
        assert_eq!(w.duration_min(), 100);
        assert!(w.contains(100));
        assert!(w.contains(199));
        assert!(!w.contains(200));
    }

    #[test]
    fn test_window_hours() {
        let w = TimeWindow::hours(1, 9, 17);
        assert_eq!(w.start_min, 1440 + 540);
        assert_eq!(w.duration_min(), 480);
    }

    #[test]
    fn test_window_overlap() {
        let a = TimeWindow::new(0, 100);
        let b = TimeWindow::new(50, 150);
        let c = TimeWindow::new(100, 200);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // half-open
        assert!(TimeWindow::new(0, 200).covers(&b));
        assert!(!a.covers(&b));
    }

    #[test]
    fn test_malformed_window_has_no_duration() {
        assert_eq!(TimeWindow::new(200, 100).duration_min(), 0);
    }

    #[test]
    fn test_earliest_completion_spans_windows() {
        let windows = [TimeWindow::new(0, 240), TimeWindow::new(300, 540)];
        assert_eq!(earliest_completion(&windows, 120), Some(120));
        assert_eq!(earliest_completion(&windows, 240), Some(240));
        assert_eq!(earliest_completion(&windows, 300), Some(360));
        assert_eq!(earliest_completion(&windows, 481), None);
    }
}
