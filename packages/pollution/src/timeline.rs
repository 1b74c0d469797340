//! Navigation over a chronologically sorted list of months.

use chrono::Month;

/// Formats a `"YYYY-MM"` key for display, e.g. `"2024-01"` becomes
/// `"January 2024"`. An unparseable month renders as `Unknown`.
#[must_use]
pub fn format_year_month(year_month: &str) -> String {
    let (year, month) = year_month.split_once('-').unwrap_or((year_month, ""));
    let name = month
        .parse::<u8>()
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("Unknown", |m| m.name());
    format!("{name} {year}")
}

/// A cursor over a timeline.
///
/// With looping enabled, stepping past either end wraps around; without
/// it, the cursor stops at the ends.
#[derive(Debug, Clone)]
pub struct Timeline<'a, M> {
    months: &'a [M],
    index: usize,
    looping: bool,
}

impl<'a, M> Timeline<'a, M> {
    #[must_use]
    pub const fn new(months: &'a [M], looping: bool) -> Self {
        Self {
            months,
            index: 0,
            looping,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.months.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> Option<&'a M> {
        self.months.get(self.index)
    }

    /// Steps forward and returns the new current month.
    pub fn go_to_next(&mut self) -> Option<&'a M> {
        let len = self.len();
        if self.index + 1 < len {
            self.index += 1;
        } else if self.looping {
            self.index = 0;
        }
        self.current()
    }

    /// Steps back and returns the new current month.
    pub fn go_to_previous(&mut self) -> Option<&'a M> {
        if self.index > 0 {
            self.index -= 1;
        } else if self.looping {
            self.index = self.len().saturating_sub(1);
        }
        self.current()
    }

    /// Jumps to `index`, clamped to the timeline.
    pub fn go_to(&mut self, index: usize) -> Option<&'a M> {
        self.index = index.min(self.len().saturating_sub(1));
        self.current()
    }

    #[must_use]
    pub const fn can_go_next(&self) -> bool {
        self.looping || self.index + 1 < self.months.len()
    }

    #[must_use]
    pub const fn can_go_previous(&self) -> bool {
        self.looping || self.index > 0
    }

    /// Position through the timeline in `[0, 1]`. A timeline of zero or one
    /// months reports 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.len() <= 1 {
            0.0
        } else {
            self.index as f64 / (self.len() - 1) as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHS: [&str; 3] = ["2023-11", "2023-12", "2024-01"];

    #[test]
    fn formats_year_month() {
        assert_eq!(format_year_month("2024-01"), "January 2024");
        assert_eq!(format_year_month("2023-12"), "December 2023");
        assert_eq!(format_year_month("2023-13"), "Unknown 2023");
    }

    #[test]
    fn looping_wraps_both_ways() {
        let mut timeline = Timeline::new(&MONTHS, true);
        assert_eq!(timeline.go_to_previous(), Some(&"2024-01"));
        assert_eq!(timeline.go_to_next(), Some(&"2023-11"));
        assert!(timeline.can_go_previous());
    }

    #[test]
    fn non_looping_stops_at_ends() {
        let mut timeline = Timeline::new(&MONTHS, false);
        assert!(!timeline.can_go_previous());
        assert_eq!(timeline.go_to_previous(), Some(&"2023-11"));
        timeline.go_to(2);
        assert!(!timeline.can_go_next());
        assert_eq!(timeline.go_to_next(), Some(&"2024-01"));
    }

    #[test]
    fn go_to_clamps_and_progress_tracks_position() {
        let mut timeline = Timeline::new(&MONTHS, false);
        assert!(timeline.progress().abs() < f64::EPSILON);
        timeline.go_to(1);
        assert!((timeline.progress() - 0.5).abs() < f64::EPSILON);
        timeline.go_to(99);
        assert_eq!(timeline.index(), 2);
        assert!((timeline.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_timeline() {
        let mut timeline: Timeline<'_, &str> = Timeline::new(&[], true);
        assert!(timeline.current().is_none());
        assert!(timeline.go_to_next().is_none());
        assert!(timeline.go_to(3).is_none());
        assert!(timeline.progress().abs() < f64::EPSILON);
    }
}
