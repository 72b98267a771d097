//! Turns a scan target's raw configuration into a concrete UTC instant pair.

use chrono::{DateTime, NaiveDate, Utc};

use lookout_types::{Lookback, ScanTarget};

/// A concrete `[start, end]` window. `end` never exceeds the `now` the
/// resolver was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    Window(ResolvedWindow),
    /// The configured start lies after `now`: skip the target entirely, no
    /// traversal. Reported, not an error.
    Future,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .expect("23:59:59 is always valid")
        .and_utc()
}

/// Pure window resolution: explicit dates win, each side independently
/// falling back (start to `now - lookback`, end to `now`), end clamped to
/// `now`. `now` is injected so this stays testable without a clock.
pub fn resolve_window(target: &ScanTarget, lookback: Lookback, now: DateTime<Utc>) -> WindowOutcome {
    let start = match target.start_date() {
        Some(date) => day_start(date),
        None => now - lookback.duration(),
    };

    let mut end = match target.end_date() {
        Some(date) => day_end(date),
        None => now,
    };

    if end > now {
        end = now;
    }

    if start > now {
        return WindowOutcome::Future;
    }

    WindowOutcome::Window(ResolvedWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn windowed(start: Option<(i32, u32, u32)>, end: Option<(i32, u32, u32)>) -> ScanTarget {
        ScanTarget::Windowed {
            group_id: 1,
            start_date: start.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            end_date: end.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
        }
    }

    #[test]
    fn test_bare_target_uses_lookback() {
        let target = ScanTarget::Bare { group_id: 1 };
        let WindowOutcome::Window(w) = resolve_window(&target, Lookback::SevenDays, now()) else {
            panic!("expected a window");
        };
        assert_eq!(w.end, now());
        assert_eq!(w.end - w.start, chrono::Duration::days(7));
    }

    #[test]
    fn test_explicit_same_day_pair() {
        let target = windowed(Some((2024, 1, 1)), Some((2024, 1, 1)));
        let WindowOutcome::Window(w) = resolve_window(&target, Lookback::SevenDays, now()) else {
            panic!("expected a window");
        };
        assert_eq!(w.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_only_end_date_start_falls_back_to_lookback() {
        let target = windowed(None, Some((2024, 6, 14)));
        let WindowOutcome::Window(w) = resolve_window(&target, Lookback::OneDay, now()) else {
            panic!("expected a window");
        };
        assert_eq!(w.start, now() - chrono::Duration::days(1));
        assert_eq!(w.end, Utc.with_ymd_and_hms(2024, 6, 14, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_end_clamped_to_now() {
        let target = windowed(Some((2024, 6, 1)), Some((2024, 12, 31)));
        let WindowOutcome::Window(w) = resolve_window(&target, Lookback::SevenDays, now()) else {
            panic!("expected a window");
        };
        assert_eq!(w.end, now());
    }

    #[test]
    fn test_future_start_is_sentinel() {
        let target = windowed(Some((2025, 1, 1)), None);
        assert_eq!(
            resolve_window(&target, Lookback::SevenDays, now()),
            WindowOutcome::Future
        );
    }
}
