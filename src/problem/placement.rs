//! Interval placement.
//!
//! Turns "these tasks go to this operator" into concrete working
//! intervals. Tasks are packed back to back from the operator's first
//! window; a task that does not fit in the rest of a window continues in
//! the next one. Intervals therefore never overlap and never leave the
//! operator's availability.

use crate::models::TimeWindow;

/// Packs `efforts` (in the given order) into `windows`.
///
/// Returns one interval list per effort, or `None` if the total effort
/// exceeds the windows' capacity.
pub fn pack(windows: &[TimeWindow], efforts: &[i64]) -> Option<Vec<Vec<TimeWindow>>> {
    let mut out = Vec::with_capacity(efforts.len());
    let mut w = 0usize;
    let mut cursor = windows.first().map(|x| x.start_min).unwrap_or(0);

    for &effort in efforts {
        let mut remaining = effort;
        let mut intervals = Vec::new();
        while remaining > 0 {
            let window = windows.get(w)?;
            cursor = cursor.max(window.start_min);
            let free = window.end_min - cursor;
            if free <= 0 {
                w += 1;
                continue;
            }
            let take = free.min(remaining);
            intervals.push(TimeWindow::new(cursor, cursor + take));
            cursor += take;
            remaining -= take;
        }
        out.push(intervals);
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_single_window() {
        let windows = [TimeWindow::new(540, 1020)];
        let placed = pack(&windows, &[120, 60]).unwrap();
        assert_eq!(placed[0], vec![TimeWindow::new(540, 660)]);
        assert_eq!(placed[1], vec![TimeWindow::new(660, 720)]);
    }

    #[test]
    fn test_pack_spans_break() {
        let windows = [TimeWindow::new(540, 720), TimeWindow::new(780, 1020)];
        let placed = pack(&windows, &[120, 120]).unwrap();
        assert_eq!(placed[0], vec![TimeWindow::new(540, 660)]);
        assert_eq!(
            placed[1],
            vec![TimeWindow::new(660, 720), TimeWindow::new(780, 840)]
        );
    }

    #[test]
    fn test_pack_exact_fit() {
        let windows = [TimeWindow::new(0, 60), TimeWindow::new(100, 160)];
        let placed = pack(&windows, &[60, 60]).unwrap();
        assert_eq!(placed[1], vec![TimeWindow::new(100, 160)]);
    }

    #[test]
    fn test_pack_overflow() {
        let windows = [TimeWindow::new(0, 100)];
        assert!(pack(&windows, &[60, 60]).is_none());
        assert!(pack(&[], &[1]).is_none());
    }

    #[test]
    fn test_pack_nothing() {
        assert_eq!(pack(&[], &[]).unwrap().len(), 0);
    }

    #[test]
    fn test_pack_never_overlaps() {
        let windows = [
            TimeWindow::new(0, 50),
            TimeWindow::new(70, 90),
            TimeWindow::new(200, 400),
        ];
        let placed = pack(&windows, &[30, 30, 30, 100]).unwrap();
        let mut all: Vec<TimeWindow> = placed.into_iter().flatten().collect();
        all.sort_by_key(|w| w.start_min);
        assert!(all.windows(2).all(|p| !p[0].overlaps(&p[1])));
        assert!(all.iter().all(|iv| windows.iter().any(|w| w.covers(iv))));
        assert_eq!(all.iter().map(TimeWindow::duration_min).sum::<i64>(), 190);
    }
}
