//! Hour-of-day by day-of-week call counts.

use chrono::{Datelike as _, Timelike as _};
use police_calls_analytics_models::{DayOfWeek, HeatmapCell};
use police_calls_call_models::CallRecord;

/// Counts calls into a dense 24 x 7 grid.
///
/// Every cell is emitted, zero or not, ordered by hour and then Monday
/// through Sunday.
#[must_use]
pub fn temporal_heatmap(calls: &[CallRecord]) -> Vec<HeatmapCell> {
    let mut grid = [[0u64; 7]; 24];

    for call in calls {
        let hour = call.call_datetime.hour() as usize;
        let day = call.call_datetime.weekday().num_days_from_monday() as usize;
        grid[hour][day] += 1;
    }

    let mut cells = Vec::with_capacity(24 * 7);
    for (hour, row) in (0u8..).zip(grid.iter()) {
        for (day, calls) in DayOfWeek::all().iter().zip(row.iter()) {
            cells.push(HeatmapCell {
                hour,
                day: *day,
                calls: *calls,
            });
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::call;
    use police_calls_call_models::Priority;

    #[test]
    fn emits_a_full_grid_in_display_order() {
        let cells = temporal_heatmap(&[]);
        assert_eq!(cells.len(), 168);
        assert_eq!(cells[0].hour, 0);
        assert_eq!(cells[0].day, DayOfWeek::Monday);
        assert_eq!(cells[6].day, DayOfWeek::Sunday);
        assert_eq!(cells[7].hour, 1);
        assert_eq!(cells[167].hour, 23);
    }

    #[test]
    fn keeps_zero_cells() {
        // 2024-01-01 is a Monday.
        let calls = vec![
            call("A", "2024-01-01 03:15:00", Priority::P3, "1 Main St"),
            call("B", "2024-01-01 03:45:00", Priority::P3, "1 Main St"),
            call("C", "2024-01-07 22:00:00", Priority::P3, "1 Main St"),
        ];
        let cells = temporal_heatmap(&calls);

        let find = |hour: u8, day: DayOfWeek| {
            cells
                .iter()
                .find(|c| c.hour == hour && c.day == day)
                .unwrap()
                .calls
        };
        assert_eq!(find(3, DayOfWeek::Monday), 2);
        assert_eq!(find(22, DayOfWeek::Sunday), 1);
        assert_eq!(find(3, DayOfWeek::Tuesday), 0);
        assert_eq!(cells.iter().map(|c| c.calls).sum::<u64>(), 3);
    }
}
