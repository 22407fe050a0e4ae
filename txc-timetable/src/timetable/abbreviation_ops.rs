use std::collections::{BTreeMap, BTreeSet};

use crate::timetable::duration_ops::time_between;
use crate::timetable::grouping::{Cell, ColumnFoot, Grouping};

const SECONDS_PER_HOUR: i64 = 3600;

/// collects the footnote spans printed under the grid: for every note key
/// appearing on any journey, consecutive columns sharing the same text (or
/// the same absence of it) collapse into one foot.
pub(crate) fn build_column_feet(grouping: &mut Grouping) {
    let keys: BTreeSet<String> = grouping
        .journeys
        .iter()
        .flat_map(|journey| journey.notes.keys().cloned())
        .collect();

    let mut column_feet = BTreeMap::new();
    for key in keys {
        let mut spans: Vec<ColumnFoot> = Vec::new();
        for journey in &grouping.journeys {
            let text = journey.notes.get(&key).cloned();
            match spans.last_mut() {
                Some(last) if last.notes == text => last.span += 1,
                _ => spans.push(ColumnFoot {
                    notes: text,
                    span: 1,
                }),
            }
        }
        column_feet.insert(key, spans);
    }
    grouping.column_feet = column_feet;
}

/// collapses runs of consecutive journeys on the same pattern with
/// identical notes and a constant departure interval into a single
/// "then every N minutes" cell. the first and last journey of a run stay
/// as real columns; only the interior is merged, and only when there is
/// more than one interior column to save. intervals must divide an hour
/// exactly or be an exact multiple of one; anything else reads badly in
/// print and stays unabbreviated.
pub(crate) fn abbreviate(grouping: &mut Grouping) {
    let count = grouping.journeys.len();
    if count < 4 {
        return;
    }
    let order = grouping.row_order();

    let mut run_start = 0usize;
    let mut run_delta: Option<i64> = None;
    for column in 1..count {
        let previous = &grouping.journeys[column - 1];
        let current = &grouping.journeys[column];
        let compatible =
            previous.pattern_id == current.pattern_id && previous.notes == current.notes;
        let delta =
            time_between(current.departure_time, previous.departure_time).num_seconds();
        let continues =
            compatible && delta > 0 && run_delta.map_or(true, |known| known == delta);

        if continues {
            run_delta = Some(delta);
        } else {
            merge_run(grouping, &order, run_start, column - 1, run_delta);
            if compatible && delta > 0 {
                // the broken run's last journey starts the next one
                run_start = column - 1;
                run_delta = Some(delta);
            } else {
                run_start = column;
                run_delta = None;
            }
        }
    }
    merge_run(grouping, &order, run_start, count - 1, run_delta);
}

/// replaces the interior columns of a finished run with one frequency
/// cell in the top row and voids everything underneath it.
fn merge_run(
    grouping: &mut Grouping,
    order: &[usize],
    start: usize,
    end: usize,
    delta: Option<i64>,
) {
    let Some(delta) = delta else {
        return;
    };
    if end <= start {
        return;
    }
    let interior = end - start - 1;
    if interior < 2 {
        return;
    }
    if delta % SECONDS_PER_HOUR != 0 && SECONDS_PER_HOUR % delta != 0 {
        return;
    }

    for (row_position, &row_id) in order.iter().enumerate() {
        for column in (start + 1)..end {
            let cell = &mut grouping.rows[row_id].times[column];
            *cell = if row_position == 0 && column == start + 1 {
                Cell::Frequency {
                    minutes: delta / 60,
                    colspan: interior,
                    rowspan: order.len(),
                }
            } else {
                Cell::Covered
            };
        }
    }
}
