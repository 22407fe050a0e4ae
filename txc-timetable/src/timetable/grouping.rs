use std::collections::{BTreeMap, HashMap};

use chrono::NaiveTime;
use serde::Serialize;

use crate::timetable::document::{Direction, Stop, StopUsage, TimingStatus};
use crate::timetable::timetable_error::TimetableError;

/// one cell of the matrix: a departure time, a blank, or part of a
/// "then every N minutes" abbreviation span.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Cell {
    Empty,
    Time { time: NaiveTime },
    /// the visible abbreviation cell; spans `colspan` columns and
    /// `rowspan` rows of the grid
    Frequency {
        minutes: i64,
        colspan: usize,
        rowspan: usize,
    },
    /// a cell hidden underneath a frequency span
    Covered,
}

/// one stop's line in the matrix, with one cell per journey column.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub stop: Stop,
    pub timing_status: TimingStatus,
    pub times: Vec<Cell>,
    /// position of the next row in display order (linked mode)
    #[serde(skip)]
    next: Option<usize>,
}

/// a span of consecutive columns sharing one footnote text (or none),
/// printed once under the run instead of per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnFoot {
    pub notes: Option<String>,
    pub span: usize,
}

/// per-column metadata for a journey that survived date filtering.
#[derive(Debug, Clone, Serialize)]
pub struct JourneyColumn {
    pub pattern_id: String,
    pub code: Option<String>,
    pub departure_time: NaiveTime,
    pub notes: BTreeMap<String, String>,
}

/// row identity bookkeeping. rows live in the arena; this records how to
/// order them. the mode is fixed by the first journey pattern seen: stop
/// usages carrying explicit sequence numbers key rows directly, otherwise
/// rows form a linked list reconciled by diffing stop-code sequences.
#[derive(Debug, Clone)]
enum RowTable {
    Undecided,
    Sequenced(BTreeMap<u32, usize>),
    Linked { head: Option<usize> },
}

/// one direction (inbound or outbound) of a service's timetable.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub direction: Direction,
    pub(crate) rows: Vec<Row>,
    table: RowTable,
    pub journeys: Vec<JourneyColumn>,
    pub column_feet: BTreeMap<String, Vec<ColumnFoot>>,
    pattern_rows: HashMap<String, Vec<usize>>,
}

impl Grouping {
    pub fn new(direction: Direction) -> Grouping {
        Grouping {
            direction,
            rows: Vec::new(),
            table: RowTable::Undecided,
            journeys: Vec::new(),
            column_feet: BTreeMap::new(),
            pattern_rows: HashMap::new(),
        }
    }

    /// no journeys survived date filtering; "no buses today" rather than
    /// an error.
    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    /// row arena indices in display order.
    pub(crate) fn row_order(&self) -> Vec<usize> {
        match &self.table {
            RowTable::Undecided => Vec::new(),
            RowTable::Sequenced(map) => map.values().copied().collect(),
            RowTable::Linked { head } => {
                let mut order = Vec::with_capacity(self.rows.len());
                let mut cursor = *head;
                while let Some(index) = cursor {
                    order.push(index);
                    cursor = self.rows[index].next;
                }
                order
            }
        }
    }

    /// rows in display order, ready for rendering.
    pub fn rows(&self) -> Vec<&Row> {
        self.row_order()
            .into_iter()
            .map(|index| &self.rows[index])
            .collect()
    }

    pub(crate) fn pattern_row_ids(&self, pattern_id: &str) -> Option<&Vec<usize>> {
        self.pattern_rows.get(pattern_id)
    }

    /// merges one journey pattern's stop sequence into the row table.
    /// matched stops reuse their existing row so any times already
    /// recorded there stay attached to the right stop.
    pub(crate) fn add_pattern(
        &mut self,
        pattern_id: &str,
        usages: &[(StopUsage, Stop)],
    ) -> Result<(), TimetableError> {
        if usages.is_empty() {
            self.pattern_rows.insert(pattern_id.to_string(), Vec::new());
            return Ok(());
        }
        if matches!(self.table, RowTable::Undecided) {
            self.table = if usages[0].0.sequence_number.is_some() {
                RowTable::Sequenced(BTreeMap::new())
            } else {
                RowTable::Linked { head: None }
            };
        }
        let row_ids = if matches!(self.table, RowTable::Sequenced(_)) {
            self.add_sequenced(usages)?
        } else {
            self.add_unordered(usages)?
        };
        self.pattern_rows.insert(pattern_id.to_string(), row_ids);
        Ok(())
    }

    /// sequence-numbered mode: rows are keyed by the explicit number and
    /// the last pattern to write a number wins its row's stop identity.
    fn add_sequenced(
        &mut self,
        usages: &[(StopUsage, Stop)],
    ) -> Result<Vec<usize>, TimetableError> {
        let RowTable::Sequenced(ref mut table) = self.table else {
            unreachable!("caller checked the table mode");
        };
        let mut row_ids = Vec::with_capacity(usages.len());
        for (usage, stop) in usages {
            let sequence = usage
                .sequence_number
                .ok_or_else(|| TimetableError::Reconciliation(usage.stop_ref.clone()))?;
            match table.get(&sequence) {
                Some(&row_id) => {
                    self.rows[row_id].stop = stop.clone();
                    self.rows[row_id].timing_status = usage.timing_status;
                    row_ids.push(row_id);
                }
                None => {
                    let row_id = self.rows.len();
                    self.rows.push(Row {
                        stop: stop.clone(),
                        timing_status: usage.timing_status,
                        times: vec![Cell::Empty; self.journeys.len()],
                        next: None,
                    });
                    table.insert(sequence, row_id);
                    row_ids.push(row_id);
                }
            }
        }
        Ok(row_ids)
    }

    /// unordered mode: align the new stop-code sequence against the
    /// existing linked list with an insert/keep diff and splice the
    /// insertions in place.
    fn add_unordered(
        &mut self,
        usages: &[(StopUsage, Stop)],
    ) -> Result<Vec<usize>, TimetableError> {
        let existing = self.row_order();
        let existing_codes: Vec<String> = existing
            .iter()
            .map(|&index| self.rows[index].stop.atco_code.clone())
            .collect();
        let new_codes: Vec<String> = usages
            .iter()
            .map(|(usage, _)| usage.stop_ref.clone())
            .collect();

        let opcodes = lcs_opcodes(&existing_codes, &new_codes);
        let mut row_ids: Vec<Option<usize>> = vec![None; usages.len()];
        for opcode in opcodes {
            match opcode {
                DiffOp::Equal { a, b, len } => {
                    for offset in 0..len {
                        row_ids[b + offset] = Some(existing[a + offset]);
                    }
                }
                DiffOp::Delete { .. } => {}
                DiffOp::Insert { a, b, len } => {
                    let mut after = if a == 0 { None } else { Some(existing[a - 1]) };
                    for offset in 0..len {
                        let (usage, stop) = &usages[b + offset];
                        let row_id = self.rows.len();
                        self.rows.push(Row {
                            stop: stop.clone(),
                            timing_status: usage.timing_status,
                            times: vec![Cell::Empty; self.journeys.len()],
                            next: None,
                        });
                        self.splice_after(after, row_id);
                        after = Some(row_id);
                        row_ids[b + offset] = Some(row_id);
                    }
                }
            }
        }

        let mut aligned = Vec::with_capacity(row_ids.len());
        for (position, row_id) in row_ids.into_iter().enumerate() {
            match row_id {
                Some(row_id) => aligned.push(row_id),
                None => {
                    return Err(TimetableError::Reconciliation(
                        new_codes[position].clone(),
                    ))
                }
            }
        }
        Ok(aligned)
    }

    fn splice_after(&mut self, after: Option<usize>, row_id: usize) {
        let RowTable::Linked { ref mut head } = self.table else {
            unreachable!("caller checked the table mode");
        };
        match after {
            None => {
                self.rows[row_id].next = *head;
                *head = Some(row_id);
            }
            Some(previous) => {
                self.rows[row_id].next = self.rows[previous].next;
                self.rows[previous].next = Some(row_id);
            }
        }
    }

    /// appends one journey column: every row grows by exactly one cell so
    /// the grid stays rectangular, then the journey's projected times
    /// overwrite the blanks on the rows it visits.
    pub(crate) fn push_journey(&mut self, column: JourneyColumn, times: &[(usize, NaiveTime)]) {
        for row in &mut self.rows {
            row.times.push(Cell::Empty);
        }
        for (row_id, time) in times {
            if let Some(cell) = self.rows[*row_id].times.last_mut() {
                *cell = Cell::Time { time: *time };
            }
        }
        self.journeys.push(column);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum DiffOp {
    Equal { a: usize, b: usize, len: usize },
    Delete { a: usize, len: usize },
    Insert { a: usize, b: usize, len: usize },
}

/// longest-common-subsequence opcodes between two stop-code sequences.
/// sequences here are journey-pattern length, so the quadratic table is
/// small.
fn lcs_opcodes(a: &[String], b: &[String]) -> Vec<DiffOp> {
    let m = a.len();
    let n = b.len();
    let mut lengths = vec![vec![0usize; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            lengths[i][j] = if a[i] == b[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut opcodes = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < m && j < n {
        if a[i] == b[j] {
            let (start_a, start_b) = (i, j);
            let mut len = 0;
            while i < m && j < n && a[i] == b[j] {
                i += 1;
                j += 1;
                len += 1;
            }
            opcodes.push(DiffOp::Equal {
                a: start_a,
                b: start_b,
                len,
            });
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            let start_a = i;
            let mut len = 0;
            while i < m && j < n && a[i] != b[j] && lengths[i + 1][j] >= lengths[i][j + 1] {
                i += 1;
                len += 1;
            }
            opcodes.push(DiffOp::Delete { a: start_a, len });
        } else {
            let (start_a, start_b) = (i, j);
            let mut len = 0;
            while i < m && j < n && a[i] != b[j] && lengths[i + 1][j] < lengths[i][j + 1] {
                j += 1;
                len += 1;
            }
            opcodes.push(DiffOp::Insert {
                a: start_a,
                b: start_b,
                len,
            });
        }
    }
    if i < m {
        opcodes.push(DiffOp::Delete { a: i, len: m - i });
    }
    if j < n {
        opcodes.push(DiffOp::Insert {
            a: i,
            b: j,
            len: n - j,
        });
    }
    opcodes
}

#[cfg(test)]
mod test {
    use super::{lcs_opcodes, Cell, DiffOp, Grouping, JourneyColumn};
    use crate::timetable::document::{Direction, Stop, StopUsage, TimingStatus};
    use chrono::NaiveTime;
    use std::collections::BTreeMap;

    fn usage(code: &str, sequence: Option<u32>) -> (StopUsage, Stop) {
        (
            StopUsage {
                stop_ref: code.to_string(),
                sequence_number: sequence,
                timing_status: TimingStatus::Principal,
                wait_time: None,
            },
            Stop::bare(code),
        )
    }

    fn unordered(codes: &[&str]) -> Vec<(StopUsage, Stop)> {
        codes.iter().map(|code| usage(code, None)).collect()
    }

    fn column(pattern_id: &str, departure: NaiveTime) -> JourneyColumn {
        JourneyColumn {
            pattern_id: pattern_id.to_string(),
            code: None,
            departure_time: departure,
            notes: BTreeMap::new(),
        }
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_diff_opcodes_for_replace_region() {
        let existing: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        let incoming: Vec<String> = ["A", "X", "C"].iter().map(|s| s.to_string()).collect();
        let opcodes = lcs_opcodes(&existing, &incoming);
        match &opcodes[..] {
            [DiffOp::Equal { a: 0, b: 0, len: 1 }, DiffOp::Delete { a: 1, len: 1 }, DiffOp::Insert { a: 2, b: 1, len: 1 }, DiffOp::Equal { a: 2, b: 2, len: 1 }] => {
            }
            other => panic!("unexpected opcodes: {other:?}"),
        }
    }

    #[test]
    fn test_diverging_patterns_share_rows() {
        let mut grouping = Grouping::new(Direction::Outbound);
        grouping
            .add_pattern("JP1", &unordered(&["A", "B", "C"]))
            .unwrap();
        grouping
            .add_pattern("JP2", &unordered(&["A", "X", "C"]))
            .unwrap();

        let codes: Vec<String> = grouping
            .rows()
            .iter()
            .map(|row| row.stop.atco_code.clone())
            .collect();
        assert_eq!(codes.first().map(String::as_str), Some("A"));
        assert_eq!(codes.last().map(String::as_str), Some("C"));
        assert_eq!(codes.len(), 4);
        assert_eq!(codes.iter().filter(|code| *code == "C").count(), 1);
        assert!(codes.contains(&"B".to_string()));
        assert!(codes.contains(&"X".to_string()));

        // matched stops resolve to the same row for both patterns
        let first = grouping.pattern_row_ids("JP1").unwrap();
        let second = grouping.pattern_row_ids("JP2").unwrap();
        assert_eq!(first[0], second[0]);
        assert_eq!(first[2], second[2]);
        assert_ne!(first[1], second[1]);
    }

    #[test]
    fn test_identical_patterns_add_no_rows() {
        let mut grouping = Grouping::new(Direction::Outbound);
        grouping
            .add_pattern("JP1", &unordered(&["A", "B", "C"]))
            .unwrap();
        grouping
            .add_pattern("JP2", &unordered(&["A", "B", "C"]))
            .unwrap();
        assert_eq!(grouping.rows().len(), 3);
        assert_eq!(
            grouping.pattern_row_ids("JP1").unwrap(),
            grouping.pattern_row_ids("JP2").unwrap()
        );
    }

    #[test]
    fn test_sequence_numbers_key_rows_directly() {
        let mut grouping = Grouping::new(Direction::Inbound);
        grouping
            .add_pattern(
                "JP1",
                &[usage("A", Some(1)), usage("B", Some(2)), usage("C", Some(3))],
            )
            .unwrap();
        // the later pattern overwrites row 2 with its own stop
        grouping
            .add_pattern(
                "JP2",
                &[usage("A", Some(1)), usage("X", Some(2)), usage("C", Some(3))],
            )
            .unwrap();

        let codes: Vec<String> = grouping
            .rows()
            .iter()
            .map(|row| row.stop.atco_code.clone())
            .collect();
        assert_eq!(codes, vec!["A", "X", "C"]);
    }

    #[test]
    fn test_columns_stay_rectangular() {
        let mut grouping = Grouping::new(Direction::Outbound);
        grouping
            .add_pattern("JP1", &unordered(&["A", "B", "C"]))
            .unwrap();
        let rows = grouping.pattern_row_ids("JP1").unwrap().clone();
        grouping.push_journey(
            column("JP1", time(8, 0)),
            &[(rows[0], time(8, 0)), (rows[2], time(8, 10))],
        );
        grouping
            .add_pattern("JP2", &unordered(&["A", "X", "C"]))
            .unwrap();
        let rows2 = grouping.pattern_row_ids("JP2").unwrap().clone();
        grouping.push_journey(
            column("JP2", time(9, 0)),
            &[
                (rows2[0], time(9, 0)),
                (rows2[1], time(9, 5)),
                (rows2[2], time(9, 10)),
            ],
        );

        for row in grouping.rows() {
            assert_eq!(row.times.len(), 2);
        }
        // the row spliced in later starts with a blank for the earlier journey
        let x_row = grouping
            .rows()
            .into_iter()
            .find(|row| row.stop.atco_code == "X")
            .unwrap()
            .clone();
        assert_eq!(x_row.times[0], Cell::Empty);
        assert_eq!(x_row.times[1], Cell::Time { time: time(9, 5) });
    }
}
