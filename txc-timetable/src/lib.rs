//! Compiles TransXChange documents (the UK standard XML interchange format
//! for bus and coach schedules) into compact, date-specific matrix
//! timetables: one row per stop, one column per vehicle journey that
//! actually runs on the requested date, with frequent services collapsed
//! into "then every N minutes" cells.
pub mod timetable;
