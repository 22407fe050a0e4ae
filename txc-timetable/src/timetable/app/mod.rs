mod operation;
mod timetable_app;

pub use operation::TimetableOperation;
pub use timetable_app::TimetableApp;
