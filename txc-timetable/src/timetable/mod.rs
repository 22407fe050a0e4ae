pub mod app;
mod abbreviation_ops;
mod bank_holidays;
mod document;
pub mod duration_ops;
mod grouping;
mod operating_profile;
mod projection_ops;
mod service_ops;
#[allow(clippy::module_inception)]
mod timetable;
mod timetable_error;

pub use bank_holidays::BankHolidayCalendar;
pub use document::{
    Direction, Document, JourneyPattern, JourneyPatternSection, NoStopLookup, OperatingPeriod,
    Operator, Service, Stop, StopLookup, StopUsage, TimingLink, TimingStatus, VehicleJourney,
};
pub use grouping::{Cell, ColumnFoot, Grouping, JourneyColumn, Row};
pub use operating_profile::{
    DateRange, OperatingProfile, ServicedOrganisation, ServicedOrganisationDays,
};
pub use service_ops::{
    timetables_for_service, DocumentStore, InMemoryTimetableCache, NoTimetableCache,
    TimetableCache, ZipDocumentStore,
};
pub use timetable::{build_from_document, build_timetable, Timetable};
pub use timetable_error::TimetableError;
