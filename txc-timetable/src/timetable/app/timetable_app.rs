use super::TimetableOperation;
use clap::Parser;

/// command line tool for compiling TransXChange bus schedule documents
/// into date-specific matrix timetables
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct TimetableApp {
    #[command(subcommand)]
    pub op: TimetableOperation,
}
