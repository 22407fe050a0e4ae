//! compiles TransXChange bus schedule documents into compact,
//! date-specific matrix timetables from the command line.
use clap::Parser;
use txc_timetable::timetable::app::TimetableApp;

fn main() {
    env_logger::init();
    let args = TimetableApp::parse();
    args.op.run()
}
