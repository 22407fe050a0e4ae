use chrono::{Duration, NaiveDate, NaiveTime};
use regex::Regex;

use crate::timetable::timetable_error::TimetableError;

/// subset of the XML Schema duration grammar observed in TransXChange
/// documents: an optional sign, days, then an optional time part with
/// hours, minutes and whole seconds.
const DURATION_REGEX: &str = r"^(-)?P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$";

/// reference date used to lift times-of-day into datetimes for arithmetic.
/// any date works; overflow past midnight is discarded on the way back.
const REFERENCE_DATE: (i32, u32, u32) = (2020, 1, 1);

/// parses a duration value such as "PT2M30S" or "-PT1H" into a signed
/// [Duration]. input that does not match the grammar is an error, never a
/// zero default.
pub fn parse_duration(value: &str) -> Result<Duration, TimetableError> {
    // regex here should be built at compile time
    let re = Regex::new(DURATION_REGEX)
        .map_err(|e| TimetableError::Other(format!("internal duration pattern error: {e}")))?;
    let groups = re
        .captures(value)
        .ok_or_else(|| TimetableError::DurationFormat(value.to_string()))?;

    let component = |i: usize| -> Result<i64, TimetableError> {
        match groups.get(i) {
            None => Ok(0),
            Some(m) => m
                .as_str()
                .parse::<i64>()
                .map_err(|_| TimetableError::DurationFormat(value.to_string())),
        }
    };
    let days = component(2)?;
    let hours = component(3)?;
    let minutes = component(4)?;
    let seconds = component(5)?;

    let total = ((days * 24 + hours) * 60 + minutes) * 60 + seconds;
    if groups.get(1).is_some() {
        Ok(Duration::seconds(-total))
    } else {
        Ok(Duration::seconds(total))
    }
}

/// adds a duration to a time-of-day, wrapping past midnight. journeys are
/// intra-day in this model, so date overflow is discarded rather than
/// tracked.
pub fn add_time(time: NaiveTime, duration: Duration) -> NaiveTime {
    (reference_date().and_time(time) + duration).time()
}

/// signed difference between two times-of-day, via the same fixed
/// reference date.
pub fn time_between(end: NaiveTime, start: NaiveTime) -> Duration {
    reference_date().and_time(end) - reference_date().and_time(start)
}

fn reference_date() -> NaiveDate {
    let (y, m, d) = REFERENCE_DATE;
    // the constant is a valid calendar date, so this cannot be None
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
