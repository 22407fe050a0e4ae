use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::timetable::bank_holidays::{BankHolidayCalendar, ALL_BANK_HOLIDAYS};
use crate::timetable::document::raw::{
    RawDateRange, RawDayOfWeek, RawOperatingProfile, RawServicedOrganisationDays,
};
use crate::timetable::timetable_error::TimetableError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// an inclusive calendar date range. a range with no declared end covers
/// its start date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub(crate) fn from_raw(raw: &RawDateRange) -> Result<DateRange, TimetableError> {
        let start = parse_date(&raw.start_date)?;
        let end = match &raw.end_date {
            Some(value) => parse_date(value)?,
            None => start,
        };
        Ok(DateRange { start, end })
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, TimetableError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| TimetableError::DateFormat(value.to_string()))
}

/// an external calendar (typically a school) whose working and holiday
/// day ranges gate journeys linked to it.
#[derive(Debug, Clone, Default)]
pub struct ServicedOrganisation {
    pub code: String,
    pub name: Option<String>,
    pub working_days: Vec<DateRange>,
    pub holidays: Vec<DateRange>,
}

/// a profile's link to serviced-organisation calendars, resolved down to
/// the date ranges each side selected (working days or holidays).
#[derive(Debug, Clone, Default)]
pub struct ServicedOrganisationDays {
    pub nonoperation_days: Option<Vec<DateRange>>,
    pub operation_days: Option<Vec<DateRange>>,
}

/// the calendar rule attached to a vehicle journey (or inherited from its
/// service): the weekly pattern plus the layered exceptions that decide
/// whether the journey runs on a particular date.
#[derive(Debug, Clone, Default)]
pub struct OperatingProfile {
    pub weekdays: HashSet<Weekday>,
    pub operation_days: Vec<DateRange>,
    pub nonoperation_days: Vec<DateRange>,
    pub operation_bank_holidays: Vec<String>,
    pub nonoperation_bank_holidays: Vec<String>,
    pub serviced_organisation: Option<ServicedOrganisationDays>,
}

impl OperatingProfile {
    /// decides whether a journey carrying this profile runs on `date`.
    ///
    /// precedence, first decisive rule wins: bank-holiday non-operation,
    /// then bank-holiday operation (which overrides a weekday mismatch);
    /// the weekday pattern, overridable by a special operation range; the
    /// requirement for at least one positive rule; serviced-organisation
    /// non-operation then operation ranges; explicit non-operation ranges;
    /// explicit operation ranges; default running.
    pub fn should_run(&self, date: NaiveDate, holidays: &BankHolidayCalendar) -> bool {
        let holiday_names = holidays.names(date);
        if !holiday_names.is_empty() {
            if matches_holiday(&self.nonoperation_bank_holidays, holiday_names) {
                return false;
            }
            if matches_holiday(&self.operation_bank_holidays, holiday_names) {
                return true;
            }
        }

        if !self.weekdays.is_empty() && !self.weekdays.contains(&date.weekday()) {
            // a special operation range can rescue a weekday mismatch
            if !self.operation_days.iter().any(|r| r.contains(date)) {
                return false;
            }
        }

        // a profile needs at least one positive rule to run at all
        if self.weekdays.is_empty() && self.operation_days.is_empty() {
            return false;
        }

        if let Some(organisation) = &self.serviced_organisation {
            if let Some(ranges) = &organisation.nonoperation_days {
                if ranges.iter().any(|r| r.contains(date)) {
                    return false;
                }
            }
            if let Some(ranges) = &organisation.operation_days {
                return ranges.iter().any(|r| r.contains(date));
            }
        }

        if self.nonoperation_days.iter().any(|r| r.contains(date)) {
            return false;
        }

        if !self.operation_days.is_empty() {
            return self.operation_days.iter().any(|r| r.contains(date));
        }

        true
    }

    /// builds a typed profile from the raw document element, resolving
    /// serviced-organisation references against the document's
    /// organisation table. an unknown organisation reference contributes
    /// no ranges rather than failing the document.
    pub(crate) fn from_raw(
        raw: &RawOperatingProfile,
        organisations: &HashMap<String, ServicedOrganisation>,
    ) -> Result<OperatingProfile, TimetableError> {
        let mut profile = OperatingProfile::default();

        if let Some(regular) = &raw.regular_day_type {
            if regular.holidays_only.is_some() {
                // the weekday set stays empty; the bank-holiday operation
                // list is the profile's only positive rule
            } else if let Some(days) = &regular.days_of_week {
                for day in &days.days {
                    for weekday in expand_weekday(day) {
                        profile.weekdays.insert(weekday);
                    }
                }
            }
        }

        if let Some(special) = &raw.special_days_operation {
            if let Some(ranges) = &special.days_of_operation {
                profile.operation_days = convert_ranges(&ranges.date_range)?;
            }
            if let Some(ranges) = &special.days_of_non_operation {
                profile.nonoperation_days = convert_ranges(&ranges.date_range)?;
            }
        }

        if let Some(bank_holidays) = &raw.bank_holiday_operation {
            if let Some(days) = &bank_holidays.days_of_operation {
                profile.operation_bank_holidays =
                    days.days.iter().map(|d| d.name().to_string()).collect();
            }
            if let Some(days) = &bank_holidays.days_of_non_operation {
                profile.nonoperation_bank_holidays =
                    days.days.iter().map(|d| d.name().to_string()).collect();
            }
        }

        if let Some(day_type) = &raw.serviced_organisation_day_type {
            let mut resolved = ServicedOrganisationDays::default();
            if let Some(side) = &day_type.days_of_non_operation {
                resolved.nonoperation_days = Some(resolve_organisation_days(side, organisations));
            }
            if let Some(side) = &day_type.days_of_operation {
                resolved.operation_days = Some(resolve_organisation_days(side, organisations));
            }
            profile.serviced_organisation = Some(resolved);
        }

        Ok(profile)
    }
}

fn matches_holiday(profile_names: &[String], holiday_names: &[&'static str]) -> bool {
    profile_names.iter().any(|name| {
        name == ALL_BANK_HOLIDAYS || holiday_names.iter().any(|holiday| holiday == name)
    })
}

fn convert_ranges(ranges: &[RawDateRange]) -> Result<Vec<DateRange>, TimetableError> {
    ranges.iter().map(DateRange::from_raw).collect()
}

/// collects the date ranges a profile side selects: the working days
/// and/or holidays of each referenced organisation.
fn resolve_organisation_days(
    side: &RawServicedOrganisationDays,
    organisations: &HashMap<String, ServicedOrganisation>,
) -> Vec<DateRange> {
    let mut ranges = Vec::new();
    if let Some(refs) = &side.working_days {
        for code in &refs.refs {
            if let Some(organisation) = organisations.get(code.trim()) {
                ranges.extend(organisation.working_days.iter().copied());
            } else {
                log::warn!("unknown serviced organisation '{}'", code.trim());
            }
        }
    }
    if let Some(refs) = &side.holidays {
        for code in &refs.refs {
            if let Some(organisation) = organisations.get(code.trim()) {
                ranges.extend(organisation.holidays.iter().copied());
            } else {
                log::warn!("unknown serviced organisation '{}'", code.trim());
            }
        }
    }
    ranges
}

fn expand_weekday(day: &RawDayOfWeek) -> Vec<Weekday> {
    match day {
        RawDayOfWeek::Monday => vec![Weekday::Mon],
        RawDayOfWeek::Tuesday => vec![Weekday::Tue],
        RawDayOfWeek::Wednesday => vec![Weekday::Wed],
        RawDayOfWeek::Thursday => vec![Weekday::Thu],
        RawDayOfWeek::Friday => vec![Weekday::Fri],
        RawDayOfWeek::Saturday => vec![Weekday::Sat],
        RawDayOfWeek::Sunday => vec![Weekday::Sun],
        RawDayOfWeek::MondayToFriday => vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        RawDayOfWeek::MondayToSaturday => vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ],
        RawDayOfWeek::MondayToSunday => vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ],
        RawDayOfWeek::Weekend => vec![Weekday::Sat, Weekday::Sun],
    }
}

#[cfg(test)]
mod test {
    use super::{DateRange, OperatingProfile, ServicedOrganisationDays};
    use crate::timetable::bank_holidays::BankHolidayCalendar;
    use chrono::{NaiveDate, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange { start, end }
    }

    fn weekday_profile(days: &[Weekday]) -> OperatingProfile {
        OperatingProfile {
            weekdays: days.iter().copied().collect(),
            ..OperatingProfile::default()
        }
    }

    #[test]
    fn test_weekday_rule() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let profile = weekday_profile(&[Weekday::Mon, Weekday::Tue]);
        // 2025-03-10 is a Monday
        assert!(profile.should_run(date(2025, 3, 10), &calendar));
        assert!(!profile.should_run(date(2025, 3, 12), &calendar));
    }

    #[test]
    fn test_bank_holiday_operation_overrides_weekday() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let mut profile = weekday_profile(&[Weekday::Mon]);
        profile.operation_bank_holidays = vec!["AllBankHolidays".to_string()];
        // Good Friday 2025 falls on a Friday, outside the weekday set
        assert!(profile.should_run(date(2025, 4, 18), &calendar));
    }

    #[test]
    fn test_bank_holiday_nonoperation_wins() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let mut profile = weekday_profile(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]);
        profile.nonoperation_bank_holidays = vec!["GoodFriday".to_string()];
        assert!(!profile.should_run(date(2025, 4, 18), &calendar));
        // the preceding Friday is an ordinary day
        assert!(profile.should_run(date(2025, 4, 11), &calendar));
    }

    #[test]
    fn test_special_nonoperation_range() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let mut profile = weekday_profile(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]);
        profile.nonoperation_days = vec![range(date(2025, 7, 14), date(2025, 7, 18))];
        assert!(!profile.should_run(date(2025, 7, 16), &calendar));
        assert!(profile.should_run(date(2025, 7, 13), &calendar));
        assert!(profile.should_run(date(2025, 7, 19), &calendar));
    }

    #[test]
    fn test_special_operation_range_rescues_weekday_mismatch() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let mut profile = weekday_profile(&[Weekday::Mon]);
        profile.operation_days = vec![range(date(2025, 7, 16), date(2025, 7, 16))];
        // a Wednesday, rescued by the operation range
        assert!(profile.should_run(date(2025, 7, 16), &calendar));
        assert!(!profile.should_run(date(2025, 7, 17), &calendar));
    }

    #[test]
    fn test_profile_without_positive_rule_never_runs() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let profile = OperatingProfile::default();
        assert!(!profile.should_run(date(2025, 3, 10), &calendar));
    }

    #[test]
    fn test_serviced_organisation_nonoperation_takes_precedence() {
        let calendar = BankHolidayCalendar::england_and_wales();
        let term = range(date(2025, 9, 1), date(2025, 12, 19));
        let half_term = range(date(2025, 10, 27), date(2025, 10, 31));
        let mut profile = weekday_profile(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]);
        profile.serviced_organisation = Some(ServicedOrganisationDays {
            nonoperation_days: Some(vec![half_term]),
            operation_days: Some(vec![term]),
        });
        // inside term, outside half term
        assert!(profile.should_run(date(2025, 9, 24), &calendar));
        // half term vetoes even though term contains the date
        assert!(!profile.should_run(date(2025, 10, 29), &calendar));
        // outside term entirely
        assert!(!profile.should_run(date(2026, 1, 7), &calendar));
    }
}
