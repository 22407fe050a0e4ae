use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::timetable::abbreviation_ops;
use crate::timetable::bank_holidays::BankHolidayCalendar;
use crate::timetable::document::{
    Direction, Document, OperatingPeriod, Stop, StopLookup, StopUsage, VehicleJourney,
};
use crate::timetable::grouping::{Grouping, JourneyColumn};
use crate::timetable::projection_ops::{self, JourneySortKey, ProjectedJourney};
use crate::timetable::timetable_error::TimetableError;

/// the finished product: one document compiled for one date. read-only
/// once returned and safe to cache keyed by (service code, date).
#[derive(Debug, Clone)]
pub struct Timetable {
    pub service_code: String,
    pub description: Option<String>,
    pub line_name: Option<String>,
    pub operator_name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub operating_period: OperatingPeriod,
    pub date: NaiveDate,
    pub outbound: Grouping,
    pub inbound: Grouping,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
}

impl Timetable {
    pub fn groupings(&self) -> [&Grouping; 2] {
        [&self.outbound, &self.inbound]
    }

    /// false means "no buses scheduled today": a valid, reportable
    /// outcome, not an error.
    pub fn has_journeys(&self) -> bool {
        !self.outbound.is_empty() || !self.inbound.is_empty()
    }
}

/// compiles one TransXChange document into the timetable for `date`.
/// the single synchronous entry point for one document.
pub fn build_timetable(
    reader: impl Read,
    date: NaiveDate,
    description: Option<String>,
    stop_lookup: &dyn StopLookup,
) -> Result<Timetable, TimetableError> {
    let document = Document::from_reader(reader, stop_lookup)?;
    build_from_document(&document, date, description)
}

pub fn build_from_document(
    document: &Document,
    date: NaiveDate,
    description: Option<String>,
) -> Result<Timetable, TimetableError> {
    if !document.service.is_bus() {
        return Err(TimetableError::NotBusTimetable(
            document.service.mode.clone(),
        ));
    }
    if !document.service.operating_period.contains(date) {
        return Err(TimetableError::NoApplicablePeriod(date));
    }

    let holidays = BankHolidayCalendar::england_and_wales();
    let mut outbound = Grouping::new(Direction::Outbound);
    let mut inbound = Grouping::new(Direction::Inbound);

    // row skeletons first: every pattern reconciles into its direction's
    // grouping before any journey is projected
    for pattern in &document.patterns {
        let usages = document.stop_usages(pattern)?;
        let resolved: Vec<(StopUsage, Stop)> = usages
            .into_iter()
            .map(|usage| (usage.clone(), document.resolve_stop(&usage.stop_ref)))
            .collect();
        let grouping = match pattern.direction {
            Direction::Outbound => &mut outbound,
            Direction::Inbound => &mut inbound,
        };
        grouping.add_pattern(&pattern.id, &resolved)?;
    }

    struct Prepared<'a> {
        journey: &'a VehicleJourney,
        direction: Direction,
        projected: ProjectedJourney,
        key: JourneySortKey,
    }

    let mut prepared: Vec<Prepared> = Vec::new();
    for journey in &document.journeys {
        if !journey_runs(document, journey, date, &holidays) {
            continue;
        }
        let pattern = document
            .pattern(&journey.pattern_ref)
            .ok_or_else(|| TimetableError::DanglingReference(journey.pattern_ref.clone()))?;
        let links = document.timing_links(pattern)?;
        let projected = projection_ops::project(journey, &links);
        let key = JourneySortKey::new(journey, &projected);
        prepared.push(Prepared {
            journey,
            direction: pattern.direction,
            projected,
            key,
        });
    }

    for direction in [Direction::Outbound, Direction::Inbound] {
        let mut columns: Vec<&Prepared> = prepared
            .iter()
            .filter(|item| item.direction == direction)
            .collect();
        columns.sort_by(|a, b| projection_ops::compare_journeys(&a.key, &b.key));

        let grouping = match direction {
            Direction::Outbound => &mut outbound,
            Direction::Inbound => &mut inbound,
        };
        for item in columns {
            let Some(row_ids) = grouping.pattern_row_ids(&item.journey.pattern_ref) else {
                continue;
            };
            let row_ids = row_ids.clone();
            let times: Vec<(usize, NaiveTime)> = item
                .projected
                .times
                .iter()
                .enumerate()
                .filter_map(|(position, time)| time.map(|t| (row_ids[position], t)))
                .collect();
            grouping.push_journey(
                JourneyColumn {
                    pattern_id: item.journey.pattern_ref.clone(),
                    code: item.journey.code.clone(),
                    departure_time: item.journey.departure_time,
                    notes: item.journey.notes.clone(),
                },
                &times,
            );
        }
        abbreviation_ops::build_column_feet(grouping);
        abbreviation_ops::abbreviate(grouping);
    }

    Ok(Timetable {
        service_code: document.service.service_code.clone(),
        description: description.or_else(|| document.service.description.clone()),
        line_name: document.service.line_name.clone(),
        operator_name: document
            .operator
            .as_ref()
            .and_then(|operator| operator.short_name.clone()),
        origin: document.service.origin.clone(),
        destination: document.service.destination.clone(),
        operating_period: document.service.operating_period,
        date,
        outbound,
        inbound,
        created_at: document.created_at,
        modified_at: document.modified_at,
    })
}

/// a journey without its own operating profile inherits the service's;
/// with neither, it runs whenever the operating period applies.
fn journey_runs(
    document: &Document,
    journey: &VehicleJourney,
    date: NaiveDate,
    holidays: &BankHolidayCalendar,
) -> bool {
    match journey
        .operating_profile
        .as_ref()
        .or(document.service.operating_profile.as_ref())
    {
        Some(profile) => profile.should_run(date, holidays),
        None => true,
    }
}
