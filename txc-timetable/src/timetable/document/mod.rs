pub mod raw;

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::timetable::duration_ops::parse_duration;
use crate::timetable::operating_profile::{
    parse_date, DateRange, OperatingProfile, ServicedOrganisation,
};
use crate::timetable::timetable_error::TimetableError;

const TIME_FORMAT: &str = "%H:%M:%S";

/// a bus stop as far as a timetable row needs one. stops referenced from a
/// journey pattern but missing from the document's stop list become "bare"
/// stubs carrying the code as their name, which still make valid rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stop {
    pub atco_code: String,
    pub common_name: String,
    pub locality: Option<String>,
}

impl Stop {
    pub fn bare(atco_code: &str) -> Stop {
        Stop {
            atco_code: atco_code.to_string(),
            common_name: atco_code.to_string(),
            locality: None,
        }
    }

    /// locality-qualified display name, unless the common name already
    /// mentions the locality.
    pub fn display_name(&self) -> String {
        match &self.locality {
            Some(locality) if !self.common_name.contains(locality.as_str()) => {
                format!("{} {}", locality, self.common_name)
            }
            _ => self.common_name.clone(),
        }
    }
}

/// external source of authoritative stop display data. absence of a stop
/// is not an error; the document's own stop list (or a bare stub) is used
/// instead.
pub trait StopLookup {
    fn stop(&self, atco_code: &str) -> Option<Stop>;
}

/// lookup that knows nothing, for callers working from the document alone.
pub struct NoStopLookup;

impl StopLookup for NoStopLookup {
    fn stop(&self, _atco_code: &str) -> Option<Stop> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStatus {
    Principal,
    Other,
}

impl TimingStatus {
    fn from_code(code: Option<&str>) -> TimingStatus {
        match code {
            Some("OTH") | Some("otherPoint") | Some("TIP") | Some("timeInfoPoint") => {
                TimingStatus::Other
            }
            _ => TimingStatus::Principal,
        }
    }
}

/// one end of a timing link: the stop visited plus how the schedule treats
/// the visit.
#[derive(Debug, Clone)]
pub struct StopUsage {
    pub stop_ref: String,
    pub sequence_number: Option<u32>,
    pub timing_status: TimingStatus,
    pub wait_time: Option<Duration>,
}

/// a stop-to-stop hop with its scheduled run time.
#[derive(Debug, Clone)]
pub struct TimingLink {
    pub id: Option<String>,
    pub from: StopUsage,
    pub to: StopUsage,
    pub run_time: Duration,
}

#[derive(Debug, Clone)]
pub struct JourneyPatternSection {
    pub id: String,
    pub timing_links: Vec<TimingLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    /// only the exact tag "outbound" selects the outbound grouping;
    /// anything else (including absence) is inbound.
    pub fn from_tag(tag: Option<&str>) -> Direction {
        match tag {
            Some("outbound") => Direction::Outbound,
            _ => Direction::Inbound,
        }
    }
}

/// template stop sequence: an ordered chain of sections whose timing links
/// concatenate into one logical path.
#[derive(Debug, Clone)]
pub struct JourneyPattern {
    pub id: String,
    pub direction: Direction,
    pub section_refs: Vec<String>,
}

/// one scheduled trip over a journey pattern.
#[derive(Debug, Clone)]
pub struct VehicleJourney {
    pub code: Option<String>,
    pub sequence_number: Option<u32>,
    pub pattern_ref: String,
    pub departure_time: NaiveTime,
    pub operating_profile: Option<OperatingProfile>,
    pub start_deadrun: Option<String>,
    pub end_deadrun: Option<String>,
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatingPeriod {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl OperatingPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.map_or(true, |end| date <= end)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Operator {
    pub id: Option<String>,
    pub code: Option<String>,
    pub short_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub service_code: String,
    pub mode: String,
    pub line_name: Option<String>,
    pub description: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub operating_period: OperatingPeriod,
    pub operating_profile: Option<OperatingProfile>,
}

impl Service {
    /// an absent mode means bus; any other declared mode marks the
    /// document as not a bus timetable.
    pub fn is_bus(&self) -> bool {
        matches!(self.mode.as_str(), "" | "bus" | "coach")
    }
}

/// the typed graph built from one TransXChange document. the raw XML tree
/// is discarded once this exists.
#[derive(Debug, Clone)]
pub struct Document {
    pub stops: HashMap<String, Stop>,
    pub sections: HashMap<String, JourneyPatternSection>,
    pub patterns: Vec<JourneyPattern>,
    pub journeys: Vec<VehicleJourney>,
    pub service: Service,
    pub operator: Option<Operator>,
    pub created_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
}

impl Document {
    pub fn from_reader(
        mut reader: impl Read,
        stop_lookup: &dyn StopLookup,
    ) -> Result<Document, TimetableError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Document::from_xml(&text, stop_lookup)
    }

    pub fn from_xml(text: &str, stop_lookup: &dyn StopLookup) -> Result<Document, TimetableError> {
        let raw: raw::RawTransXChange = quick_xml::de::from_str(text)?;

        let organisations = convert_organisations(&raw)?;
        let mut stops = convert_stops(&raw, stop_lookup);
        let sections = convert_sections(&raw)?;

        // stops referenced only from timing links can still have
        // authoritative display data in the lookup
        for section in sections.values() {
            for link in &section.timing_links {
                for code in [&link.from.stop_ref, &link.to.stop_ref] {
                    if !stops.contains_key(code) {
                        if let Some(stop) = stop_lookup.stop(code) {
                            stops.insert(code.clone(), stop);
                        }
                    }
                }
            }
        }
        let service = convert_service(&raw, &organisations)?;
        let patterns = convert_patterns(&raw, &sections)?;
        let operator = convert_operator(&raw);
        let journeys = convert_journeys(&raw, &patterns, &organisations)?;

        Ok(Document {
            stops,
            sections,
            patterns,
            journeys,
            service,
            operator,
            created_at: parse_datetime(raw.creation_date_time.as_deref()),
            modified_at: parse_datetime(raw.modification_date_time.as_deref()),
        })
    }

    pub fn pattern(&self, id: &str) -> Option<&JourneyPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    /// the pattern's timing links, concatenated across its sections.
    pub fn timing_links(
        &self,
        pattern: &JourneyPattern,
    ) -> Result<Vec<&TimingLink>, TimetableError> {
        let mut links = Vec::new();
        for section_ref in &pattern.section_refs {
            let section = self
                .sections
                .get(section_ref)
                .ok_or_else(|| TimetableError::DanglingReference(section_ref.clone()))?;
            links.extend(section.timing_links.iter());
        }
        Ok(links)
    }

    /// the pattern's linear stop visitation: the first link's origin, then
    /// every link's destination.
    pub fn stop_usages(
        &self,
        pattern: &JourneyPattern,
    ) -> Result<Vec<&StopUsage>, TimetableError> {
        let links = self.timing_links(pattern)?;
        let mut usages = Vec::with_capacity(links.len() + 1);
        if let Some(first) = links.first() {
            usages.push(&first.from);
        }
        for link in &links {
            usages.push(&link.to);
        }
        Ok(usages)
    }

    /// authoritative stop record when the document has one, a bare stub
    /// otherwise.
    pub fn resolve_stop(&self, atco_code: &str) -> Stop {
        self.stops
            .get(atco_code)
            .cloned()
            .unwrap_or_else(|| Stop::bare(atco_code))
    }
}

fn convert_organisations(
    raw: &raw::RawTransXChange,
) -> Result<HashMap<String, ServicedOrganisation>, TimetableError> {
    let mut organisations = HashMap::new();
    let Some(raw_organisations) = &raw.serviced_organisations else {
        return Ok(organisations);
    };
    for raw_organisation in &raw_organisations.organisations {
        let Some(code) = &raw_organisation.organisation_code else {
            continue;
        };
        let working_days = match &raw_organisation.working_days {
            Some(ranges) => convert_date_ranges(&ranges.date_range)?,
            None => Vec::new(),
        };
        let holidays = match &raw_organisation.holidays {
            Some(ranges) => convert_date_ranges(&ranges.date_range)?,
            None => Vec::new(),
        };
        organisations.insert(
            code.trim().to_string(),
            ServicedOrganisation {
                code: code.trim().to_string(),
                name: raw_organisation.name.clone(),
                working_days,
                holidays,
            },
        );
    }
    Ok(organisations)
}

fn convert_date_ranges(ranges: &[raw::RawDateRange]) -> Result<Vec<DateRange>, TimetableError> {
    ranges.iter().map(DateRange::from_raw).collect()
}

fn convert_stops(raw: &raw::RawTransXChange, stop_lookup: &dyn StopLookup) -> HashMap<String, Stop> {
    let mut stops = HashMap::new();
    let Some(stop_points) = &raw.stop_points else {
        return stops;
    };
    for annotated in &stop_points.stops {
        let atco_code = annotated.stop_point_ref.trim().to_string();
        let stop = match stop_lookup.stop(&atco_code) {
            Some(stop) => stop,
            None => Stop {
                atco_code: atco_code.clone(),
                common_name: annotated
                    .common_name
                    .clone()
                    .unwrap_or_else(|| atco_code.clone()),
                locality: annotated.locality_name.clone(),
            },
        };
        stops.insert(atco_code, stop);
    }
    stops
}

fn convert_sections(
    raw: &raw::RawTransXChange,
) -> Result<HashMap<String, JourneyPatternSection>, TimetableError> {
    let mut sections = HashMap::new();
    let Some(raw_sections) = &raw.journey_pattern_sections else {
        return Ok(sections);
    };
    for raw_section in &raw_sections.sections {
        let mut timing_links = Vec::with_capacity(raw_section.timing_links.len());
        for raw_link in &raw_section.timing_links {
            timing_links.push(TimingLink {
                id: raw_link.id.clone(),
                from: convert_stop_usage(&raw_link.from)?,
                to: convert_stop_usage(&raw_link.to)?,
                run_time: match &raw_link.run_time {
                    Some(value) => parse_duration(value)?,
                    None => Duration::zero(),
                },
            });
        }
        sections.insert(
            raw_section.id.clone(),
            JourneyPatternSection {
                id: raw_section.id.clone(),
                timing_links,
            },
        );
    }
    Ok(sections)
}

fn convert_stop_usage(raw_usage: &raw::RawStopUsage) -> Result<StopUsage, TimetableError> {
    Ok(StopUsage {
        stop_ref: raw_usage.stop_point_ref.trim().to_string(),
        sequence_number: raw_usage.sequence_number,
        timing_status: TimingStatus::from_code(raw_usage.timing_status.as_deref()),
        wait_time: match &raw_usage.wait_time {
            Some(value) => Some(parse_duration(value)?),
            None => None,
        },
    })
}

fn convert_service(
    raw: &raw::RawTransXChange,
    organisations: &HashMap<String, ServicedOrganisation>,
) -> Result<Service, TimetableError> {
    let raw_service = raw
        .services
        .as_ref()
        .and_then(|services| services.services.first())
        .ok_or(TimetableError::MissingElement("Service"))?;

    let service_code = raw_service
        .service_code
        .as_ref()
        .map(|code| code.trim().to_string())
        .ok_or(TimetableError::MissingElement("ServiceCode"))?;

    let raw_period = raw_service
        .operating_period
        .as_ref()
        .ok_or(TimetableError::MissingElement("OperatingPeriod"))?;
    let operating_period = OperatingPeriod {
        start: parse_date(&raw_period.start_date)?,
        end: match &raw_period.end_date {
            Some(value) => Some(parse_date(value)?),
            None => None,
        },
    };

    let operating_profile = match &raw_service.operating_profile {
        Some(raw_profile) => Some(OperatingProfile::from_raw(raw_profile, organisations)?),
        None => None,
    };

    let standard = raw_service.standard_service.as_ref();

    Ok(Service {
        service_code,
        mode: raw_service
            .mode
            .as_ref()
            .map(|mode| mode.trim().to_lowercase())
            .unwrap_or_default(),
        line_name: raw_service
            .lines
            .as_ref()
            .and_then(|lines| lines.lines.first())
            .and_then(|line| line.line_name.clone()),
        description: raw_service.description.clone(),
        origin: standard.and_then(|s| s.origin.clone()),
        destination: standard.and_then(|s| s.destination.clone()),
        operating_period,
        operating_profile,
    })
}

fn convert_patterns(
    raw: &raw::RawTransXChange,
    sections: &HashMap<String, JourneyPatternSection>,
) -> Result<Vec<JourneyPattern>, TimetableError> {
    let mut patterns = Vec::new();
    let Some(standard_service) = raw
        .services
        .as_ref()
        .and_then(|services| services.services.first())
        .and_then(|service| service.standard_service.as_ref())
    else {
        return Ok(patterns);
    };
    for raw_pattern in &standard_service.journey_patterns {
        let section_refs: Vec<String> = raw_pattern
            .section_refs
            .iter()
            .map(|r| r.trim().to_string())
            .collect();
        for section_ref in &section_refs {
            if !sections.contains_key(section_ref) {
                return Err(TimetableError::DanglingReference(section_ref.clone()));
            }
        }
        patterns.push(JourneyPattern {
            id: raw_pattern.id.clone(),
            direction: Direction::from_tag(raw_pattern.direction.as_deref().map(str::trim)),
            section_refs,
        });
    }
    Ok(patterns)
}

fn convert_operator(raw: &raw::RawTransXChange) -> Option<Operator> {
    let operators = raw.operators.as_ref()?;
    let all: Vec<&raw::RawOperator> = operators
        .operators
        .iter()
        .chain(operators.licensed_operators.iter())
        .collect();
    let registered_ref = raw
        .services
        .as_ref()
        .and_then(|services| services.services.first())
        .and_then(|service| service.registered_operator_ref.as_deref())
        .map(str::trim);
    let chosen = match registered_ref {
        Some(wanted) => all
            .iter()
            .find(|o| o.id.as_deref() == Some(wanted))
            .or_else(|| all.first()),
        None => all.first(),
    }?;
    Some(Operator {
        id: chosen.id.clone(),
        code: chosen
            .national_operator_code
            .clone()
            .or_else(|| chosen.operator_code.clone()),
        short_name: chosen.operator_short_name.clone(),
    })
}

/// first pass keeps journeys in document order with unresolved references;
/// the second pass chases VehicleJourneyRef indirection, which may point at
/// a journey declared later in the document.
fn convert_journeys(
    raw: &raw::RawTransXChange,
    patterns: &[JourneyPattern],
    organisations: &HashMap<String, ServicedOrganisation>,
) -> Result<Vec<VehicleJourney>, TimetableError> {
    struct PendingJourney {
        code: Option<String>,
        sequence_number: Option<u32>,
        pattern_ref: Option<String>,
        journey_ref: Option<String>,
        departure_time: NaiveTime,
        operating_profile: Option<OperatingProfile>,
        start_deadrun: Option<String>,
        end_deadrun: Option<String>,
        notes: BTreeMap<String, String>,
    }

    let mut pending = Vec::new();
    let Some(raw_journeys) = &raw.vehicle_journeys else {
        return Ok(Vec::new());
    };
    for raw_journey in &raw_journeys.journeys {
        let code = raw_journey
            .vehicle_journey_code
            .as_ref()
            .map(|c| c.trim().to_string());
        let label = code.clone().unwrap_or_else(|| "?".to_string());

        let departure_time = match raw_journey.departure_time.as_deref().map(str::trim) {
            Some(value) => match NaiveTime::parse_from_str(value, TIME_FORMAT) {
                Ok(time) => time,
                Err(_) => {
                    log::warn!(
                        "skipping vehicle journey '{label}' with unparseable departure time '{value}'"
                    );
                    continue;
                }
            },
            None => {
                log::warn!("skipping vehicle journey '{label}' with no departure time");
                continue;
            }
        };

        let operating_profile = match &raw_journey.operating_profile {
            Some(raw_profile) => match OperatingProfile::from_raw(raw_profile, organisations) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    log::warn!("skipping vehicle journey '{label}' with bad operating profile: {e}");
                    continue;
                }
            },
            None => None,
        };

        pending.push(PendingJourney {
            code,
            sequence_number: raw_journey.sequence_number,
            pattern_ref: raw_journey
                .journey_pattern_ref
                .as_ref()
                .map(|r| r.trim().to_string()),
            journey_ref: raw_journey
                .vehicle_journey_ref
                .as_ref()
                .map(|r| r.trim().to_string()),
            departure_time,
            operating_profile,
            start_deadrun: deadrun_link(&raw_journey.start_dead_run),
            end_deadrun: deadrun_link(&raw_journey.end_dead_run),
            notes: convert_notes(&raw_journey.notes),
        });
    }

    // patterns referenced indirectly resolve through the referenced
    // journey's own pattern reference
    let direct_refs: HashMap<String, String> = pending
        .iter()
        .filter_map(|journey| {
            match (&journey.code, &journey.pattern_ref) {
                (Some(code), Some(pattern_ref)) => Some((code.clone(), pattern_ref.clone())),
                _ => None,
            }
        })
        .collect();

    let mut journeys = Vec::with_capacity(pending.len());
    for journey in pending {
        let pattern_ref = match (&journey.pattern_ref, &journey.journey_ref) {
            (Some(pattern_ref), _) => pattern_ref.clone(),
            (None, Some(journey_ref)) => direct_refs
                .get(journey_ref)
                .cloned()
                .ok_or_else(|| TimetableError::DanglingReference(journey_ref.clone()))?,
            (None, None) => {
                let label = journey.code.as_deref().unwrap_or("?");
                log::warn!("skipping vehicle journey '{label}' with no journey pattern reference");
                continue;
            }
        };
        if !patterns.iter().any(|p| p.id == pattern_ref) {
            return Err(TimetableError::DanglingReference(pattern_ref));
        }
        journeys.push(VehicleJourney {
            code: journey.code,
            sequence_number: journey.sequence_number,
            pattern_ref,
            departure_time: journey.departure_time,
            operating_profile: journey.operating_profile,
            start_deadrun: journey.start_deadrun,
            end_deadrun: journey.end_deadrun,
            notes: journey.notes,
        });
    }
    Ok(journeys)
}

fn deadrun_link(deadrun: &Option<raw::RawDeadRun>) -> Option<String> {
    deadrun
        .as_ref()
        .and_then(|d| d.short_working.as_ref())
        .and_then(|s| s.journey_pattern_timing_link_ref.as_ref())
        .map(|r| r.trim().to_string())
}

fn convert_notes(notes: &[raw::RawNote]) -> BTreeMap<String, String> {
    let mut converted = BTreeMap::new();
    for note in notes {
        let Some(text) = &note.note_text else {
            continue;
        };
        let key = note.note_code.clone().unwrap_or_else(|| text.clone());
        converted.insert(key, text.clone());
    }
    converted
}

fn parse_datetime(value: Option<&str>) -> Option<NaiveDateTime> {
    let value = value?.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }
    None
}
