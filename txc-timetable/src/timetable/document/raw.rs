//! serde view of the TransXChange subset this crate consumes, deserialized
//! with quick-xml. element groups that may appear once or many times are
//! plain `Vec` fields (repeated elements accumulate); everything the schema
//! marks optional is an `Option`. the raw tree is discarded as soon as the
//! typed document graph has been built from it.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawTransXChange {
    #[serde(rename = "@CreationDateTime")]
    pub creation_date_time: Option<String>,
    #[serde(rename = "@ModificationDateTime")]
    pub modification_date_time: Option<String>,
    pub stop_points: Option<RawStopPoints>,
    pub serviced_organisations: Option<RawServicedOrganisations>,
    pub journey_pattern_sections: Option<RawJourneyPatternSections>,
    pub operators: Option<RawOperators>,
    pub services: Option<RawServices>,
    pub vehicle_journeys: Option<RawVehicleJourneys>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStopPoints {
    #[serde(rename = "AnnotatedStopPointRef", default)]
    pub stops: Vec<RawAnnotatedStopPointRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawAnnotatedStopPointRef {
    pub stop_point_ref: String,
    pub common_name: Option<String>,
    pub locality_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawServicedOrganisations {
    #[serde(rename = "ServicedOrganisation", default)]
    pub organisations: Vec<RawServicedOrganisation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawServicedOrganisation {
    pub organisation_code: Option<String>,
    pub name: Option<String>,
    pub working_days: Option<RawDateRanges>,
    pub holidays: Option<RawDateRanges>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDateRanges {
    #[serde(rename = "DateRange", default)]
    pub date_range: Vec<RawDateRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDateRange {
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawJourneyPatternSections {
    #[serde(rename = "JourneyPatternSection", default)]
    pub sections: Vec<RawJourneyPatternSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawJourneyPatternSection {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "JourneyPatternTimingLink", default)]
    pub timing_links: Vec<RawTimingLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawTimingLink {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    pub from: RawStopUsage,
    pub to: RawStopUsage,
    pub run_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStopUsage {
    #[serde(rename = "@SequenceNumber")]
    pub sequence_number: Option<u32>,
    pub stop_point_ref: String,
    pub timing_status: Option<String>,
    pub wait_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawOperators {
    #[serde(rename = "Operator", default)]
    pub operators: Vec<RawOperator>,
    #[serde(rename = "LicensedOperator", default)]
    pub licensed_operators: Vec<RawOperator>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawOperator {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    pub national_operator_code: Option<String>,
    pub operator_code: Option<String>,
    pub operator_short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawServices {
    #[serde(rename = "Service", default)]
    pub services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawService {
    pub service_code: Option<String>,
    pub lines: Option<RawLines>,
    pub operating_period: Option<RawOperatingPeriod>,
    pub operating_profile: Option<RawOperatingProfile>,
    pub mode: Option<String>,
    pub description: Option<String>,
    pub registered_operator_ref: Option<String>,
    pub standard_service: Option<RawStandardService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLines {
    #[serde(rename = "Line", default)]
    pub lines: Vec<RawLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawLine {
    pub line_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawOperatingPeriod {
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStandardService {
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[serde(rename = "JourneyPattern", default)]
    pub journey_patterns: Vec<RawJourneyPattern>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawJourneyPattern {
    #[serde(rename = "@id")]
    pub id: String,
    pub direction: Option<String>,
    #[serde(rename = "JourneyPatternSectionRefs", default)]
    pub section_refs: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawVehicleJourneys {
    #[serde(rename = "VehicleJourney", default)]
    pub journeys: Vec<RawVehicleJourney>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawVehicleJourney {
    #[serde(rename = "@SequenceNumber")]
    pub sequence_number: Option<u32>,
    pub operating_profile: Option<RawOperatingProfile>,
    pub vehicle_journey_code: Option<String>,
    pub journey_pattern_ref: Option<String>,
    pub vehicle_journey_ref: Option<String>,
    pub departure_time: Option<String>,
    pub start_dead_run: Option<RawDeadRun>,
    pub end_dead_run: Option<RawDeadRun>,
    #[serde(rename = "Note", default)]
    pub notes: Vec<RawNote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDeadRun {
    pub short_working: Option<RawShortWorking>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawShortWorking {
    pub journey_pattern_timing_link_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawNote {
    pub note_code: Option<String>,
    pub note_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawOperatingProfile {
    pub regular_day_type: Option<RawRegularDayType>,
    pub special_days_operation: Option<RawSpecialDaysOperation>,
    pub bank_holiday_operation: Option<RawBankHolidayOperation>,
    pub serviced_organisation_day_type: Option<RawServicedOrganisationDayType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRegularDayType {
    pub days_of_week: Option<RawDaysOfWeek>,
    pub holidays_only: Option<RawHolidaysOnly>,
}

/// empty marker element
#[derive(Debug, Deserialize)]
pub struct RawHolidaysOnly;

#[derive(Debug, Deserialize)]
pub struct RawDaysOfWeek {
    #[serde(rename = "$value", default)]
    pub days: Vec<RawDayOfWeek>,
}

/// the weekday choice group: single days plus the contracted spans the
/// schema allows as shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RawDayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    MondayToFriday,
    MondayToSaturday,
    MondayToSunday,
    Weekend,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawSpecialDaysOperation {
    pub days_of_operation: Option<RawDateRanges>,
    pub days_of_non_operation: Option<RawDateRanges>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawBankHolidayOperation {
    pub days_of_operation: Option<RawBankHolidayDays>,
    pub days_of_non_operation: Option<RawBankHolidayDays>,
}

#[derive(Debug, Deserialize)]
pub struct RawBankHolidayDays {
    #[serde(rename = "$value", default)]
    pub days: Vec<RawBankHolidayChoice>,
}

/// the bank-holiday choice group: named holidays, observed substitute
/// days, and the collective names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RawBankHolidayChoice {
    AllBankHolidays,
    AllHolidaysExceptChristmas,
    Christmas,
    ChristmasDay,
    ChristmasDayHoliday,
    ChristmasEve,
    BoxingDay,
    BoxingDayHoliday,
    NewYearsDay,
    NewYearsDayHoliday,
    NewYearsEve,
    Jan2ndScotland,
    Jan2ndScotlandHoliday,
    GoodFriday,
    EasterMonday,
    MayDay,
    SpringBank,
    AugustBankHolidayScotland,
    LateSummerBankHolidayNotScotland,
    StAndrewsDay,
    StAndrewsDayHoliday,
    HolidayMondays,
    DisplacementHolidays,
    EarlyRunOff,
}

impl RawBankHolidayChoice {
    pub fn name(&self) -> &'static str {
        match self {
            RawBankHolidayChoice::AllBankHolidays => "AllBankHolidays",
            RawBankHolidayChoice::AllHolidaysExceptChristmas => "AllHolidaysExceptChristmas",
            RawBankHolidayChoice::Christmas => "Christmas",
            RawBankHolidayChoice::ChristmasDay => "ChristmasDay",
            RawBankHolidayChoice::ChristmasDayHoliday => "ChristmasDayHoliday",
            RawBankHolidayChoice::ChristmasEve => "ChristmasEve",
            RawBankHolidayChoice::BoxingDay => "BoxingDay",
            RawBankHolidayChoice::BoxingDayHoliday => "BoxingDayHoliday",
            RawBankHolidayChoice::NewYearsDay => "NewYearsDay",
            RawBankHolidayChoice::NewYearsDayHoliday => "NewYearsDayHoliday",
            RawBankHolidayChoice::NewYearsEve => "NewYearsEve",
            RawBankHolidayChoice::Jan2ndScotland => "Jan2ndScotland",
            RawBankHolidayChoice::Jan2ndScotlandHoliday => "Jan2ndScotlandHoliday",
            RawBankHolidayChoice::GoodFriday => "GoodFriday",
            RawBankHolidayChoice::EasterMonday => "EasterMonday",
            RawBankHolidayChoice::MayDay => "MayDay",
            RawBankHolidayChoice::SpringBank => "SpringBank",
            RawBankHolidayChoice::AugustBankHolidayScotland => "AugustBankHolidayScotland",
            RawBankHolidayChoice::LateSummerBankHolidayNotScotland => {
                "LateSummerBankHolidayNotScotland"
            }
            RawBankHolidayChoice::StAndrewsDay => "StAndrewsDay",
            RawBankHolidayChoice::StAndrewsDayHoliday => "StAndrewsDayHoliday",
            RawBankHolidayChoice::HolidayMondays => "HolidayMondays",
            RawBankHolidayChoice::DisplacementHolidays => "DisplacementHolidays",
            RawBankHolidayChoice::EarlyRunOff => "EarlyRunOff",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawServicedOrganisationDayType {
    pub days_of_operation: Option<RawServicedOrganisationDays>,
    pub days_of_non_operation: Option<RawServicedOrganisationDays>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawServicedOrganisationDays {
    pub working_days: Option<RawOrganisationRefs>,
    pub holidays: Option<RawOrganisationRefs>,
}

#[derive(Debug, Deserialize)]
pub struct RawOrganisationRefs {
    #[serde(rename = "ServicedOrganisationRef", default)]
    pub refs: Vec<String>,
}
