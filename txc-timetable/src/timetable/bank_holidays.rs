use std::collections::HashMap;

use chrono::NaiveDate;

/// wildcard name matching every bank holiday in an operating profile's
/// bank-holiday operation or non-operation list.
pub const ALL_BANK_HOLIDAYS: &str = "AllBankHolidays";

/// England and Wales bank holidays over the operating horizon, keyed by
/// the element names TransXChange documents use for them. dates outside
/// this table are simply not bank holidays.
const ENGLAND_AND_WALES: &[(i32, u32, u32, &str)] = &[
    (2021, 1, 1, "NewYearsDay"),
    (2021, 4, 2, "GoodFriday"),
    (2021, 4, 5, "EasterMonday"),
    (2021, 5, 3, "MayDay"),
    (2021, 5, 31, "SpringBank"),
    (2021, 8, 30, "LateSummerBankHolidayNotScotland"),
    (2021, 12, 24, "ChristmasEve"),
    (2021, 12, 25, "ChristmasDay"),
    (2021, 12, 26, "BoxingDay"),
    (2021, 12, 27, "ChristmasDayHoliday"),
    (2021, 12, 28, "BoxingDayHoliday"),
    (2021, 12, 31, "NewYearsEve"),
    (2022, 1, 1, "NewYearsDay"),
    (2022, 1, 3, "NewYearsDayHoliday"),
    (2022, 4, 15, "GoodFriday"),
    (2022, 4, 18, "EasterMonday"),
    (2022, 5, 2, "MayDay"),
    (2022, 6, 2, "SpringBank"),
    (2022, 8, 29, "LateSummerBankHolidayNotScotland"),
    (2022, 12, 24, "ChristmasEve"),
    (2022, 12, 25, "ChristmasDay"),
    (2022, 12, 26, "BoxingDay"),
    (2022, 12, 27, "ChristmasDayHoliday"),
    (2022, 12, 31, "NewYearsEve"),
    (2023, 1, 1, "NewYearsDay"),
    (2023, 1, 2, "NewYearsDayHoliday"),
    (2023, 4, 7, "GoodFriday"),
    (2023, 4, 10, "EasterMonday"),
    (2023, 5, 1, "MayDay"),
    (2023, 5, 29, "SpringBank"),
    (2023, 8, 28, "LateSummerBankHolidayNotScotland"),
    (2023, 12, 24, "ChristmasEve"),
    (2023, 12, 25, "ChristmasDay"),
    (2023, 12, 26, "BoxingDay"),
    (2023, 12, 31, "NewYearsEve"),
    (2024, 1, 1, "NewYearsDay"),
    (2024, 3, 29, "GoodFriday"),
    (2024, 4, 1, "EasterMonday"),
    (2024, 5, 6, "MayDay"),
    (2024, 5, 27, "SpringBank"),
    (2024, 8, 26, "LateSummerBankHolidayNotScotland"),
    (2024, 12, 24, "ChristmasEve"),
    (2024, 12, 25, "ChristmasDay"),
    (2024, 12, 26, "BoxingDay"),
    (2024, 12, 31, "NewYearsEve"),
    (2025, 1, 1, "NewYearsDay"),
    (2025, 4, 18, "GoodFriday"),
    (2025, 4, 21, "EasterMonday"),
    (2025, 5, 5, "MayDay"),
    (2025, 5, 26, "SpringBank"),
    (2025, 8, 25, "LateSummerBankHolidayNotScotland"),
    (2025, 12, 24, "ChristmasEve"),
    (2025, 12, 25, "ChristmasDay"),
    (2025, 12, 26, "BoxingDay"),
    (2025, 12, 31, "NewYearsEve"),
    (2026, 1, 1, "NewYearsDay"),
    (2026, 4, 3, "GoodFriday"),
    (2026, 4, 6, "EasterMonday"),
    (2026, 5, 4, "MayDay"),
    (2026, 5, 25, "SpringBank"),
    (2026, 8, 31, "LateSummerBankHolidayNotScotland"),
    (2026, 12, 24, "ChristmasEve"),
    (2026, 12, 25, "ChristmasDay"),
    (2026, 12, 26, "BoxingDay"),
    (2026, 12, 28, "BoxingDayHoliday"),
    (2026, 12, 31, "NewYearsEve"),
    (2027, 1, 1, "NewYearsDay"),
    (2027, 3, 26, "GoodFriday"),
    (2027, 3, 29, "EasterMonday"),
    (2027, 5, 3, "MayDay"),
    (2027, 5, 31, "SpringBank"),
    (2027, 8, 30, "LateSummerBankHolidayNotScotland"),
    (2027, 12, 24, "ChristmasEve"),
    (2027, 12, 25, "ChristmasDay"),
    (2027, 12, 26, "BoxingDay"),
    (2027, 12, 27, "ChristmasDayHoliday"),
    (2027, 12, 28, "BoxingDayHoliday"),
    (2027, 12, 31, "NewYearsEve"),
];

/// static bank-holiday reference data: which named holidays, if any, fall
/// on a given calendar date.
#[derive(Debug, Clone)]
pub struct BankHolidayCalendar {
    dates: HashMap<NaiveDate, Vec<&'static str>>,
}

impl BankHolidayCalendar {
    /// the England and Wales holiday table bus operators schedule against.
    pub fn england_and_wales() -> Self {
        let mut dates: HashMap<NaiveDate, Vec<&'static str>> = HashMap::new();
        for (year, month, day, name) in ENGLAND_AND_WALES {
            if let Some(date) = NaiveDate::from_ymd_opt(*year, *month, *day) {
                dates.entry(date).or_default().push(name);
            }
        }
        BankHolidayCalendar { dates }
    }

    /// holiday names observed on `date`, empty for ordinary days.
    pub fn names(&self, date: NaiveDate) -> &[&'static str] {
        self.dates.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains_key(&date)
    }
}

impl Default for BankHolidayCalendar {
    fn default() -> Self {
        Self::england_and_wales()
    }
}

#[cfg(test)]
mod test {
    use super::BankHolidayCalendar;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_christmas_day_is_named() {
        let calendar = BankHolidayCalendar::england_and_wales();
        assert!(calendar
            .names(date(2025, 12, 25))
            .contains(&"ChristmasDay"));
    }

    #[test]
    fn test_ordinary_days_are_not_holidays() {
        let calendar = BankHolidayCalendar::england_and_wales();
        assert!(calendar.names(date(2025, 3, 12)).is_empty());
        assert!(!calendar.is_holiday(date(2025, 3, 12)));
    }

    #[test]
    fn test_substitute_days_are_distinct_names() {
        let calendar = BankHolidayCalendar::england_and_wales();
        // 2022: Christmas Day fell on a Sunday, observed the Tuesday after
        assert!(calendar
            .names(date(2022, 12, 27))
            .contains(&"ChristmasDayHoliday"));
    }
}
