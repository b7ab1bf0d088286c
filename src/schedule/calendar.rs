use chrono::{Days, NaiveDate};

use crate::config::EngineConfig;
use crate::error::{Result, RosterError};
use super::types::CalendarDay;

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// English name for a Sunday-first weekday index
pub fn weekday_name(weekday: u8) -> &'static str {
    WEEKDAY_NAMES.get(weekday as usize).copied().unwrap_or("?")
}

/// Parses an ISO-8601 calendar date (YYYY-MM-DD)
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RosterError::InvalidDate {
        value: value.to_string(),
    })
}

/// Formats a date for display, e.g. "07.01.2024 (Sunday)"
pub fn format_date_label(date: NaiveDate, weekday: u8) -> String {
    format!("{} ({})", date.format("%d.%m.%Y"), weekday_name(weekday))
}

/// Builds the calendar days of an inclusive date range
pub fn days_between(start: NaiveDate, end: NaiveDate, config: &EngineConfig) -> Result<Vec<CalendarDay>> {
    if end < start {
        return Err(RosterError::InvalidPeriod(format!(
            "end {} is before start {}",
            end, start
        )));
    }

    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(CalendarDay::new(current, config));
        current = match current.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(days)
}

/// Builds calendar days from an arbitrary selection of dates, sorted and de-duplicated
pub fn days_from_dates(dates: &[NaiveDate], config: &EngineConfig) -> Vec<CalendarDay> {
    let mut sorted: Vec<NaiveDate> = dates.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted
        .into_iter()
        .map(|d| CalendarDay::new(d, config))
        .collect()
}

/// Total weight of a set of days
pub fn total_weight(days: &[CalendarDay]) -> f64 {
    days.iter().map(|d| d.weight).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_week_carries_weight_table() {
        let config = EngineConfig::default();
        let days = days_between(date(2024, 1, 7), date(2024, 1, 13), &config).unwrap();
        assert_eq!(days.len(), 7);
        let weights: Vec<f64> = days.iter().map(|d| d.weight).collect();
        assert_eq!(weights, vec![1.5, 1.0, 1.0, 1.0, 0.75, 1.25, 2.0]);
        assert_eq!(total_weight(&days), 8.5);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let config = EngineConfig::default();
        assert!(matches!(
            days_between(date(2024, 1, 13), date(2024, 1, 7), &config),
            Err(RosterError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn selected_dates_are_sorted_and_unique() {
        let config = EngineConfig::default();
        let days = days_from_dates(
            &[date(2024, 1, 9), date(2024, 1, 7), date(2024, 1, 9)],
            &config,
        );
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(2024, 1, 7));
    }

    #[test]
    fn labels_and_parsing() {
        let config = EngineConfig::default();
        let day = CalendarDay::new(date(2024, 1, 7), &config);
        assert_eq!(format_date_label(day.date, day.weekday), "07.01.2024 (Sunday)");
        assert_eq!(parse_date(" 2024-01-07 ").unwrap(), date(2024, 1, 7));
        assert!(parse_date("07/01/2024").is_err());
    }
}
