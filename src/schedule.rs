// Schedule lookup and validation.
//
// A schedule row is only trusted once both of its times parse and subuh
// comes strictly before maghrib. Anything else is "no schedule today".

use time::macros::format_description;
use time::{Date, Time};

use crate::model::ScheduleRecord;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("malformed date {0:?} (expected YYYY-MM-DD)")]
    MalformedDate(String),

    #[error("malformed {field} {value:?} (expected HH:MM or HH:MM:SS)")]
    MalformedTime { field: &'static str, value: String },

    #[error("subuh_time {subuh} must be earlier than maghrib_time {maghrib}")]
    InvalidRange { subuh: String, maghrib: String },
}

pub fn parse_date(s: &str) -> Result<Date, ScheduleError> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ScheduleError::MalformedDate(s.to_string()))
}

/// Accepts `HH:MM` (what the admin form sends) and `HH:MM:SS`.
pub fn parse_time_of_day(field: &'static str, s: &str) -> Result<Time, ScheduleError> {
    let t = s.trim();
    Time::parse(t, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(t, format_description!("[hour]:[minute]")))
        .map_err(|_| ScheduleError::MalformedTime {
            field,
            value: s.to_string(),
        })
}

/// Exact-date lookup. There is no "nearest day" fallback: a missing day is
/// shown to viewers as the plain reel.
pub fn resolve(today: Date, records: &[ScheduleRecord]) -> Option<&ScheduleRecord> {
    records
        .iter()
        .find(|r| parse_date(&r.date).map(|d| d == today).unwrap_or(false))
}

/// The two parsed boundaries of a usable schedule day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub subuh: Time,
    pub maghrib: Time,
}

impl ScheduleWindow {
    pub fn new(subuh: Time, maghrib: Time) -> Result<Self, ScheduleError> {
        if subuh >= maghrib {
            return Err(ScheduleError::InvalidRange {
                subuh: subuh.to_string(),
                maghrib: maghrib.to_string(),
            });
        }
        Ok(Self { subuh, maghrib })
    }

    pub fn from_record(record: &ScheduleRecord) -> Result<Self, ScheduleError> {
        let subuh = parse_time_of_day("subuh_time", &record.subuh_time)?;
        let maghrib = parse_time_of_day("maghrib_time", &record.maghrib_time)?;
        Self::new(subuh, maghrib).map_err(|_| ScheduleError::InvalidRange {
            subuh: record.subuh_time.clone(),
            maghrib: record.maghrib_time.clone(),
        })
    }
}

/// Checks run by the store before any schedule write.
pub fn validate_fields(
    date: &str,
    subuh_time: &str,
    maghrib_time: &str,
) -> Result<(), ScheduleError> {
    parse_date(date)?;
    let subuh = parse_time_of_day("subuh_time", subuh_time)?;
    let maghrib = parse_time_of_day("maghrib_time", maghrib_time)?;
    if subuh >= maghrib {
        return Err(ScheduleError::InvalidRange {
            subuh: subuh_time.to_string(),
            maghrib: maghrib_time.to_string(),
        });
    }
    Ok(())
}
