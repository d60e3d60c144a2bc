//! Service-day arithmetic for trip start references.
//!
//! GTFS start times are measured from the start of the service day and may
//! exceed 24:00:00 for trips running past midnight (25:30:00 is 1:30am on the
//! following calendar day).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::models::types::{Result, TransitError};

/// Start of a trip: a service day plus seconds since that day began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TripStart {
    pub service_date: NaiveDate,
    pub offset_seconds: u32,
}

impl TripStart {
    /// Parse a `YYYYMMDD` service date and an `HH:MM:SS` start time.
    pub fn parse(start_date: &str, start_time: &str) -> Result<Self> {
        Ok(Self {
            service_date: parse_service_date(start_date)?,
            offset_seconds: parse_service_time(start_time)?,
        })
    }

    /// Wall-clock timestamp of the start, rolled over past midnight if needed.
    pub fn timestamp(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.service_date, NaiveTime::MIN)
            + TimeDelta::seconds(i64::from(self.offset_seconds))
    }
}

pub fn parse_service_date(s: &str) -> Result<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TransitError::InvalidStartDate(s.to_owned()));
    }

    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| TransitError::InvalidStartDate(s.to_owned()))
}

/// Seconds since the start of the service day.
pub fn parse_service_time(s: &str) -> Result<u32> {
    let invalid = || TransitError::InvalidStartTime(s.to_owned());

    let mut parts = s.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let field = |part: &str, max_len: usize| -> Result<u32> {
        if part.is_empty() || part.len() > max_len || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        part.parse().map_err(|_| invalid())
    };

    let hours = field(h, 3)?;
    let minutes = field(m, 2)?;
    let seconds = field(sec, 2)?;
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}
