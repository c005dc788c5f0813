/// Date validation for APOD queries
///
/// The archive starts on 1995-06-16 and ends today. Range queries are
/// capped at one month so a single request stays small.
use chrono::NaiveDate;

use crate::error::ValidationError;

/// First day the APOD archive has an entry for
pub const EARLIEST_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1995, 6, 16) {
    Some(date) => date,
    None => panic!("invalid archive start date"),
};

/// Longest allowed distance between start and end, in whole days
pub const MAX_RANGE_DAYS: i64 = 31;

/// Parse a `YYYY-MM-DD` date as typed into the form
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingDate);
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ValidationError::Malformed(trimmed.to_string()))
}

/// Check that a single date lies within [EARLIEST_DATE, today]
pub fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if date < EARLIEST_DATE || date > today {
        return Err(ValidationError::OutOfBounds {
            date,
            earliest: EARLIEST_DATE,
            today,
        });
    }
    Ok(())
}

/// Validate a start/end pair for a range query
///
/// Both dates must be in the archive, the end may not precede the start,
/// and the two may be at most `MAX_RANGE_DAYS` apart.
pub fn validate_range(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    validate_date(start, today)?;
    validate_date(end, today)?;

    if end < start {
        return Err(ValidationError::EndBeforeStart { start, end });
    }

    if (end - start).num_days().abs() > MAX_RANGE_DAYS {
        return Err(ValidationError::InvalidRange("range exceeds one month"));
    }

    Ok(())
}
