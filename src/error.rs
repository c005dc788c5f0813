/// Error taxonomy for the gallery
///
/// Every error is `Clone` so it can travel inside UI messages and be kept
/// in controller state for display.
///
/// - `ValidationError` - bad date input, user-correctable, shown inline
/// - `FetchError` - APOD request failed, shown inline
/// - `StoreError` - save/remove/list failed, shown as a transient notice
use chrono::NaiveDate;
use thiserror::Error;

/// A date or date range the user entered cannot be queried
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please enter a date")]
    MissingDate,

    #[error("'{0}' is not a valid date (expected YYYY-MM-DD)")]
    Malformed(String),

    #[error("{date} is outside the archive ({earliest} to {today})")]
    OutOfBounds {
        date: NaiveDate,
        earliest: NaiveDate,
        today: NaiveDate,
    },

    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("invalid range: {0}")]
    InvalidRange(&'static str),
}

/// The APOD API could not produce image records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("could not retrieve image data: {0}")]
    Transport(String),

    #[error("could not retrieve image data (HTTP {0})")]
    Status(u16),

    #[error("could not retrieve image data: {0}")]
    Decode(String),
}

/// The document store rejected or could not complete an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("gallery store unavailable: {0}")]
    Unavailable(String),

    #[error("no saved image with id {0}")]
    NotFound(String),

    #[error("gallery store error: {0}")]
    Backend(String),

    #[error("malformed gallery document: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Any error the controller can end up displaying
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
