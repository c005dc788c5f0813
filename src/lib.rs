//! APOD gallery: browse NASA's Astronomy Picture of the Day by date or
//! date range and keep favourites in a saved gallery.
//!
//! - `apod` - date validation and the remote API client
//! - `state` - data model and saved-gallery persistence
//! - `controller` - query/gallery state machine driven by the UI
//! - `media` - preview download and downsizing

pub mod apod;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod media;
pub mod state;

#[cfg(test)]
mod testing;
