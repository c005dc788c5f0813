/// APOD access module
///
/// This module handles:
/// - Validating user-entered dates against the archive (validate.rs)
/// - Fetching entries from the remote API (client.rs)

pub mod client;
pub mod validate;

pub use client::{ApodClient, HttpTransport};
