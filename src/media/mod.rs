/// Media module
///
/// Downloads and downsizes APOD images for display (preview.rs).

pub mod preview;
