/// User interface module
///
/// Pure rendering of controller state; every user action is turned
/// into a `Message` for the application's `update`.
/// - Date selection form (form.rs)
/// - Result cards and the saved gallery (cards.rs)
use iced::widget::image::Handle;

pub mod cards;
pub mod form;

/// Display state of one media preview, keyed by URL
#[derive(Debug, Clone)]
pub enum PreviewState {
    Loading,
    Ready(Handle),
    Failed,
}
