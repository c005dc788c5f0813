use std::collections::HashMap;

use iced::widget::{button, column, container, text, Column, Image};
use iced::{Color, Element, Length};
use iced_aw::Wrap;

use super::PreviewState;
use apod_gallery::controller::{GalleryController, Phase};
use apod_gallery::state::data::{ImageRecord, MediaType};
use crate::Message;

const CARD_WIDTH: f32 = 400.0;
const GALLERY_ITEM_WIDTH: f32 = 260.0;

/// Loading indicator, inline error, or the grid of fetched images
pub fn results_section<'a>(
    controller: &'a GalleryController,
    previews: &'a HashMap<String, PreviewState>,
) -> Element<'a, Message> {
    match controller.phase() {
        Phase::Idle => column![].into(),
        Phase::Loading => text("Loading...").size(18).into(),
        Phase::Failed(err) => text(err.to_string())
            .color(Color::from_rgb(0.95, 0.4, 0.4))
            .into(),
        Phase::Shown => {
            let cards = controller
                .results()
                .iter()
                .map(|record| image_card(controller, record, previews))
                .collect();

            let mut section = Column::new().spacing(15);
            if let Some(heading) = controller.results_heading() {
                section = section.push(text(heading).size(22));
            }
            section
                .push(Wrap::with_elements(cards).spacing(16.0).line_spacing(16.0))
                .into()
        }
    }
}

fn image_card<'a>(
    controller: &GalleryController,
    record: &'a ImageRecord,
    previews: &'a HashMap<String, PreviewState>,
) -> Element<'a, Message> {
    let state = controller.save_state(record);
    let save = button(text(state.label()))
        .on_press_maybe(state.enabled().then(|| Message::Save(record.clone())))
        .padding(8);

    let mut content = column![
        text(&record.title).size(20),
        text(record.date.to_string()).size(14),
        media(record, previews, CARD_WIDTH - 20.0),
        text(&record.explanation).size(14),
    ]
    .spacing(10);

    if let Some(copyright) = &record.copyright {
        content = content.push(text(format!("© {}", copyright.trim())).size(12));
    }

    container(content.push(save))
        .width(Length::Fixed(CARD_WIDTH))
        .padding(10)
        .style(container::rounded_box)
        .into()
}

/// "Your Gallery": saved images with a remove action each
pub fn gallery_section<'a>(
    controller: &'a GalleryController,
    previews: &'a HashMap<String, PreviewState>,
) -> Element<'a, Message> {
    let heading = text("Your Gallery").size(24);

    if controller.saved().is_empty() {
        return column![
            heading,
            text("No images saved yet. Save some images to see them here!").size(14),
        ]
        .spacing(15)
        .into();
    }

    let items = controller
        .saved()
        .iter()
        .map(|saved| {
            let content = column![
                text(&saved.image.title).size(16),
                text(saved.image.date.to_string()).size(12),
                media(&saved.image, previews, GALLERY_ITEM_WIDTH - 20.0),
                button(text("Remove"))
                    .on_press(Message::Remove(saved.id.clone()))
                    .style(button::danger)
                    .padding(6),
            ]
            .spacing(8);

            container(content)
                .width(Length::Fixed(GALLERY_ITEM_WIDTH))
                .padding(10)
                .style(container::rounded_box)
                .into()
        })
        .collect();

    column![heading, Wrap::with_elements(items).spacing(16.0).line_spacing(16.0)]
        .spacing(15)
        .into()
}

/// Preview for images; videos and other media show their link
fn media<'a>(
    record: &'a ImageRecord,
    previews: &'a HashMap<String, PreviewState>,
    width: f32,
) -> Element<'a, Message> {
    match record.media_type {
        MediaType::Image => match previews.get(&record.url) {
            Some(PreviewState::Ready(handle)) => Image::new(handle.clone())
                .width(Length::Fixed(width))
                .into(),
            Some(PreviewState::Failed) => text("Preview unavailable").size(12).into(),
            Some(PreviewState::Loading) | None => text("Loading preview...").size(12).into(),
        },
        MediaType::Video => text(format!("Video: {}", record.url)).size(12).into(),
        MediaType::Other => text(format!("Media: {}", record.url)).size(12).into(),
    }
}
