use iced::widget::{button, column, row, text, text_input, Column};
use iced::{Alignment, Element, Length};

use apod_gallery::apod::validate::EARLIEST_DATE;
use apod_gallery::controller::GalleryController;
use apod_gallery::state::data::QueryMode;
use crate::Message;

/// Mode toggle, date inputs and submit/reset buttons
pub fn date_form(controller: &GalleryController) -> Element<'_, Message> {
    let selection = controller.selection();
    let is_range = selection.mode == QueryMode::Range;

    let toggle = row![
        mode_button("Single Date", QueryMode::Single, !is_range),
        mode_button("Date Range", QueryMode::Range, is_range),
    ]
    .spacing(10);

    let inputs: Element<'_, Message> = if is_range {
        row![
            date_input("Start Date:", &selection.start_date, Message::StartDateChanged),
            date_input("End Date:", &selection.end_date, Message::EndDateChanged),
        ]
        .spacing(20)
        .into()
    } else {
        date_input("Date:", &selection.start_date, Message::StartDateChanged)
    };

    let actions = row![
        button(text(if is_range { "View Images" } else { "View Image" }))
            .on_press(Message::Submit)
            .padding(10),
        button(text("Reset"))
            .on_press(Message::Reset)
            .style(button::secondary)
            .padding(10),
    ]
    .spacing(10);

    let hint = text(format!(
        "Dates from {} to {}; ranges up to one month",
        EARLIEST_DATE,
        controller.today()
    ))
    .size(12);

    let content: Column<'_, Message> = column![
        text("Select Dates").size(24),
        toggle,
        inputs,
        actions,
        hint,
    ]
    .spacing(15)
    .align_x(Alignment::Center);

    content.width(Length::Fill).into()
}

fn mode_button(label: &str, mode: QueryMode, active: bool) -> Element<'_, Message> {
    button(text(label))
        .on_press(Message::ModeSelected(mode))
        .style(if active { button::primary } else { button::secondary })
        .padding(8)
        .into()
}

fn date_input<'a>(
    label: &'a str,
    value: &'a str,
    on_input: fn(String) -> Message,
) -> Element<'a, Message> {
    column![
        text(label).size(14),
        text_input("YYYY-MM-DD", value)
            .on_input(on_input)
            .on_submit(Message::Submit)
            .width(Length::Fixed(160.0)),
    ]
    .spacing(5)
    .into()
}
