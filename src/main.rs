use iced::widget::{button, column, container, row, scrollable, text, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

mod ui;

use apod_gallery::apod::{ApodClient, HttpTransport};
use apod_gallery::config::{self, AppConfig, StoreConfig};
use apod_gallery::controller::{GalleryController, ReloadToken, RequestToken};
use apod_gallery::error::{FetchError, StoreError};
use apod_gallery::logging;
use apod_gallery::media::preview::{fetch_preview, Preview, PreviewError};
use apod_gallery::state::data::{ImageRecord, MediaType, QueryMode, SavedImageRecord};
use apod_gallery::state::documents::{DocumentStore, SqliteDocumentStore};
use apod_gallery::state::firestore::FirestoreDocumentStore;
use apod_gallery::state::gallery::GalleryStore;
use chrono::NaiveDate;
use ui::PreviewState;

/// Main application state
struct ApodGallery {
    /// Query, results and saved-gallery state
    controller: GalleryController,
    /// Shared HTTP client for preview downloads
    http: Client,
    /// Media previews by URL
    previews: HashMap<String, PreviewState>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ModeSelected(QueryMode),
    StartDateChanged(String),
    EndDateChanged(String),
    Submit,
    Reset,
    /// Background APOD fetch finished
    Fetched(RequestToken, Result<Vec<ImageRecord>, FetchError>),
    Save(ImageRecord),
    Saved(NaiveDate, Result<SavedImageRecord, StoreError>),
    Remove(String),
    Removed(String, Result<(), StoreError>),
    GalleryLoaded(ReloadToken, Result<Vec<SavedImageRecord>, StoreError>),
    PreviewLoaded(String, Result<Preview, PreviewError>),
    DismissNotice,
}

impl ApodGallery {
    /// Create the application and start loading the saved gallery
    fn new(controller: GalleryController, http: Client) -> (Self, Task<Message>) {
        let mut app = ApodGallery {
            controller,
            http,
            previews: HashMap::new(),
        };
        let task = app.reload_gallery();
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ModeSelected(mode) => {
                self.controller.set_mode(mode);
                Task::none()
            }
            Message::StartDateChanged(value) => {
                self.controller.set_start_date(value);
                Task::none()
            }
            Message::EndDateChanged(value) => {
                self.controller.set_end_date(value);
                Task::none()
            }
            Message::Submit => {
                let ticket = self.controller.begin_submit();
                self.prune_previews();
                let Some(ticket) = ticket else {
                    return Task::none();
                };
                let api = self.controller.api().clone();
                Task::perform(
                    async move { api.fetch(&ticket.query).await },
                    move |outcome| Message::Fetched(ticket.token, outcome),
                )
            }
            Message::Fetched(token, outcome) => {
                if !self.controller.finish_submit(token, outcome) {
                    return Task::none();
                }
                self.prune_previews();
                let records: Vec<ImageRecord> = self.controller.results().to_vec();
                self.request_previews(records.iter())
            }
            Message::Reset => {
                self.controller.reset();
                self.prune_previews();
                Task::none()
            }
            Message::Save(record) => {
                let Some(record) = self.controller.begin_save(&record) else {
                    return Task::none();
                };
                let store = self.controller.store().clone();
                let date = record.date;
                Task::perform(
                    async move { store.add(&record).await },
                    move |outcome| Message::Saved(date, outcome),
                )
            }
            Message::Saved(date, outcome) => {
                if self.controller.finish_save(date, outcome) {
                    self.reload_gallery()
                } else {
                    Task::none()
                }
            }
            Message::Remove(id) => {
                let store = self.controller.store().clone();
                Task::perform(
                    async move {
                        let outcome = store.remove(&id).await;
                        (id, outcome)
                    },
                    |(id, outcome)| Message::Removed(id, outcome),
                )
            }
            Message::Removed(id, outcome) => {
                if self.controller.finish_remove(&id, outcome) {
                    self.reload_gallery()
                } else {
                    Task::none()
                }
            }
            Message::GalleryLoaded(token, outcome) => {
                if !self.controller.finish_reload(token, outcome) {
                    return Task::none();
                }
                self.prune_previews();
                let images: Vec<ImageRecord> = self
                    .controller
                    .saved()
                    .iter()
                    .map(|s| s.image.clone())
                    .collect();
                self.request_previews(images.iter())
            }
            Message::PreviewLoaded(url, outcome) => {
                let state = match outcome {
                    Ok(preview) => PreviewState::Ready(iced::widget::image::Handle::from_rgba(
                        preview.width,
                        preview.height,
                        preview.pixels,
                    )),
                    Err(e) => {
                        warn!("⚠️  No preview for {}: {}", url, e);
                        PreviewState::Failed
                    }
                };
                // Pruned while loading: no longer shown
                if let Some(slot) = self.previews.get_mut(&url) {
                    *slot = state;
                }
                Task::none()
            }
            Message::DismissNotice => {
                self.controller.dismiss_notice();
                Task::none()
            }
        }
    }

    /// Full reload of the saved gallery from the store
    fn reload_gallery(&mut self) -> Task<Message> {
        let token = self.controller.begin_reload();
        let store = self.controller.store().clone();
        Task::perform(async move { store.list().await }, move |outcome| {
            Message::GalleryLoaded(token, outcome)
        })
    }

    /// Drop previews for images no longer on screen
    fn prune_previews(&mut self) {
        let shown = self.controller.media_urls();
        let before = self.previews.len();
        self.previews.retain(|url, _| shown.contains(url.as_str()));
        if self.previews.len() < before {
            debug!("Dropped {} unused preview(s)", before - self.previews.len());
        }
    }

    /// Start downloading previews for images we haven't seen yet
    fn request_previews<'a>(&mut self, records: impl Iterator<Item = &'a ImageRecord>) -> Task<Message> {
        let mut tasks = Vec::new();

        for record in records {
            if record.media_type != MediaType::Image
                || record.url.is_empty()
                || self.previews.contains_key(&record.url)
            {
                continue;
            }

            let url = record.url.clone();
            self.previews.insert(url.clone(), PreviewState::Loading);
            tasks.push(Task::perform(
                fetch_preview(self.http.clone(), url.clone()),
                move |outcome| Message::PreviewLoaded(url.clone(), outcome),
            ));
        }

        Task::batch(tasks)
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let notice = self.controller.notice().map(|notice| {
            row![
                text(notice).size(14),
                button(text("Dismiss"))
                    .on_press(Message::DismissNotice)
                    .style(button::secondary)
                    .padding(4),
            ]
            .spacing(10)
            .align_y(Alignment::Center)
        });

        let content: Column<Message> = column![
            text("NASA Astronomy Picture of the Day").size(36),
        ]
        .push_maybe(notice)
        .push(ui::form::date_form(&self.controller))
        .push(ui::cards::results_section(&self.controller, &self.previews))
        .push(ui::cards::gallery_section(&self.controller, &self.previews))
        .push(text("Created with NASA's APOD API 💫").size(12))
        .spacing(30)
        .padding(40)
        .align_x(Alignment::Center);

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Connect the configured document store
fn open_store(config: &StoreConfig, http: &Client) -> Result<Arc<dyn DocumentStore>, StoreError> {
    Ok(match config {
        StoreConfig::Sqlite { path } => Arc::new(SqliteDocumentStore::open(path)?),
        StoreConfig::Firestore {
            project_id,
            api_key,
        } => Arc::new(FirestoreDocumentStore::new(http.clone(), project_id, api_key.clone())),
    })
}

/// Log a startup failure and exit; the app cannot run without its store
fn fatal(message: impl std::fmt::Display) -> ! {
    error!("❌ {}", message);
    std::process::exit(1)
}

fn main() -> iced::Result {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(config::DEFAULT_LOG_FILTER);
            fatal(e)
        }
    };
    logging::init_logging(&config.log_filter);
    info!("🎨 APOD Gallery starting with {:?}", config);

    let http = match Client::builder()
        .user_agent(concat!("apod-gallery/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => fatal(format!("failed to create HTTP client: {}", e)),
    };

    let documents = match open_store(&config.store, &http) {
        Ok(documents) => documents,
        Err(e) => fatal(format!("failed to open gallery store: {}", e)),
    };

    let transport = HttpTransport::new(http.clone(), config.apod_endpoint, config.apod_api_key);
    let controller = GalleryController::new(
        ApodClient::new(Arc::new(transport)),
        GalleryStore::new(documents),
    );

    iced::application("APOD Gallery", ApodGallery::update, ApodGallery::view)
        .theme(ApodGallery::theme)
        .centered()
        .run_with(move || ApodGallery::new(controller, http))
}
