/// Gallery controller
///
/// Owns the query form, the fetched results and a snapshot of the saved
/// gallery, and moves between `Idle -> Loading -> Shown | Failed`.
///
/// Async work is split into `begin_*` (synchronous state change, returns
/// what to run) and `finish_*` (applies the outcome) so the UI event loop
/// can run the I/O as a background task. The `submit`/`save`/... methods
/// chain the two halves for callers that can simply await.
use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use crate::apod::validate::{parse_date, validate_date, validate_range};
use crate::apod::ApodClient;
use crate::error::{FetchError, GalleryError, StoreError, ValidationError};
use crate::state::data::{ApodQuery, ImageRecord, QueryMode, QuerySelection, SavedImageRecord};
use crate::state::gallery::GalleryStore;

/// Where the controller is in the query lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Shown,
    Failed(GalleryError),
}

/// Identifies one gallery reload; only the latest snapshot is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadToken(u64);

/// Identifies one submission; only the latest one may update results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// A submission that passed validation and now needs fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: RequestToken,
    pub query: ApodQuery,
}

/// Save-button state for one displayed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Available,
    Saving,
    Saved,
}

impl SaveState {
    pub fn label(self) -> &'static str {
        match self {
            SaveState::Available => "Save to Gallery",
            SaveState::Saving => "Saving…",
            SaveState::Saved => "Saved to Gallery",
        }
    }

    pub fn enabled(self) -> bool {
        self == SaveState::Available
    }
}

pub struct GalleryController {
    api: ApodClient,
    store: GalleryStore,
    selection: QuerySelection,
    phase: Phase,
    results: Vec<ImageRecord>,
    /// Query that produced `results`
    shown_query: Option<ApodQuery>,
    saved: Vec<SavedImageRecord>,
    /// Dates with a save in flight
    saving: HashSet<NaiveDate>,
    /// Dates stored but not yet seen in a reloaded snapshot
    awaiting_reload: HashSet<NaiveDate>,
    /// Transient store-failure message
    notice: Option<String>,
    latest_token: u64,
    latest_reload: u64,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl GalleryController {
    pub fn new(api: ApodClient, store: GalleryStore) -> Self {
        Self {
            api,
            store,
            selection: QuerySelection::default(),
            phase: Phase::Idle,
            results: Vec::new(),
            shown_query: None,
            saved: Vec::new(),
            saving: HashSet::new(),
            awaiting_reload: HashSet::new(),
            notice: None,
            latest_token: 0,
            latest_reload: 0,
            today: local_today,
        }
    }

    /// Replace the source of "today" (archive upper bound)
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn api(&self) -> &ApodClient {
        &self.api
    }

    pub fn store(&self) -> &GalleryStore {
        &self.store
    }

    pub fn selection(&self) -> &QuerySelection {
        &self.selection
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn results(&self) -> &[ImageRecord] {
        &self.results
    }

    pub fn saved(&self) -> &[SavedImageRecord] {
        &self.saved
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn error(&self) -> Option<&GalleryError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    // ========== Form ==========

    /// Switch between single-date and range mode
    ///
    /// The end date has no meaning in single mode and is cleared.
    pub fn set_mode(&mut self, mode: QueryMode) {
        self.selection.mode = mode;
        if mode == QueryMode::Single {
            self.selection.end_date.clear();
        }
    }

    pub fn set_start_date(&mut self, value: String) {
        self.selection.start_date = value;
    }

    pub fn set_end_date(&mut self, value: String) {
        self.selection.end_date = value;
    }

    /// Back to `Idle`: clears results, error and date fields
    ///
    /// Any fetch still in flight is orphaned.
    pub fn reset(&mut self) {
        self.latest_token += 1;
        self.phase = Phase::Idle;
        self.results.clear();
        self.shown_query = None;
        self.selection.start_date.clear();
        self.selection.end_date.clear();
        self.selection.submitted = false;
    }

    // ========== Query ==========

    fn parse_selection(&self) -> Result<ApodQuery, ValidationError> {
        let today = self.today();
        let start = parse_date(&self.selection.start_date)?;

        match self.selection.mode {
            QueryMode::Single => {
                validate_date(start, today)?;
                Ok(ApodQuery::Single(start))
            }
            QueryMode::Range => {
                let end = parse_date(&self.selection.end_date)?;
                validate_range(start, end, today)?;
                Ok(ApodQuery::Range { start, end })
            }
        }
    }

    /// Validate the form and move to `Loading`
    ///
    /// Returns the ticket to fetch, or `None` when validation failed (the
    /// controller is then `Failed` with empty results).
    pub fn begin_submit(&mut self) -> Option<FetchTicket> {
        match self.parse_selection() {
            Ok(query) => {
                self.latest_token += 1;
                self.phase = Phase::Loading;
                self.results.clear();
                self.shown_query = Some(query);
                self.selection.submitted = true;

                let token = RequestToken(self.latest_token);
                info!("🔭 Fetching {:?} ({:?})", query, token);
                Some(FetchTicket { token, query })
            }
            Err(err) => {
                info!("Rejected query: {}", err);
                self.phase = Phase::Failed(err.into());
                self.results.clear();
                self.shown_query = None;
                self.selection.submitted = false;
                None
            }
        }
    }

    /// Apply a fetch outcome; returns false when the response was stale
    pub fn finish_submit(
        &mut self,
        token: RequestToken,
        outcome: Result<Vec<ImageRecord>, FetchError>,
    ) -> bool {
        if token != RequestToken(self.latest_token) || self.phase != Phase::Loading {
            debug!("Discarding stale response for {:?}", token);
            return false;
        }

        match outcome {
            Ok(records) => {
                info!("✅ Showing {} image(s)", records.len());
                self.results = records;
                self.phase = Phase::Shown;
            }
            Err(err) => {
                error!("APOD fetch failed: {}", err);
                self.results.clear();
                self.phase = Phase::Failed(err.into());
            }
        }
        true
    }

    /// Validate, fetch and show in one go
    pub async fn submit(&mut self) {
        if let Some(ticket) = self.begin_submit() {
            let outcome = self.api.fetch(&ticket.query).await;
            self.finish_submit(ticket.token, outcome);
        }
    }

    /// Heading for the results grid, from the query that produced them
    pub fn results_heading(&self) -> Option<String> {
        if self.phase != Phase::Shown || self.results.is_empty() {
            return None;
        }
        match self.shown_query? {
            ApodQuery::Single(date) => Some(format!("Showing image for {}", date)),
            ApodQuery::Range { start, end } => Some(format!(
                "Showing {} images from {} to {}",
                self.results.len(),
                start,
                end
            )),
        }
    }

    // ========== Gallery ==========

    /// Is an image for `date` already in the saved gallery?
    pub fn is_saved(&self, date: NaiveDate) -> bool {
        self.saved.iter().any(|s| s.image.date == date)
    }

    pub fn save_state(&self, record: &ImageRecord) -> SaveState {
        if self.is_saved(record.date) || self.awaiting_reload.contains(&record.date) {
            SaveState::Saved
        } else if self.saving.contains(&record.date) {
            SaveState::Saving
        } else {
            SaveState::Available
        }
    }

    /// Claim a save for `record`; `None` if that date is saved or saving
    pub fn begin_save(&mut self, record: &ImageRecord) -> Option<ImageRecord> {
        if !self.save_state(record).enabled() {
            debug!("Ignoring save for {}: already in gallery", record.date);
            return None;
        }
        self.saving.insert(record.date);
        Some(record.clone())
    }

    /// Apply a save outcome; returns true when the gallery should reload
    pub fn finish_save(
        &mut self,
        date: NaiveDate,
        outcome: Result<SavedImageRecord, StoreError>,
    ) -> bool {
        self.saving.remove(&date);
        match outcome {
            Ok(_) => {
                // Stays claimed until the reload that follows shows it
                self.awaiting_reload.insert(date);
                true
            }
            Err(err) => {
                error!("Error saving image {}: {}", date, err);
                self.notice = Some(format!("Failed to save image: {}", err));
                false
            }
        }
    }

    /// Apply a remove outcome; returns true when the gallery should reload
    pub fn finish_remove(&mut self, id: &str, outcome: Result<(), StoreError>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(StoreError::NotFound(_)) => {
                warn!("⚠️  Saved image {} was already gone", id);
                true
            }
            Err(err) => {
                error!("Error removing image {}: {}", id, err);
                self.notice = Some(format!("Failed to remove image: {}", err));
                false
            }
        }
    }

    /// Start a gallery reload; any earlier reload still in flight is superseded
    pub fn begin_reload(&mut self) -> ReloadToken {
        self.latest_reload += 1;
        ReloadToken(self.latest_reload)
    }

    /// Replace the saved-gallery snapshot; returns false for a superseded reload
    pub fn finish_reload(
        &mut self,
        token: ReloadToken,
        outcome: Result<Vec<SavedImageRecord>, StoreError>,
    ) -> bool {
        if token != ReloadToken(self.latest_reload) {
            debug!("Discarding stale gallery snapshot {:?}", token);
            return false;
        }

        // The latest reload started after every completed save
        self.awaiting_reload.clear();
        match outcome {
            Ok(saved) => {
                debug!("Gallery holds {} image(s)", saved.len());
                self.saved = saved;
            }
            Err(err) => {
                error!("Error loading saved images: {}", err);
                self.notice = Some(format!("Failed to load gallery: {}", err));
            }
        }
        true
    }

    /// Media URLs of everything currently shown (results and saved gallery)
    pub fn media_urls(&self) -> HashSet<&str> {
        self.results
            .iter()
            .chain(self.saved.iter().map(|s| &s.image))
            .map(|record| record.url.as_str())
            .filter(|url| !url.is_empty())
            .collect()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub async fn reload_saved(&mut self) {
        let token = self.begin_reload();
        let outcome = self.store.list().await;
        self.finish_reload(token, outcome);
    }

    /// Save `record` unless its date is already in the gallery
    pub async fn save(&mut self, record: &ImageRecord) {
        let Some(record) = self.begin_save(record) else {
            return;
        };
        let outcome = self.store.add(&record).await;
        if self.finish_save(record.date, outcome) {
            self.reload_saved().await;
        }
    }

    pub async fn remove_saved(&mut self, id: &str) {
        let outcome = self.store.remove(id).await;
        if self.finish_remove(id, outcome) {
            self.reload_saved().await;
        }
    }
}

impl std::fmt::Debug for GalleryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryController")
            .field("phase", &self.phase)
            .field("results", &self.results.len())
            .field("saved", &self.saved.len())
            .finish()
    }
}
