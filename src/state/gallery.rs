use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::data::{ImageRecord, SavedImageRecord};
use super::documents::{DocumentStore, StoredDocument};
use crate::error::StoreError;

/// Collection holding the user's saved images
pub const SAVED_IMAGES: &str = "savedImages";

/// The GalleryStore persists saved images in a document collection.
///
/// The backend is constructed at startup and passed in, so tests can use
/// an in-memory store. Duplicates are not checked here; the controller
/// guards saves by date.
#[derive(Clone)]
pub struct GalleryStore {
    documents: Arc<dyn DocumentStore>,
    collection: String,
}

impl GalleryStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self::with_collection(documents, SAVED_IMAGES)
    }

    pub fn with_collection(documents: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            documents,
            collection: collection.into(),
        }
    }

    /// Every saved image, in store order
    ///
    /// Documents that don't decode are skipped.
    pub async fn list(&self) -> Result<Vec<SavedImageRecord>, StoreError> {
        let documents = self.documents.list(&self.collection).await?;

        Ok(documents
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match decode(doc) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("⚠️  Skipping saved image {}: {}", id, e);
                        None
                    }
                }
            })
            .collect())
    }

    /// Save an image, stamping `saved_at` with the current time
    pub async fn add(&self, image: &ImageRecord) -> Result<SavedImageRecord, StoreError> {
        let mut record = SavedImageRecord {
            id: String::new(),
            image: image.clone(),
            saved_at: Utc::now(),
        };

        let fields = match serde_json::to_value(&record)? {
            Value::Object(fields) => fields,
            other => return Err(StoreError::Corrupt(format!("not a document: {}", other))),
        };

        record.id = self.documents.insert(&self.collection, fields).await?;
        info!("⭐ Saved {} ({}) as {}", record.image.date, record.image.title, record.id);

        Ok(record)
    }

    /// Delete a saved image by id
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.documents.delete(&self.collection, id).await?;
        info!("🗑️  Removed saved image {}", id);
        Ok(())
    }
}

fn decode(doc: StoredDocument) -> Result<SavedImageRecord, StoreError> {
    let mut record: SavedImageRecord = serde_json::from_value(Value::Object(doc.fields))?;
    record.id = doc.id;
    Ok(record)
}

impl std::fmt::Debug for GalleryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryStore")
            .field("collection", &self.collection)
            .finish()
    }
}
