//! Test doubles shared by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::apod::client::{ApodTransport, TransportResponse};
use crate::apod::ApodClient;
use crate::error::FetchError;
use crate::state::documents::SqliteDocumentStore;
use crate::state::gallery::GalleryStore;

enum Behavior {
    Serve,
    Status(u16),
    Offline,
}

/// Fake APOD endpoint that synthesizes one entry per requested day
pub struct FakeApod {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeApod {
    pub fn new() -> Self {
        Self::with(Behavior::Serve)
    }

    pub fn failing(status: u16) -> Self {
        Self::with(Behavior::Status(status))
    }

    pub fn offline() -> Self {
        Self::with(Behavior::Offline)
    }

    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn entry(date: NaiveDate) -> Value {
    json!({
        "date": date.to_string(),
        "title": format!("Sky on {date}"),
        "explanation": "Synthesized for tests.",
        "media_type": "image",
        "url": format!("https://apod.example/{date}.jpg"),
        "service_version": "v1"
    })
}

fn param(query: &[(&'static str, String)], name: &str) -> Option<NaiveDate> {
    query
        .iter()
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse().ok())
}

#[async_trait]
impl ApodTransport for FakeApod {
    async fn get(&self, query: Vec<(&'static str, String)>) -> Result<TransportResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            Behavior::Offline => return Err(FetchError::Transport("network unreachable".into())),
            Behavior::Status(status) => {
                return Ok(TransportResponse {
                    status,
                    body: r#"{"msg":"failure"}"#.into(),
                })
            }
            Behavior::Serve => {}
        }

        let body = if let Some(date) = param(&query, "date") {
            entry(date)
        } else {
            let start = param(&query, "start_date").expect("start_date");
            let end = param(&query, "end_date").expect("end_date");
            let days = (end - start).num_days();
            Value::Array((0..=days).map(|n| entry(start + Duration::days(n))).collect())
        };

        Ok(TransportResponse {
            status: 200,
            body: body.to_string(),
        })
    }
}

pub fn fake_client() -> (Arc<FakeApod>, ApodClient) {
    let fake = Arc::new(FakeApod::new());
    let client = ApodClient::new(fake.clone());
    (fake, client)
}

pub fn memory_store() -> GalleryStore {
    let documents = SqliteDocumentStore::open_in_memory().expect("in-memory sqlite");
    GalleryStore::new(Arc::new(documents))
}
