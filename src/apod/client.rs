/// APOD API client
///
/// Wraps the remote date-indexed endpoint:
/// - `?date=D` returns one JSON object
/// - `?start_date=A&end_date=B` returns a JSON array, ascending by date
///
/// The HTTP work sits behind `ApodTransport` so the client can be driven
/// by a fake in tests. No retries: a failed attempt surfaces immediately.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info};

use crate::error::FetchError;
use crate::state::data::{ApodQuery, ImageRecord};

/// Public APOD endpoint
pub const APOD_ENDPOINT: &str = "https://api.nasa.gov/planetary/apod";

/// Raw response handed back by a transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one GET against the APOD endpoint
#[async_trait]
pub trait ApodTransport: Send + Sync {
    async fn get(&self, query: Vec<(&'static str, String)>) -> Result<TransportResponse, FetchError>;
}

/// `reqwest`-backed transport that appends the API key to every request
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        info!("🔭 APOD client using {}", endpoint);
        Self {
            client,
            endpoint,
            api_key: api_key.into(),
        }
    }

    fn request(&self, mut query: Vec<(&'static str, String)>) -> RequestBuilder {
        query.push(("api_key", self.api_key.clone()));
        self.client.get(&self.endpoint).query(&query)
    }
}

#[async_trait]
impl ApodTransport for HttpTransport {
    async fn get(&self, query: Vec<(&'static str, String)>) -> Result<TransportResponse, FetchError> {
        let response = self
            .request(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

// Keep the API key out of logs
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Stateless APOD client; cheap to clone into background tasks
#[derive(Clone)]
pub struct ApodClient {
    transport: Arc<dyn ApodTransport>,
}

impl ApodClient {
    pub fn new(transport: Arc<dyn ApodTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the entry for one date
    pub async fn fetch_single(&self, date: NaiveDate) -> Result<ImageRecord, FetchError> {
        let response = self.transport.get(vec![("date", date.to_string())]).await?;
        let record: ImageRecord = decode(response)?;
        debug!("Fetched APOD for {}: {}", record.date, record.title);
        Ok(record)
    }

    /// Fetch every entry between `start` and `end`, most recent first
    ///
    /// Dates are assumed to be validated by the caller.
    pub async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ImageRecord>, FetchError> {
        let response = self
            .transport
            .get(vec![
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ])
            .await?;

        let mut records: Vec<ImageRecord> = decode(response)?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records.dedup_by_key(|r| r.date);

        debug!("Fetched {} APOD entries for {}..{}", records.len(), start, end);
        Ok(records)
    }

    /// Run a validated query; a single date yields a one-element list
    pub async fn fetch(&self, query: &ApodQuery) -> Result<Vec<ImageRecord>, FetchError> {
        match *query {
            ApodQuery::Single(date) => self.fetch_single(date).await.map(|r| vec![r]),
            ApodQuery::Range { start, end } => self.fetch_range(start, end).await,
        }
    }
}

impl std::fmt::Debug for ApodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApodClient").finish_non_exhaustive()
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: TransportResponse) -> Result<T, FetchError> {
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    serde_json::from_str(&response.body).map_err(|e| FetchError::Decode(e.to_string()))
}
