/// Cloud Firestore backend for the gallery
///
/// Talks to the Firestore REST API (v1) with a project id and web API key.
/// Plain JSON documents are converted to and from Firestore's typed value
/// encoding (`{"stringValue": ...}`, `{"mapValue": {"fields": ...}}`, ...).
use async_trait::async_trait;
use std::future::Future;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use tracing::{debug, info, warn};

use super::documents::{Document, DocumentStore, StoredDocument};
use crate::error::StoreError;

/// Public Firestore REST root
pub const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";

/// Page size used when enumerating a collection
const PAGE_SIZE: u32 = 300;

pub struct FirestoreDocumentStore {
    client: Client,
    documents_url: String,
    api_key: String,
}

impl FirestoreDocumentStore {
    pub fn new(client: Client, project_id: &str, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, FIRESTORE_API, project_id, api_key)
    }

    /// Talk to a Firestore-compatible REST root other than the public one
    pub fn with_base_url(
        client: Client,
        base_url: impl Into<String>,
        project_id: &str,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            base_url.trim_end_matches('/'),
            project_id
        );
        info!("☁️  Gallery stored in Firestore project {}", project_id);
        Self {
            client,
            documents_url,
            api_key: api_key.into(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, collection)
    }

    fn list_request(&self, url: &str, page_token: Option<&str>) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .query(&[("pageSize", PAGE_SIZE)]);
        match page_token {
            Some(token) => request.query(&[("pageToken", token)]),
            None => request,
        }
    }

    fn insert_request(&self, collection: &str, fields: Document) -> RequestBuilder {
        self.client
            .post(self.collection_url(collection))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": encode_fields(fields) }))
    }

    /// Delete that fails with 404 instead of silently succeeding on a missing id
    fn delete_request(&self, collection: &str, id: &str) -> RequestBuilder {
        self.client
            .delete(format!("{}/{}", self.collection_url(collection), id))
            .query(&[("key", self.api_key.as_str()), ("currentDocument.exists", "true")])
    }

    async fn fetch_page(&self, url: &str, page_token: Option<String>) -> Result<ListResponse, StoreError> {
        let response = self
            .list_request(url, page_token.as_deref())
            .send()
            .await
            .map_err(unavailable)?;
        check(response, None).await?.json().await.map_err(corrupt)
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

/// Follow `nextPageToken` until the collection is exhausted
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<StoredDocument>, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListResponse, StoreError>>,
{
    let mut documents = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = fetch_page(page_token.take()).await?;
        decode_page(page.documents, &mut documents);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(documents)
}

/// Decode one page, skipping documents the codec can't read
fn decode_page(page: Vec<FirestoreDocument>, into: &mut Vec<StoredDocument>) {
    for doc in page {
        let decoded = document_id(&doc.name)
            .and_then(|id| Ok(StoredDocument { id, fields: decode_fields(doc.fields)? }));
        match decoded {
            Ok(document) => into.push(document),
            Err(err) => warn!("⚠️  Skipping Firestore document {}: {}", doc.name, err),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let url = self.collection_url(collection);
        let store = self;
        let url = url.as_str();

        let documents = collect_pages(move |token| store.fetch_page(url, token)).await?;

        debug!("Listed {} documents from {}", documents.len(), collection);
        Ok(documents)
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
        let response = self
            .insert_request(collection, fields)
            .send()
            .await
            .map_err(unavailable)?;

        let created: FirestoreDocument = check(response, None).await?.json().await.map_err(corrupt)?;
        document_id(&created.name)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .delete_request(collection, id)
            .send()
            .await
            .map_err(unavailable)?;

        check(response, Some(id)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for FirestoreDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreDocumentStore")
            .field("documents_url", &self.documents_url)
            .finish()
    }
}

fn unavailable(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn corrupt(err: reqwest::Error) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

async fn check(response: Response, id: Option<&str>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, id, &body))
}

/// Map a non-success status; 404 on a keyed request is `NotFound`
fn status_error(status: StatusCode, id: Option<&str>, body: &str) -> StoreError {
    match id {
        Some(id) if status == StatusCode::NOT_FOUND => StoreError::NotFound(id.to_string()),
        _ => StoreError::Backend(format!("HTTP {}: {}", status.as_u16(), body.trim())),
    }
}

/// Last path segment of a full document resource name
fn document_id(name: &str) -> Result<String, StoreError> {
    name.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| StoreError::Corrupt(format!("bad document name '{}'", name)))
}

fn encode_fields(fields: Document) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key, encode_value(value)))
        .collect()
}

fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // Firestore sends and expects 64-bit integers as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.into_iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: Map<String, Value>) -> Result<Document, StoreError> {
    fields
        .into_iter()
        .map(|(key, value)| Ok((key, decode_value(value)?)))
        .collect()
}

fn decode_value(value: Value) -> Result<Value, StoreError> {
    let mut typed = match value {
        Value::Object(typed) => typed,
        other => {
            return Err(StoreError::Corrupt(format!("expected typed value, got {}", other)));
        }
    };

    if let Some(s) = typed.remove("stringValue") {
        return Ok(s);
    }
    if let Some(b) = typed.remove("booleanValue") {
        return Ok(b);
    }
    if typed.contains_key("nullValue") {
        return Ok(Value::Null);
    }
    if let Some(i) = typed.remove("integerValue") {
        return match &i {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| StoreError::Corrupt(format!("bad integerValue '{}'", s))),
            Value::Number(_) => Ok(i),
            _ => Err(StoreError::Corrupt(format!("bad integerValue {}", i))),
        };
    }
    if let Some(d) = typed.remove("doubleValue") {
        return Ok(match d.as_f64().and_then(Number::from_f64) {
            Some(n) => Value::Number(n),
            None => Value::Null,
        });
    }
    if let Some(t) = typed.remove("timestampValue") {
        return Ok(t);
    }
    if let Some(array) = typed.remove("arrayValue") {
        let values = match array.get("values") {
            Some(Value::Array(values)) => values.clone(),
            _ => Vec::new(),
        };
        return values
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    if let Some(map) = typed.remove("mapValue") {
        let fields = match map.get("fields") {
            Some(Value::Object(fields)) => fields.clone(),
            _ => Map::new(),
        };
        return decode_fields(fields).map(Value::Object);
    }

    Err(StoreError::Corrupt(format!(
        "unsupported Firestore value {}",
        Value::Object(typed)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_saved_image_fields() {
        let fields = json!({
            "date": "2020-01-01",
            "media_type": "image",
            "tags": ["nebula", 3],
            "meta": {"stars": 2.5, "hd": true, "note": null}
        });

        let encoded = encode_fields(fields.as_object().unwrap().clone());

        assert_eq!(encoded["date"], json!({"stringValue": "2020-01-01"}));
        assert_eq!(
            encoded["tags"],
            json!({"arrayValue": {"values": [{"stringValue": "nebula"}, {"integerValue": "3"}]}})
        );
        assert_eq!(
            encoded["meta"]["mapValue"]["fields"]["stars"],
            json!({"doubleValue": 2.5})
        );
        assert_eq!(
            encoded["meta"]["mapValue"]["fields"]["note"],
            json!({"nullValue": null})
        );
    }

    #[test]
    fn test_decode_firestore_document() {
        let raw = json!({
            "title": {"stringValue": "Horsehead"},
            "views": {"integerValue": "42"},
            "savedAt": {"timestampValue": "2024-05-01T12:00:00Z"},
            "empty": {"arrayValue": {}},
            "nested": {"mapValue": {"fields": {"ok": {"booleanValue": true}}}}
        });

        let decoded = decode_fields(raw.as_object().unwrap().clone()).unwrap();

        assert_eq!(decoded["title"], "Horsehead");
        assert_eq!(decoded["views"], 42);
        assert_eq!(decoded["savedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(decoded["empty"], json!([]));
        assert_eq!(decoded["nested"], json!({"ok": true}));
    }

    #[test]
    fn test_decode_rejects_untyped_value() {
        let raw = json!({"title": "plain string"});
        assert!(matches!(
            decode_fields(raw.as_object().unwrap().clone()),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_document_id_from_name() {
        let name = "projects/p/databases/(default)/documents/savedImages/AbC123";
        assert_eq!(document_id(name).unwrap(), "AbC123");
        assert!(document_id("projects/p/documents/").is_err());
    }

    fn page(value: Value) -> ListResponse {
        serde_json::from_value(value).unwrap()
    }

    fn pairs(request: RequestBuilder) -> (reqwest::Method, String, Vec<(String, String)>) {
        let request = request.build().unwrap();
        let query = request.url().query_pairs().into_owned().collect();
        (request.method().clone(), request.url().path().to_string(), query)
    }

    #[tokio::test]
    async fn test_list_follows_page_tokens() {
        let mut pages = vec![
            page(json!({
                "documents": [{
                    "name": "projects/p/databases/(default)/documents/savedImages/first",
                    "fields": {"title": {"stringValue": "One"}}
                }],
                "nextPageToken": "page-2"
            })),
            page(json!({
                "documents": [{
                    "name": "projects/p/databases/(default)/documents/savedImages/second",
                    "fields": {"title": {"stringValue": "Two"}}
                }]
            })),
        ]
        .into_iter();
        let mut seen = Vec::new();

        let documents = collect_pages(|token| {
            seen.push(token);
            std::future::ready(pages.next().ok_or(StoreError::Backend("no more pages".into())))
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![None, Some("page-2".to_string())]);
        let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["first", "second"]);
        assert_eq!(documents[1].fields["title"], "Two");
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_documents() {
        let mut pages = vec![page(json!({
            "documents": [
                {
                    "name": "projects/p/databases/(default)/documents/savedImages/good",
                    "fields": {"date": {"stringValue": "2020-01-01"}}
                },
                {
                    "name": "projects/p/databases/(default)/documents/savedImages/odd",
                    "fields": {
                        "date": {"stringValue": "2020-01-02"},
                        "where": {"geoPointValue": {"latitude": 1.0, "longitude": 2.0}}
                    }
                }
            ]
        }))]
        .into_iter();

        let documents = collect_pages(|_| {
            std::future::ready(pages.next().ok_or(StoreError::Backend("no more pages".into())))
        })
        .await
        .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "good");
    }

    #[tokio::test]
    async fn test_list_page_failure_is_an_error() {
        let result = collect_pages(|_| {
            std::future::ready(Err::<ListResponse, _>(StoreError::Unavailable("offline".into())))
        })
        .await;
        assert_eq!(result, Err(StoreError::Unavailable("offline".into())));
    }

    #[test]
    fn test_list_request_carries_key_and_token() {
        let store = FirestoreDocumentStore::new(Client::new(), "p", "k3y");
        let url = store.collection_url("savedImages");

        let (method, _, query) = pairs(store.list_request(&url, Some("next")));

        assert_eq!(method, reqwest::Method::GET);
        assert!(query.contains(&("key".into(), "k3y".into())));
        assert!(query.contains(&("pageSize".into(), PAGE_SIZE.to_string())));
        assert!(query.contains(&("pageToken".into(), "next".into())));
    }

    #[test]
    fn test_delete_requires_existing_document() {
        let store = FirestoreDocumentStore::new(Client::new(), "p", "k3y");

        let (method, path, query) = pairs(store.delete_request("savedImages", "abc"));

        assert_eq!(method, reqwest::Method::DELETE);
        assert!(path.ends_with("/documents/savedImages/abc"));
        assert!(query.contains(&("currentDocument.exists".into(), "true".into())));
        assert!(query.contains(&("key".into(), "k3y".into())));
    }

    #[test]
    fn test_insert_sends_typed_fields() {
        let store = FirestoreDocumentStore::new(Client::new(), "p", "k3y");
        let fields = json!({"title": "Horsehead"}).as_object().unwrap().clone();

        let request = store.insert_request("savedImages", fields).build().unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        let body: Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body, json!({"fields": {"title": {"stringValue": "Horsehead"}}}));
    }

    #[test]
    fn test_created_document_id() {
        let created: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/savedImages/Xy9",
            "fields": {},
            "createTime": "2024-05-01T12:00:00Z",
            "updateTime": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(document_id(&created.name).unwrap(), "Xy9");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, Some("abc"), ""),
            StoreError::NotFound("abc".into())
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, None, "no such collection"),
            StoreError::Backend("HTTP 404: no such collection".into())
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, Some("abc"), " denied\n"),
            StoreError::Backend("HTTP 403: denied".into())
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        // Nothing listens on port 1
        let store = FirestoreDocumentStore::with_base_url(Client::new(), "http://127.0.0.1:1/v1", "p", "k");

        assert!(matches!(store.list("savedImages").await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.delete("savedImages", "abc").await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_collection_url() {
        let store = FirestoreDocumentStore::new(Client::new(), "my-gallery", "key");
        assert_eq!(
            store.collection_url("savedImages"),
            "https://firestore.googleapis.com/v1/projects/my-gallery/databases/(default)/documents/savedImages"
        );
    }
}
