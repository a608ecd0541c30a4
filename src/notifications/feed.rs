use crate::db::models::Event;
use crate::db::repositories::EventsRepository;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Read side of the event log as seen by a passive observer
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// The event with the highest id, used to skip history on start
    async fn latest_event(&self) -> Result<Option<Event>>;

    /// Events with `id > last_id`, ascending by id, at most `limit`
    async fn events_since(&self, last_id: i64, limit: i64) -> Result<Vec<Event>>;
}

#[async_trait]
impl EventFeed for EventsRepository {
    async fn latest_event(&self) -> Result<Option<Event>> {
        self.latest().await
    }

    async fn events_since(&self, last_id: i64, limit: i64) -> Result<Vec<Event>> {
        self.list_newer_than(last_id, limit).await
    }
}

/// Feed that polls a remote event server over HTTP
pub struct HttpEventFeed {
    client: Client,
    base_url: Url,
}

impl HttpEventFeed {
    /// Build a feed with an explicit per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid server URL {}: {}", base_url, e)))?;
        // Keep any path prefix when joining relative routes
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Fetch(format!("{} responded with {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Fetch(format!("Invalid response from {}: {}", url, e)))
    }
}

#[async_trait]
impl EventFeed for HttpEventFeed {
    async fn latest_event(&self) -> Result<Option<Event>> {
        let url = self.endpoint("events/latest")?;
        self.get_json(url).await
    }

    async fn events_since(&self, last_id: i64, limit: i64) -> Result<Vec<Event>> {
        let mut url = self.endpoint(&format!("events/since/{}", last_id))?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }
}
