//! HTTP client for the events REST backend.
//!
//! Endpoints:
//! - `GET    /events?search=&max=` → `{ "events": [...] }`
//! - `GET    /events/{id}`         → `{ "event": {...} }`
//! - `GET    /events/images`       → `{ "images": [...] }`
//! - `POST   /events`              ← `{ "event": {...} }` → `{ "event": {...} }`
//! - `PUT    /events/{id}`         ← `{ "event": {...} }` → `{ "event": {...} }`
//! - `DELETE /events/{id}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{EventListParams, EventTransport, TransportError};
use crate::models::{Event, EventDraft, EventImage};

// ============================================================================
// Constants
// ============================================================================

/// Backend used when nothing is configured (the development server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct EventsResponse {
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    event: Event,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    images: Vec<EventImage>,
}

#[derive(Debug, Serialize)]
struct EventPayload<'a> {
    event: &'a EventDraft,
}

/// API client for the events backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/events/{id}` with the id as one percent-encoded path segment.
    fn event_url(&self, id: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.url("/events"))
            .map_err(|e| TransportError::network(format!("Invalid API URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::network(format!("Invalid API URL {}", self.base_url)))?
            .push(id);
        Ok(url)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, TransportError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::from_status(status, &body))
        }
    }

    async fn send(&self, request: RequestBuilder, signal: &CancellationToken) -> Result<Response, TransportError> {
        let response = tokio::select! {
            _ = signal.cancelled() => return Err(TransportError::cancelled()),
            response = request.send() => response?,
        };
        Self::check_response(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        signal: &CancellationToken,
    ) -> Result<T, TransportError> {
        let response = self.send(request, signal).await?;
        tokio::select! {
            _ = signal.cancelled() => Err(TransportError::cancelled()),
            body = response.json::<T>() => body.map_err(TransportError::from),
        }
    }
}

#[async_trait]
impl EventTransport for ApiClient {
    async fn fetch_events(
        &self,
        params: EventListParams,
        signal: CancellationToken,
    ) -> Result<Vec<Event>, TransportError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(term) = &params.search_term {
            query.push(("search", term.clone()));
        }
        if let Some(max) = params.max {
            query.push(("max", max.to_string()));
        }

        let request = self.client.get(self.url("/events")).query(&query);
        let response: EventsResponse = self.send_json(request, &signal).await?;
        debug!(count = response.events.len(), ?params, "Events fetched");
        Ok(response.events)
    }

    async fn fetch_event(&self, id: &str, signal: CancellationToken) -> Result<Event, TransportError> {
        let request = self.client.get(self.event_url(id)?);
        let response: EventResponse = self.send_json(request, &signal).await?;
        Ok(response.event)
    }

    async fn fetch_images(&self, signal: CancellationToken) -> Result<Vec<EventImage>, TransportError> {
        let request = self.client.get(self.url("/events/images"));
        let response: ImagesResponse = self.send_json(request, &signal).await?;
        Ok(response.images)
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<Event, TransportError> {
        let request = self
            .client
            .post(self.url("/events"))
            .json(&EventPayload { event: draft });
        let response: EventResponse = self.send_json(request, &CancellationToken::new()).await?;
        debug!(id = %response.event.id, "Event created");
        Ok(response.event)
    }

    async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Event, TransportError> {
        let request = self
            .client
            .put(self.event_url(id)?)
            .json(&EventPayload { event: draft });
        let response: EventResponse = self.send_json(request, &CancellationToken::new()).await?;
        Ok(response.event)
    }

    async fn delete_event(&self, id: &str) -> Result<(), TransportError> {
        let request = self.client.delete(self.event_url(id)?);
        self.send(request, &CancellationToken::new()).await?;
        debug!(id, "Event deleted");
        Ok(())
    }
}
