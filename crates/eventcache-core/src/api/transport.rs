use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::TransportError;
use crate::models::{Event, EventDraft, EventImage};

/// Filters for the event list endpoint. Also used verbatim as the record
/// segment of list query keys, so unset filters are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListParams {
    #[serde(rename = "searchTerm", skip_serializing_if = "Option::is_none", default)]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<u32>,
}

impl EventListParams {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            max: None,
        }
    }

    pub fn recent(max: u32) -> Self {
        Self {
            search_term: None,
            max: Some(max),
        }
    }
}

/// Calls the event backend. Read operations receive an abort signal that
/// implementations should honour by returning a cancelled error.
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    async fn fetch_events(
        &self,
        params: EventListParams,
        signal: CancellationToken,
    ) -> Result<Vec<Event>, TransportError>;

    async fn fetch_event(&self, id: &str, signal: CancellationToken) -> Result<Event, TransportError>;

    async fn fetch_images(&self, signal: CancellationToken) -> Result<Vec<EventImage>, TransportError>;

    async fn create_event(&self, draft: &EventDraft) -> Result<Event, TransportError>;

    async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Event, TransportError>;

    async fn delete_event(&self, id: &str) -> Result<(), TransportError>;
}
