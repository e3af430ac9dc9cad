//! How the event views use the query cache.
//!
//! Keys:
//! - `["events", {"max": 3}]`: recently added events (fresh for 5s)
//! - `["events", {"searchTerm": ..}]`: search results, disabled until a term is given
//! - `["events", id]`: one event (fresh for 10s in the edit form)
//! - `["events-images"]`: images selectable in the event form
//!
//! Every write invalidates the whole `["events"]` prefix. Deleting uses
//! `RefetchType::None` because the detail view of the deleted event is
//! being left and must not refetch it.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info};

use crate::api::{EventListParams, EventTransport, TransportError};
use crate::error::QueryError;
use crate::models::{Event, EventDraft, EventImage};
use crate::query::{
    AbortSignal, CacheEntry, InvalidateOptions, Mutation, QueryClient, QueryKey, QueryOptions, QueryState,
    QueryStatus, RefetchType, Subscription,
};

pub const EVENTS: &str = "events";
pub const EVENT_IMAGES: &str = "events-images";

/// Number of events on the "recently added" list.
pub const RECENT_EVENTS_MAX: u32 = 3;

pub const RECENT_EVENTS_STALE_TIME: Duration = Duration::from_secs(5);
pub const EDIT_EVENT_STALE_TIME: Duration = Duration::from_secs(10);

// Fallback messages for errors without a backend-provided message.
pub const FETCH_EVENTS_FAILED: &str = "Failed to fetch events.";
pub const EVENT_DETAILS_FAILED: &str = "Failed to request event details. Try again!";
pub const LOAD_EVENT_FAILED: &str = "Failed to load an event.";
pub const CREATE_EVENT_FAILED: &str = "Failed to create event. Check your inputs!";
pub const UPDATE_EVENT_FAILED: &str = "Failed to update event. Check your inputs!";
pub const DELETE_EVENT_FAILED: &str = "Failed to delete an event!";
pub const FETCH_IMAGES_FAILED: &str = "Failed to fetch selectable images.";

pub fn events_key() -> QueryKey {
    QueryKey::root(EVENTS)
}

pub fn list_key(params: &EventListParams) -> Result<QueryKey, QueryError> {
    events_key().join(params)
}

pub fn event_key(id: &str) -> Result<QueryKey, QueryError> {
    events_key().join(id)
}

pub fn images_key() -> QueryKey {
    QueryKey::root(EVENT_IMAGES)
}

fn failed<D>(error: QueryError) -> QueryState<D> {
    QueryState {
        status: QueryStatus::Error,
        error: Some(error),
        ..QueryState::default()
    }
}

/// Queries, loaders and mutations of the event views over one shared cache.
pub struct EventQueries<T> {
    client: QueryClient,
    transport: Arc<T>,
}

impl<T> Clone for EventQueries<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: EventTransport> EventQueries<T> {
    pub fn new(client: QueryClient, transport: Arc<T>) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    // ===== Fetch functions =====

    fn list_fetch(
        &self,
        params: EventListParams,
    ) -> impl Fn(AbortSignal) -> BoxFuture<'static, Result<Vec<Event>, TransportError>> + Send + Sync + 'static
    {
        let transport = Arc::clone(&self.transport);
        move |signal: AbortSignal| {
            let transport = Arc::clone(&transport);
            let params = params.clone();
            async move { transport.fetch_events(params, signal).await }.boxed()
        }
    }

    fn detail_fetch(
        &self,
        id: &str,
    ) -> impl Fn(AbortSignal) -> BoxFuture<'static, Result<Event, TransportError>> + Send + Sync + 'static {
        let transport = Arc::clone(&self.transport);
        let id = id.to_string();
        move |signal: AbortSignal| {
            let transport = Arc::clone(&transport);
            let id = id.clone();
            async move { transport.fetch_event(&id, signal).await }.boxed()
        }
    }

    // ===== Queries =====

    pub async fn events(&self, params: EventListParams, options: QueryOptions) -> QueryState<Vec<Event>> {
        let key = match list_key(&params) {
            Ok(key) => key,
            Err(e) => return failed(e),
        };
        self.client.query(&key, self.list_fetch(params), options).await
    }

    pub async fn recent_events(&self) -> QueryState<Vec<Event>> {
        self.events(
            EventListParams::recent(RECENT_EVENTS_MAX),
            QueryOptions::default().stale_time(RECENT_EVENTS_STALE_TIME),
        )
        .await
    }

    /// Stays idle until a search term has been entered.
    pub async fn search_events(&self, term: Option<&str>) -> QueryState<Vec<Event>> {
        let params = EventListParams {
            search_term: term.map(str::to_string),
            max: None,
        };
        self.events(params, QueryOptions::default().enabled(term.is_some()))
            .await
    }

    pub async fn event_details(&self, id: &str) -> QueryState<Event> {
        self.event_with(id, QueryOptions::default()).await
    }

    /// Data for the edit form; reuses anything fetched in the last 10 seconds.
    pub async fn edit_event_data(&self, id: &str) -> QueryState<Event> {
        self.event_with(id, QueryOptions::default().stale_time(EDIT_EVENT_STALE_TIME))
            .await
    }

    async fn event_with(&self, id: &str, options: QueryOptions) -> QueryState<Event> {
        let key = match event_key(id) {
            Ok(key) => key,
            Err(e) => return failed(e),
        };
        self.client.query(&key, self.detail_fetch(id), options).await
    }

    pub async fn selectable_images(&self) -> QueryState<Vec<EventImage>> {
        let transport = Arc::clone(&self.transport);
        self.client
            .query(
                &images_key(),
                move |signal: AbortSignal| {
                    let transport = Arc::clone(&transport);
                    async move { transport.fetch_images(signal).await }
                },
                QueryOptions::default(),
            )
            .await
    }

    // ===== Observed queries =====

    /// Mount the "recently added" list: subscribe, then query.
    pub async fn observe_recent_events<O>(&self, observer: O) -> Result<(Subscription, QueryState<Vec<Event>>), QueryError>
    where
        O: Fn(&QueryKey, &CacheEntry) + Send + Sync + 'static,
    {
        let params = EventListParams::recent(RECENT_EVENTS_MAX);
        let key = list_key(&params)?;
        Ok(self
            .client
            .observe(
                &key,
                self.list_fetch(params),
                QueryOptions::default().stale_time(RECENT_EVENTS_STALE_TIME),
                observer,
            )
            .await)
    }

    /// Mount the detail view of one event.
    pub async fn observe_event<O>(&self, id: &str, observer: O) -> Result<(Subscription, QueryState<Event>), QueryError>
    where
        O: Fn(&QueryKey, &CacheEntry) + Send + Sync + 'static,
    {
        let key = event_key(id)?;
        Ok(self
            .client
            .observe(&key, self.detail_fetch(id), QueryOptions::default(), observer)
            .await)
    }

    // ===== Route loaders and actions =====

    /// Loader of the edit route: have the event in cache before the form mounts.
    pub async fn load_event(&self, id: &str) -> Result<Event, QueryError> {
        let key = event_key(id)?;
        self.client
            .fetch_query(&key, self.detail_fetch(id), QueryOptions::default())
            .await
    }

    /// Action of the edit route: save, then wait until every observed event
    /// query has been refreshed.
    pub async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Event, QueryError> {
        let updated = self.transport.update_event(id, draft).await?;
        let refreshed = self
            .client
            .invalidate_and_wait(&events_key(), InvalidateOptions::default())
            .await;
        info!(id, refreshed, "Event updated");
        Ok(updated)
    }

    // ===== Mutations =====

    pub fn create_event_mutation(&self) -> Mutation<EventDraft, Event> {
        let transport = Arc::clone(&self.transport);
        let client = self.client.clone();
        Mutation::new("create-event", move |draft: EventDraft| {
            let transport = Arc::clone(&transport);
            async move { transport.create_event(&draft).await }
        })
        .on_success(move |event: &Event, _draft: &EventDraft| {
            info!(id = %event.id, "Event created");
            client.invalidate(&events_key(), InvalidateOptions::default());
        })
    }

    pub fn update_event_mutation(&self) -> Mutation<(String, EventDraft), Event> {
        let transport = Arc::clone(&self.transport);
        let client = self.client.clone();
        Mutation::new("update-event", move |(id, draft): (String, EventDraft)| {
            let transport = Arc::clone(&transport);
            async move { transport.update_event(&id, &draft).await }
        })
        .on_success(move |event: &Event, _input: &(String, EventDraft)| {
            info!(id = %event.id, "Event updated");
            client.invalidate(&events_key(), InvalidateOptions::default());
        })
    }

    pub fn delete_event_mutation(&self) -> Mutation<String, ()> {
        let transport = Arc::clone(&self.transport);
        let client = self.client.clone();
        Mutation::new("delete-event", move |id: String| {
            let transport = Arc::clone(&transport);
            async move { transport.delete_event(&id).await }
        })
        .on_success(move |_: &(), id: &String| {
            let matched = client.invalidate(
                &events_key(),
                InvalidateOptions::refetch(RefetchType::None),
            );
            debug!(id = %id, matched, "Event deleted, queries marked stale");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys() {
        assert_eq!(events_key().to_string(), r#"["events"]"#);
        assert_eq!(
            list_key(&EventListParams::recent(3)).unwrap().to_string(),
            r#"["events",{"max":3}]"#
        );
        assert_eq!(
            list_key(&EventListParams::search("camp")).unwrap().to_string(),
            r#"["events",{"searchTerm":"camp"}]"#
        );
        assert_eq!(event_key("e1").unwrap().to_string(), r#"["events","e1"]"#);
        assert!(!events_key().covers(&images_key()));
    }

    #[test]
    fn test_list_key_matches_hand_built_descriptor() {
        let hand_built =
            QueryKey::from_segments(vec![json!("events"), json!({ "max": 3, "searchTerm": "x" })]).unwrap();
        let params = EventListParams {
            search_term: Some("x".into()),
            max: Some(3),
        };
        assert_eq!(list_key(&params).unwrap(), hand_built);
    }

    #[test]
    fn test_search_without_term_has_empty_record() {
        let key = list_key(&EventListParams::default()).unwrap();
        assert_eq!(key.to_string(), r#"["events",{}]"#);
    }
}
