//! Application state: one query cache shared by every command of a run.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use eventcache_core::cache::SnapshotStore;
use eventcache_core::events::{self, EventQueries};
use eventcache_core::query::{QueryClient, QueryState, QueryStatus};
use eventcache_core::{ApiClient, Config, Event};

use crate::commands::{Command, CreateArgs, EventFields};
use crate::output::Output;
use crate::shell;

/// Turn a settled query into its data, or an error carrying the message a
/// user should see.
pub fn settled<T>(state: QueryState<T>, fallback: &str) -> Result<T> {
    let QueryState {
        status, data, error, ..
    } = state;
    match (status, data, error) {
        (QueryStatus::Error, _, Some(error)) => Err(anyhow!(error.user_message(fallback))),
        (_, Some(data), _) => Ok(data),
        _ => Err(anyhow!(fallback.to_string())),
    }
}

pub struct App {
    pub config: Config,
    pub queries: EventQueries<ApiClient>,
    pub output: Output,
    snapshots: Option<SnapshotStore>,
}

impl App {
    pub fn new(config: Config, output: Output) -> Result<Self> {
        let api = ApiClient::with_timeout(config.base_url(), config.request_timeout())?;
        let client = QueryClient::new(config.query_defaults());
        let queries = EventQueries::new(client, Arc::new(api));

        let snapshots = if config.persist_cache() {
            match config.cache_dir().and_then(SnapshotStore::new) {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(error = %e, "Cache snapshots disabled");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            queries,
            output,
            snapshots,
        })
    }

    pub fn client(&self) -> &QueryClient {
        self.queries.client()
    }

    /// Show previously seen data right away; it is refetched on first use.
    pub fn restore_cache(&self) {
        let Some(store) = &self.snapshots else {
            return;
        };
        match store.load_queries() {
            Ok(Some(cached)) => {
                let age = cached.age_display();
                let restored = self.client().hydrate(cached.data);
                info!(restored, age = %age, "Restored cached queries");
            }
            Ok(None) => debug!("No cache snapshot"),
            Err(e) => warn!(error = %e, "Failed to load cache snapshot"),
        }
    }

    pub fn persist_cache(&self) {
        let Some(store) = &self.snapshots else {
            return;
        };
        if let Err(e) = store.save_queries(&self.client().dehydrate()) {
            warn!(error = %e, "Failed to save cache snapshot");
        }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Recent => self.recent().await,
            Command::Search { term } => self.search(&term.join(" ")).await,
            Command::Show { id } => self.show(&id).await,
            Command::Create(args) => self.create(args).await,
            Command::Edit { id, fields } => self.edit(&id, fields).await,
            Command::Delete { id } => self.delete(&id).await,
            Command::Images => self.images().await,
            Command::Shell => shell::run(self).await,
        }
    }

    pub async fn recent(&self) -> Result<()> {
        let events = settled(self.queries.recent_events().await, events::FETCH_EVENTS_FAILED)?;
        self.output.events("Recently added events", &events);
        Ok(())
    }

    /// Running the command submits the term, so even an empty one searches.
    pub async fn search(&self, term: &str) -> Result<()> {
        let state = self.queries.search_events(Some(term.trim())).await;
        let events = settled(state, events::FETCH_EVENTS_FAILED)?;
        self.output.events("Search results", &events);
        Ok(())
    }

    pub async fn show(&self, id: &str) -> Result<()> {
        let event = settled(self.queries.event_details(id).await, events::EVENT_DETAILS_FAILED)?;
        self.output.event(&event, self.config.base_url());
        Ok(())
    }

    pub async fn create(&self, args: CreateArgs) -> Result<()> {
        let record = self
            .queries
            .create_event_mutation()
            .mutate(args.into_draft())
            .await;
        match (record.data, record.error) {
            (Some(event), _) => {
                self.output.info(&format!("Created event {}", event.id));
                if self.output.is_json() {
                    self.output.event(&event, self.config.base_url());
                }
                Ok(())
            }
            (None, error) => Err(anyhow!(error
                .map(|e| e.user_message(events::CREATE_EVENT_FAILED))
                .unwrap_or_else(|| events::CREATE_EVENT_FAILED.to_string()))),
        }
    }

    /// Load the event like the edit route does, apply the changes and save.
    pub async fn edit(&self, id: &str, fields: EventFields) -> Result<()> {
        self.queries
            .load_event(id)
            .await
            .map_err(|e| anyhow!(e.user_message(events::LOAD_EVENT_FAILED)))?;
        let current: Event = settled(self.queries.edit_event_data(id).await, events::LOAD_EVENT_FAILED)?;

        if fields.is_empty() {
            self.output.info("Nothing to change.");
            self.output.event(&current, self.config.base_url());
            return Ok(());
        }

        let mut draft = current.to_draft();
        fields.apply(&mut draft);
        let updated = self
            .queries
            .update_event(id, &draft)
            .await
            .map_err(|e| anyhow!(e.user_message(events::UPDATE_EVENT_FAILED)))?;
        self.output.info(&format!("Updated event {}", updated.id));
        if self.output.is_json() {
            self.output.event(&updated, self.config.base_url());
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let record = self
            .queries
            .delete_event_mutation()
            .mutate(id.to_string())
            .await;
        if let Some(error) = record.error {
            return Err(anyhow!(error.user_message(events::DELETE_EVENT_FAILED)));
        }
        self.output.info(&format!("Deleted event {}", id));
        Ok(())
    }

    pub async fn images(&self) -> Result<()> {
        let images = settled(self.queries.selectable_images().await, events::FETCH_IMAGES_FAILED)?;
        self.output.images(&images);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventcache_core::api::TransportError;
    use eventcache_core::QueryError;

    #[test]
    fn test_settled_prefers_backend_message() {
        let state: QueryState<Vec<Event>> = QueryState {
            status: QueryStatus::Error,
            error: Some(QueryError::from(
                TransportError::network("down").with_info_message("Backend is down."),
            )),
            ..QueryState::default()
        };
        let err = settled(state, events::FETCH_EVENTS_FAILED).unwrap_err();
        assert_eq!(err.to_string(), "Backend is down.");
    }

    #[test]
    fn test_settled_falls_back() {
        let state: QueryState<Vec<Event>> = QueryState {
            status: QueryStatus::Error,
            error: Some(QueryError::from(TransportError::network("down"))),
            ..QueryState::default()
        };
        let err = settled(state, events::FETCH_EVENTS_FAILED).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch events.");

        let ok = QueryState {
            status: QueryStatus::Success,
            data: Some(vec![1]),
            ..QueryState::default()
        };
        assert_eq!(settled(ok, "unused").unwrap(), vec![1]);
    }
}
