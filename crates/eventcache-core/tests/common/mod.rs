#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eventcache_core::api::{EventListParams, EventTransport, TransportError};
use eventcache_core::models::{Event, EventDraft, EventImage};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

pub fn event(id: &str, title: &str) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("About {}", title),
        date: "2024-03-05".to_string(),
        time: "18:30".to_string(),
        location: "Trailhead".to_string(),
        image: "images/hike.jpg".to_string(),
    }
}

pub fn draft(title: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        date: "2024-04-01".to_string(),
        time: "09:00".to_string(),
        location: "Lake".to_string(),
        image: "images/lake.jpg".to_string(),
        ..EventDraft::default()
    }
}

/// In-memory backend with per-endpoint call counters and simulated latency.
pub struct MockTransport {
    pub events: Mutex<Vec<Event>>,
    pub latency: Duration,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    /// Reject writes with this backend message.
    pub reject_writes: Mutex<Option<String>>,
    next_id: AtomicUsize,
}

impl MockTransport {
    pub fn new(events: Vec<Event>) -> Self {
        let next_id = events.len() + 1;
        Self {
            events: Mutex::new(events),
            latency: Duration::from_millis(50),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            reject_writes: Mutex::new(None),
            next_id: AtomicUsize::new(next_id),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    async fn wait(&self, signal: &CancellationToken) -> Result<(), TransportError> {
        tokio::select! {
            _ = signal.cancelled() => Err(TransportError::cancelled()),
            _ = tokio::time::sleep(self.latency) => Ok(()),
        }
    }

    fn check_write(&self) -> Result<(), TransportError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match self.reject_writes.lock().clone() {
            Some(message) => Err(TransportError::from_status(
                422,
                &serde_json::json!({ "message": message }).to_string(),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EventTransport for MockTransport {
    async fn fetch_events(
        &self,
        params: EventListParams,
        signal: CancellationToken,
    ) -> Result<Vec<Event>, TransportError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.wait(&signal).await?;

        let events = self.events.lock().clone();
        let mut matching: Vec<Event> = match &params.search_term {
            Some(term) => {
                let term = term.to_lowercase();
                events
                    .into_iter()
                    .filter(|e| e.title.to_lowercase().contains(&term))
                    .collect()
            }
            None => events,
        };
        if let Some(max) = params.max {
            // Newest first
            matching.reverse();
            matching.truncate(max as usize);
        }
        Ok(matching)
    }

    async fn fetch_event(&self, id: &str, signal: CancellationToken) -> Result<Event, TransportError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.wait(&signal).await?;
        self.events
            .lock()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| TransportError::from_status(404, r#"{"message":"Event not found."}"#))
    }

    async fn fetch_images(&self, signal: CancellationToken) -> Result<Vec<EventImage>, TransportError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.wait(&signal).await?;
        Ok(vec![EventImage {
            path: "images/lake.jpg".to_string(),
            caption: "A lake".to_string(),
        }])
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<Event, TransportError> {
        self.check_write()?;
        tokio::time::sleep(self.latency).await;
        let id = format!("e{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut created = event(&id, &draft.title);
        created.date = draft.date.clone();
        created.time = draft.time.clone();
        self.events.lock().push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, id: &str, draft: &EventDraft) -> Result<Event, TransportError> {
        self.check_write()?;
        tokio::time::sleep(self.latency).await;
        let mut events = self.events.lock();
        let existing = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| TransportError::from_status(404, r#"{"message":"Event not found."}"#))?;
        existing.title = draft.title.clone();
        existing.description = draft.description.clone();
        existing.date = draft.date.clone();
        existing.time = draft.time.clone();
        existing.location = draft.location.clone();
        existing.image = draft.image.clone();
        Ok(existing.clone())
    }

    async fn delete_event(&self, id: &str) -> Result<(), TransportError> {
        self.check_write()?;
        tokio::time::sleep(self.latency).await;
        self.events.lock().retain(|e| e.id != id);
        Ok(())
    }
}
