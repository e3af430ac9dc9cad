//! Data models for event records.
//!
//! - `Event`: an event as returned by the backend
//! - `EventDraft`: form input used to create or update an event
//! - `EventImage`: an image the event form can pick from

pub mod event;

pub use event::{Event, EventDraft, EventImage};
