//! Transport layer for the events REST backend.
//!
//! `EventTransport` is the contract the query layer fetches through;
//! `ApiClient` implements it over HTTP with `reqwest`. Failures are reported
//! as `TransportError`, which keeps the backend's `info.message` so it can be
//! shown to the user verbatim.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{ErrorInfo, TransportError, TransportErrorKind};
pub use transport::{EventListParams, EventTransport};
