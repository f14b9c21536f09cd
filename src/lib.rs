//! Async client and entity cache for the EventHub event-management API.
//!
//! [`EventHubClient`] bundles the HTTP gateway, the [`EventStore`] cache and
//! the [`Session`]. Reads are served from the cache once populated; every
//! mutation writes to the backend and re-fetches what it touched before it
//! returns.

mod client;
pub mod config;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod session;
pub mod store;

pub use client::EventHubClient;
pub use config::ClientConfig;
pub use draft::{DraftId, DraftItem, EventDraft, LocalKey};
pub use error::{ApiError, Result};
pub use gateway::{Gateway, HttpGateway};
pub use model::*;
pub use session::Session;
pub use store::{CacheClass, EventStore, LoadState};
