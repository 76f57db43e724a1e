//! Orderstream - order ingestion pipeline
//!
//! Consumes order payloads from an event stream, persists each order
//! atomically across its relations, and keeps an in-memory cache in step
//! with storage for point lookups.
//!
//! Startup order: connect storage, [`cache::hydrate`] the cache, build the
//! [`query::QueryService`] from the hydrated cache, then run the
//! [`consumer::OrderConsumer`] against an [`stream::OrderStream`].

pub mod cache;
pub mod config;
pub mod consumer;
pub mod dlq;
pub mod order;
pub mod query;
pub mod storage;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;
