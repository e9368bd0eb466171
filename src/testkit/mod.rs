//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`mqtt`] — [`RecordingPublisher`](mqtt::RecordingPublisher) and
//!   [`FailingPublisher`](mqtt::FailingPublisher) implementations of the
//!   publish port.
//! - [`chat`] — recording/failing [`ChatClient`](crate::port::ChatClient)
//!   implementations.
//! - [`store`] — [`StaticContainerStore`](store::StaticContainerStore),
//!   a fixed container snapshot.
//! - [`domain`] — builders for test containers and watchers.

pub mod chat;
pub mod domain;
pub mod mqtt;
pub mod store;
