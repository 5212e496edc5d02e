//! Core of a client, project and time-tracking service.
//!
//! The [`domain`] module holds entities, rule chains and services; the
//! [`outbound`] module provides cache and persistence adapters; and
//! [`bootstrap`] wires them together from [`config::LmsSettings`].

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bootstrap::{DurableStore, LmsServices};
pub use config::LmsSettings;
