//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **cache**: Redis-backed and in-memory cache stores for sessions and
//!   permissions
//! - **persistence**: in-memory durable store for every repository port
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod cache;
pub mod persistence;
