//! Durable store adapters.
//!
//! [`InMemoryStore`] implements every repository port against process
//! memory and evaluates [`pagination::ListPlan`]s with
//! [`pagination::ListPlan::apply`]. SQL-backed adapters translate the same
//! plans into their own query language and live outside this crate.

mod memory;
mod records;

pub use memory::InMemoryStore;
