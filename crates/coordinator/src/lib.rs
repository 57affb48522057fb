//! Search-result coordination over a network-bound resource.
//!
//! A [`SearchCoordinator`] sits between a user-editable query and a
//! [`ResourceSource`] that merges a local cache with a remote fetch. On every
//! query change or user action it decides whether to reuse the last fetched
//! query, start a fresh fetch, or do nothing, while tracking connectivity and
//! exposing one-shot UI signals.
//!
//! # Concurrency
//!
//! Each coordinator runs one driver task that is the only writer of its state.
//! At most one fetch subscription is active at a time: starting a new one
//! cancels the previous one and waits for its stream to be dropped. Every
//! emission carries the epoch of the fetch that produced it, and the driver
//! discards emissions from any epoch but the latest. Connectivity is merged
//! by a separate long-lived task that fetches never restart or block.
//!
//! # Modes
//!
//! - [`SearchMode::Simple`]: every request fetches.
//! - [`SearchMode::Advanced`]: see [`decide`].

pub mod config;
mod connectivity;
mod coordinator;
mod decision;
mod epoch;
pub mod error;
mod flight;
mod freshness;
pub mod ports;
mod query;
mod resource;
mod signal;
mod spawn;
#[cfg(test)]
mod testing;

pub use config::{ConnectivityConfig, CoordinatorConfig};
pub use connectivity::ManualConnectivity;
pub use coordinator::SearchCoordinator;
pub use decision::{FetchDecision, SearchMode, decide};
pub use error::{ConfigError, CoordinatorError, FetchError, FreshnessError, Result};
pub use freshness::{FileFreshnessStore, MemoryFreshnessStore};
pub use ports::{Connectivity, ConnectivityMonitor, ConnectivityStream, FreshnessStore, NetworkStatus, ResourceSource, ResourceStream, SearchPorts};
pub use resource::Resource;
