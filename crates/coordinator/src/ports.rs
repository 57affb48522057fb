//! Collaborators a coordinator is built from.
//!
//! The coordinator never fetches, stores or probes anything itself; these
//! traits are injected at construction so every collaborator can be swapped
//! for a test double.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::FreshnessError;
use crate::resource::Resource;

/// Lazy sequence of resource states for one query.
pub type ResourceStream<T> = BoxStream<'static, Resource<T>>;

/// Lazy sequence of connectivity transitions.
pub type ConnectivityStream = BoxStream<'static, NetworkStatus>;

/// Transition reported by a [`ConnectivityMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
	Available,
	Unavailable,
}

/// Last known connectivity, as seen by the coordinator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
	Connected,
	#[default]
	Disconnected,
}

impl Connectivity {
	pub const fn is_connected(self) -> bool {
		matches!(self, Self::Connected)
	}

	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Connected => "connected",
			Self::Disconnected => "disconnected",
		}
	}
}

impl From<NetworkStatus> for Connectivity {
	fn from(status: NetworkStatus) -> Self {
		match status {
			NetworkStatus::Available => Self::Connected,
			NetworkStatus::Unavailable => Self::Disconnected,
		}
	}
}

/// Supplier of network-bound resources (local cache merged with a remote fetch).
pub trait ResourceSource: Send + Sync + 'static {
	/// Payload of a successful fetch.
	type Data: Clone + Send + Sync + 'static;

	/// Starts a subscription for `query`.
	///
	/// The stream is lazy and may be requested again for the same query.
	/// Dropping it cancels the subscription, and implementations should stop
	/// any underlying work when that happens.
	fn subscribe(&self, query: &str) -> ResourceStream<Self::Data>;
}

/// Source of connectivity transitions.
pub trait ConnectivityMonitor: Send + Sync + 'static {
	/// Connectivity right now, used before the first transition arrives.
	fn current(&self) -> Connectivity;

	/// Subscribes to transitions. Called once per coordinator, and again only
	/// to recover after the previous stream ended.
	fn subscribe(&self) -> ConnectivityStream;
}

/// Durable record of the query of the most recent successful fetch.
///
/// Shared between coordinators without transactions; concurrent writers are
/// last-writer-wins.
#[async_trait]
pub trait FreshnessStore: Send + Sync + 'static {
	async fn last_query(&self) -> Result<Option<String>, FreshnessError>;

	async fn set_last_query(&self, query: &str) -> Result<(), FreshnessError>;
}

/// Collaborators injected into a [`SearchCoordinator`](crate::SearchCoordinator).
pub struct SearchPorts<S> {
	pub source: Arc<S>,
	pub connectivity: Arc<dyn ConnectivityMonitor>,
	pub freshness: Arc<dyn FreshnessStore>,
}

impl<S> SearchPorts<S>
where
	S: ResourceSource,
{
	pub fn new(source: S, connectivity: impl ConnectivityMonitor, freshness: impl FreshnessStore) -> Self {
		Self {
			source: Arc::new(source),
			connectivity: Arc::new(connectivity),
			freshness: Arc::new(freshness),
		}
	}
}

impl<S> Clone for SearchPorts<S> {
	fn clone(&self) -> Self {
		Self {
			source: Arc::clone(&self.source),
			connectivity: Arc::clone(&self.connectivity),
			freshness: Arc::clone(&self.freshness),
		}
	}
}
