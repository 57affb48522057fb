//! In-process resource source with simulated latency.

use std::time::Duration;

use futures::StreamExt;
use seeker_coordinator::{FetchError, Resource, ResourceSource, ResourceStream};

/// Queries starting with this prefix fail after the simulated latency.
pub const FAILING_PREFIX: &str = "fail";

/// Emits `Loading`, waits, then a fake result page for the query.
///
/// Dropping the stream while it waits cancels the pending result.
#[derive(Debug, Clone)]
pub struct DemoSource {
	latency: Duration,
	page_size: usize,
}

impl DemoSource {
	pub fn new(latency: Duration) -> Self {
		Self { latency, page_size: 3 }
	}
}

impl ResourceSource for DemoSource {
	type Data = Vec<String>;

	fn subscribe(&self, query: &str) -> ResourceStream<Self::Data> {
		tracing::debug!(query, latency = ?self.latency, "demo.subscribe");
		let latency = self.latency;
		let query = query.to_owned();
		let page_size = self.page_size;

		let result = async move {
			tokio::time::sleep(latency).await;
			if query.starts_with(FAILING_PREFIX) {
				return Resource::Error(FetchError::Network(format!("remote rejected {query:?}")));
			}
			Resource::Success(results(&query, page_size))
		};
		futures::stream::once(async { Resource::Loading }).chain(futures::stream::once(result)).boxed()
	}
}

fn results(query: &str, page_size: usize) -> Vec<String> {
	if query.is_empty() {
		return vec!["(everything)".to_owned()];
	}
	(1..=page_size).map(|n| format!("{query} #{n}")).collect()
}
