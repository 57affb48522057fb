//! Channel-driven [`ResourceSource`] whose subscriptions tests control.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;

use crate::ports::{ResourceSource, ResourceStream};
use crate::resource::Resource;

#[derive(Debug, Default)]
struct Counters {
	live: AtomicUsize,
	peak: AtomicUsize,
	total: AtomicUsize,
}

/// Decrements the live count when the subscription stream is dropped.
struct LiveGuard(Arc<Counters>);

impl Drop for LiveGuard {
	fn drop(&mut self) {
		self.0.live.fetch_sub(1, Ordering::SeqCst);
	}
}

pub(crate) struct ChannelSource<T> {
	subscriptions: mpsc::UnboundedSender<Subscription<T>>,
	counters: Arc<Counters>,
}

/// Test side of a [`ChannelSource`].
pub(crate) struct SourceProbe<T> {
	subscriptions: mpsc::UnboundedReceiver<Subscription<T>>,
	counters: Arc<Counters>,
}

/// One subscription handed out by a [`ChannelSource`].
pub(crate) struct Subscription<T> {
	pub query: String,
	tx: mpsc::UnboundedSender<Resource<T>>,
}

pub(crate) fn channel_source<T>() -> (ChannelSource<T>, SourceProbe<T>) {
	let (tx, rx) = mpsc::unbounded_channel();
	let counters = Arc::new(Counters::default());
	(
		ChannelSource {
			subscriptions: tx,
			counters: Arc::clone(&counters),
		},
		SourceProbe { subscriptions: rx, counters },
	)
}

impl<T> ResourceSource for ChannelSource<T>
where
	T: Clone + Send + Sync + 'static,
{
	type Data = T;

	fn subscribe(&self, query: &str) -> ResourceStream<T> {
		let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
		self.counters.peak.fetch_max(live, Ordering::SeqCst);
		self.counters.total.fetch_add(1, Ordering::SeqCst);
		let guard = LiveGuard(Arc::clone(&self.counters));

		let (tx, rx) = mpsc::unbounded_channel();
		let _ = self.subscriptions.send(Subscription { query: query.to_owned(), tx });
		futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
			let resource = rx.recv().await?;
			Some((resource, (rx, guard)))
		})
		.boxed()
	}
}

impl<T> SourceProbe<T> {
	/// Waits for the next subscription.
	pub async fn next(&mut self) -> Subscription<T> {
		tokio::time::timeout(Duration::from_secs(2), self.subscriptions.recv())
			.await
			.expect("a subscription should start")
			.expect("source is alive")
	}

	/// Returns a subscription that has already started, if any.
	pub fn try_next(&mut self) -> Option<Subscription<T>> {
		self.subscriptions.try_recv().ok()
	}

	pub fn live(&self) -> usize {
		self.counters.live.load(Ordering::SeqCst)
	}

	/// Largest number of simultaneously live subscriptions seen so far.
	pub fn peak(&self) -> usize {
		self.counters.peak.load(Ordering::SeqCst)
	}

	pub fn total(&self) -> usize {
		self.counters.total.load(Ordering::SeqCst)
	}
}

impl<T> Subscription<T> {
	/// Pushes one state; returns `false` once the subscription was cancelled.
	pub fn emit(&self, resource: Resource<T>) -> bool {
		self.tx.send(resource).is_ok()
	}

	pub fn is_cancelled(&self) -> bool {
		self.tx.is_closed()
	}

	/// Waits until the coordinator drops this subscription.
	pub async fn cancelled(&self) {
		tokio::time::timeout(Duration::from_secs(2), self.tx.closed()).await.expect("subscription should be cancelled");
	}
}
