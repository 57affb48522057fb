//! Connectivity merge and a manually driven monitor.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectivityConfig;
use crate::ports::{Connectivity, ConnectivityMonitor, ConnectivityStream, NetworkStatus};
use crate::spawn::{TaskKind, spawn};

/// Spawns the long-lived task that folds monitor transitions into `state`.
///
/// The task is the only writer of `state`. It runs until `cancel` fires and is
/// independent of fetch activity. When the monitor's stream ends the state
/// drops to [`Connectivity::Disconnected`] and the task resubscribes within
/// the budget in `config`. A stream that delivered any status restores the
/// full budget.
pub(crate) fn spawn_connectivity_merge(
	monitor: Arc<dyn ConnectivityMonitor>,
	state: watch::Sender<Connectivity>,
	config: ConnectivityConfig,
	cancel: CancellationToken,
) -> JoinHandle<()> {
	spawn(TaskKind::Connectivity, run_merge(monitor, state, config, cancel))
}

async fn run_merge(monitor: Arc<dyn ConnectivityMonitor>, state: watch::Sender<Connectivity>, config: ConnectivityConfig, cancel: CancellationToken) {
	let mut resubscriptions = 0usize;
	loop {
		let mut stream = monitor.subscribe();
		let mut delivered = false;
		loop {
			let next = tokio::select! {
				biased;
				_ = cancel.cancelled() => return,
				next = stream.next() => next,
			};
			let Some(status) = next else {
				break;
			};
			delivered = true;
			publish(&state, Connectivity::from(status));
		}
		if delivered {
			resubscriptions = 0;
		}

		publish(&state, Connectivity::Disconnected);
		if resubscriptions >= config.resubscribe_attempts {
			tracing::warn!(resubscriptions, "search.connectivity.ended");
			return;
		}
		resubscriptions += 1;
		tracing::debug!(attempt = resubscriptions, "search.connectivity.resubscribe");

		tokio::select! {
			_ = cancel.cancelled() => return,
			_ = tokio::time::sleep(config.resubscribe_backoff()) => {}
		}
	}
}

fn publish(state: &watch::Sender<Connectivity>, next: Connectivity) {
	let changed = state.send_if_modified(|current| {
		if *current == next {
			return false;
		}
		*current = next;
		true
	});
	if changed {
		tracing::debug!(connectivity = next.as_str(), "search.connectivity");
	}
}

/// Connectivity monitor driven by the embedding application.
///
/// Clones share the same state. Every subscription yields the status current
/// when it subscribed, then each later transition.
#[derive(Debug, Clone)]
pub struct ManualConnectivity {
	tx: Arc<watch::Sender<Connectivity>>,
}

impl ManualConnectivity {
	pub fn new(initial: Connectivity) -> Self {
		let (tx, _) = watch::channel(initial);
		Self { tx: Arc::new(tx) }
	}

	pub fn online() -> Self {
		Self::new(Connectivity::Connected)
	}

	pub fn offline() -> Self {
		Self::new(Connectivity::Disconnected)
	}

	/// Publishes a transition to every subscriber.
	pub fn set(&self, status: NetworkStatus) {
		self.tx.send_replace(status.into());
	}
}

impl ConnectivityMonitor for ManualConnectivity {
	fn current(&self) -> Connectivity {
		*self.tx.borrow()
	}

	fn subscribe(&self) -> ConnectivityStream {
		let mut rx = self.tx.subscribe();
		rx.mark_changed();
		futures::stream::unfold(rx, |mut rx| async move {
			rx.changed().await.ok()?;
			let status = match *rx.borrow_and_update() {
				Connectivity::Connected => NetworkStatus::Available,
				Connectivity::Disconnected => NetworkStatus::Unavailable,
			};
			Some((status, rx))
		})
		.boxed()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	use super::*;

	fn no_retry() -> ConnectivityConfig {
		ConnectivityConfig {
			resubscribe_attempts: 0,
			resubscribe_backoff_ms: 0,
		}
	}

	async fn wait_for(rx: &mut watch::Receiver<Connectivity>, expected: Connectivity) {
		tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|c| *c == expected))
			.await
			.expect("connectivity should settle")
			.expect("state sender alive");
	}

	#[tokio::test]
	async fn merge_follows_manual_transitions() {
		let monitor = ManualConnectivity::offline();
		let (state, mut rx) = watch::channel(monitor.current());
		let cancel = CancellationToken::new();
		let task = spawn_connectivity_merge(Arc::new(monitor.clone()), state, no_retry(), cancel.clone());
		tokio::task::yield_now().await;

		monitor.set(NetworkStatus::Available);
		wait_for(&mut rx, Connectivity::Connected).await;
		monitor.set(NetworkStatus::Unavailable);
		wait_for(&mut rx, Connectivity::Disconnected).await;

		cancel.cancel();
		tokio::time::timeout(Duration::from_secs(1), task).await.expect("merge stops on cancel").expect("merge task joins");
	}

	/// Emits `per_subscription` statuses on every subscription, then ends.
	struct FlakyMonitor {
		subscriptions: Arc<AtomicUsize>,
		per_subscription: usize,
	}

	impl ConnectivityMonitor for FlakyMonitor {
		fn current(&self) -> Connectivity {
			Connectivity::Connected
		}

		fn subscribe(&self) -> ConnectivityStream {
			self.subscriptions.fetch_add(1, Ordering::SeqCst);
			futures::stream::iter(std::iter::repeat_n(NetworkStatus::Available, self.per_subscription)).boxed()
		}
	}

	fn flaky(per_subscription: usize) -> (FlakyMonitor, Arc<AtomicUsize>) {
		let subscriptions = Arc::new(AtomicUsize::new(0));
		let monitor = FlakyMonitor {
			subscriptions: Arc::clone(&subscriptions),
			per_subscription,
		};
		(monitor, subscriptions)
	}

	fn two_quick_retries() -> ConnectivityConfig {
		ConnectivityConfig {
			resubscribe_attempts: 2,
			resubscribe_backoff_ms: 1,
		}
	}

	#[tokio::test]
	async fn silent_streams_exhaust_the_budget() {
		let (monitor, subscriptions) = flaky(0);
		let (state, mut rx) = watch::channel(Connectivity::Connected);
		let task = spawn_connectivity_merge(Arc::new(monitor), state, two_quick_retries(), CancellationToken::new());

		tokio::time::timeout(Duration::from_secs(2), task).await.expect("merge gives up").expect("merge task joins");
		assert_eq!(subscriptions.load(Ordering::SeqCst), 3, "initial subscription plus two retries");
		wait_for(&mut rx, Connectivity::Disconnected).await;
	}

	#[tokio::test]
	async fn delivering_stream_restores_the_budget() {
		let (monitor, subscriptions) = flaky(1);
		let (state, _rx) = watch::channel(Connectivity::Connected);
		let cancel = CancellationToken::new();
		let task = spawn_connectivity_merge(Arc::new(monitor), state, two_quick_retries(), cancel.clone());

		tokio::time::timeout(Duration::from_secs(2), async {
			while subscriptions.load(Ordering::SeqCst) < 6 {
				tokio::time::sleep(Duration::from_millis(1)).await;
			}
		})
		.await
		.expect("merge keeps resubscribing past the budget");
		assert!(!task.is_finished());

		cancel.cancel();
		tokio::time::timeout(Duration::from_secs(1), task).await.expect("merge stops on cancel").expect("merge task joins");
	}
}
