//! Public handle to a running search coordinator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::connectivity::spawn_connectivity_merge;
use crate::decision::SearchMode;
use crate::error::{CoordinatorError, Result};
use crate::ports::{Connectivity, ResourceSource, SearchPorts};
use crate::resource::Resource;
use crate::spawn::{TaskKind, spawn};

mod driver;

use driver::{Command, Driver, Outputs};

/// Handle to one search session.
///
/// Spawning starts the driver task, which issues the initial fetch decision,
/// and the connectivity merge task. Every operation is a command queued to
/// the driver, so state changes are applied one at a time in submission
/// order. Observable state is read through `watch` receivers.
///
/// Dropping the handle cancels both tasks and any in-flight fetch; use
/// [`Self::shutdown`] to also wait for them.
pub struct SearchCoordinator<T> {
	mode: SearchMode,
	commands: mpsc::Sender<Command>,
	current_query: watch::Receiver<String>,
	resource: watch::Receiver<Option<Resource<T>>>,
	transitions: broadcast::Sender<Resource<T>>,
	connectivity: watch::Receiver<Connectivity>,
	refreshing: watch::Receiver<bool>,
	empty_query: watch::Receiver<bool>,
	lifetime: CancellationToken,
	tasks: Mutex<Vec<JoinHandle<()>>>,
	shutdown_timeout: Duration,
}

impl<T> std::fmt::Debug for SearchCoordinator<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SearchCoordinator")
			.field("mode", &self.mode)
			.field("current_query", &*self.current_query.borrow())
			.field("connectivity", &*self.connectivity.borrow())
			.field("closed", &self.lifetime.is_cancelled())
			.finish_non_exhaustive()
	}
}

impl<T> Drop for SearchCoordinator<T> {
	fn drop(&mut self) {
		self.lifetime.cancel();
	}
}

impl<T> SearchCoordinator<T>
where
	T: Clone + Send + Sync + 'static,
{
	/// Starts a session for `initial_query`.
	///
	/// # Panics
	///
	/// Panics when called outside a Tokio runtime.
	pub fn spawn<S>(initial_query: impl Into<String>, ports: SearchPorts<S>, config: &CoordinatorConfig) -> Self
	where
		S: ResourceSource<Data = T>,
	{
		let initial_query = initial_query.into();
		let lifetime = CancellationToken::new();
		let (commands, command_rx) = mpsc::channel(config.command_capacity.max(1));
		let (flight_tx, flight_rx) = mpsc::unbounded_channel();
		let (connectivity_tx, connectivity) = watch::channel(ports.connectivity.current());
		let outputs = Outputs::new(&initial_query, config.event_buffer);

		let current_query = outputs.current_query.subscribe();
		let resource = outputs.resource.subscribe();
		let transitions = outputs.transitions.clone();
		let refreshing = outputs.refreshing.subscribe();
		let empty_query = outputs.empty_query.subscribe();

		tracing::debug!(
			mode = config.mode.as_str(),
			query = %initial_query,
			connectivity = connectivity.borrow().as_str(),
			"search.coordinator.start"
		);

		let merge = spawn_connectivity_merge(Arc::clone(&ports.connectivity), connectivity_tx, config.connectivity.clone(), lifetime.clone());
		let driver = Driver::new(config.mode, &ports, connectivity.clone(), initial_query, outputs, flight_tx, lifetime.clone());
		let driver = spawn(TaskKind::Driver, driver.run(command_rx, flight_rx));

		Self {
			mode: config.mode,
			commands,
			current_query,
			resource,
			transitions,
			connectivity,
			refreshing,
			empty_query,
			lifetime,
			tasks: Mutex::new(vec![driver, merge]),
			shutdown_timeout: config.shutdown_timeout(),
		}
	}

	async fn send(&self, cmd: Command) -> Result<()> {
		if self.lifetime.is_cancelled() {
			return Err(CoordinatorError::Closed);
		}
		self.commands.send(cmd).await.map_err(|_| CoordinatorError::Closed)
	}

	/// Updates the edit buffer without committing or fetching.
	pub async fn on_query_changed(&self, text: impl Into<String>) -> Result<()> {
		self.send(Command::QueryChanged(text.into())).await
	}

	/// Commits `text` and runs the fetch decision for it.
	pub async fn on_query_submitted(&self, text: impl Into<String>) -> Result<()> {
		self.send(Command::Submit(text.into())).await
	}

	/// Commits whatever the edit buffer holds once earlier edits have been
	/// applied, and runs the fetch decision for it.
	pub async fn on_search(&self) -> Result<()> {
		self.send(Command::SubmitCurrent).await
	}

	/// Empties the edit buffer. Does not fetch and keeps the current resource.
	pub async fn on_clear(&self) -> Result<()> {
		self.send(Command::Clear).await
	}

	/// Runs the fetch decision again for the committed query.
	pub async fn retry(&self) -> Result<()> {
		self.send(Command::Retry).await
	}

	/// Like [`Self::retry`], with the refreshing signal raised until the
	/// started fetch reaches `Success` or `Error`.
	///
	/// A refresh that starts no fetch leaves the signal down.
	pub async fn refresh(&self) -> Result<()> {
		self.send(Command::Refresh).await
	}

	pub async fn acknowledge_empty_query_warning(&self) -> Result<()> {
		self.send(Command::AcknowledgeEmptyQuery).await
	}

	/// Lowers the refreshing signal early, e.g. once the consumer has
	/// collected the refreshed resource.
	pub async fn acknowledge_refresh(&self) -> Result<()> {
		self.send(Command::AcknowledgeRefresh).await
	}

	/// Waits until every command sent before this call has been applied.
	pub async fn flush(&self) -> Result<()> {
		let (done, applied) = oneshot::channel();
		self.send(Command::Flush(done)).await?;
		applied.await.map_err(|_| CoordinatorError::Closed)
	}

	/// Tears the session down: cancels the connectivity subscription and any
	/// in-flight fetch, then waits for both tasks, aborting a task that does
	/// not stop within the configured timeout.
	pub async fn shutdown(&self) {
		self.lifetime.cancel();
		let tasks = std::mem::take(&mut *self.tasks.lock().await);
		for mut task in tasks {
			if tokio::time::timeout(self.shutdown_timeout, &mut task).await.is_err() {
				tracing::warn!(timeout = ?self.shutdown_timeout, "search.shutdown.timeout");
				task.abort();
			}
		}
		tracing::debug!("search.coordinator.stopped");
	}

	pub fn is_closed(&self) -> bool {
		self.lifetime.is_cancelled()
	}

	pub fn mode(&self) -> SearchMode {
		self.mode
	}

	pub fn current_query(&self) -> String {
		self.current_query.borrow().clone()
	}

	pub fn watch_current_query(&self) -> watch::Receiver<String> {
		self.current_query.clone()
	}

	/// Latest resource state; `None` until the first emission.
	pub fn resource(&self) -> Option<Resource<T>> {
		self.resource.borrow().clone()
	}

	pub fn watch_resource(&self) -> watch::Receiver<Option<Resource<T>>> {
		self.resource.clone()
	}

	/// Every resource transition from now on, in order.
	pub fn subscribe_resources(&self) -> broadcast::Receiver<Resource<T>> {
		self.transitions.subscribe()
	}

	pub fn connectivity(&self) -> Connectivity {
		*self.connectivity.borrow()
	}

	pub fn is_connected(&self) -> bool {
		self.connectivity().is_connected()
	}

	pub fn watch_connectivity(&self) -> watch::Receiver<Connectivity> {
		self.connectivity.clone()
	}

	pub fn is_refreshing(&self) -> bool {
		*self.refreshing.borrow()
	}

	pub fn watch_refreshing(&self) -> watch::Receiver<bool> {
		self.refreshing.clone()
	}

	/// One-shot warning that an empty query was submitted; stays raised until
	/// [`Self::acknowledge_empty_query_warning`].
	pub fn empty_query_warning(&self) -> bool {
		*self.empty_query.borrow()
	}

	pub fn watch_empty_query_warning(&self) -> watch::Receiver<bool> {
		self.empty_query.clone()
	}
}
