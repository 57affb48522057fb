use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::decision::{FetchDecision, SearchMode};
use crate::epoch::{EpochClock, FetchTicket};
use crate::flight::{Flight, FlightEvent};
use crate::ports::{Connectivity, FreshnessStore, ResourceSource, SearchPorts};
use crate::query::QueryState;
use crate::resource::Resource;
use crate::signal::OneShotSignal;

/// Command sent from a [`SearchCoordinator`](super::SearchCoordinator) handle to its driver.
#[derive(Debug)]
pub(super) enum Command {
	QueryChanged(String),
	Submit(String),
	/// Commits the edit buffer as it stands when the driver reaches this command.
	SubmitCurrent,
	Retry,
	Refresh,
	Clear,
	AcknowledgeEmptyQuery,
	AcknowledgeRefresh,
	Flush(oneshot::Sender<()>),
}

/// What asked for a fetch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Trigger {
	Initial,
	Submit,
	Retry,
	Refresh,
}

impl Trigger {
	const fn as_str(self) -> &'static str {
		match self {
			Self::Initial => "initial",
			Self::Submit => "submit",
			Self::Retry => "retry",
			Self::Refresh => "refresh",
		}
	}
}

/// Write side of every consumer-observable value except connectivity.
pub(super) struct Outputs<T> {
	pub current_query: watch::Sender<String>,
	pub resource: watch::Sender<Option<Resource<T>>>,
	pub transitions: broadcast::Sender<Resource<T>>,
	pub refreshing: OneShotSignal,
	pub empty_query: OneShotSignal,
}

impl<T> Outputs<T>
where
	T: Clone,
{
	pub fn new(initial_query: &str, event_buffer: usize) -> Self {
		Self {
			current_query: watch::channel(initial_query.to_owned()).0,
			resource: watch::channel(None).0,
			transitions: broadcast::channel(event_buffer.max(1)).0,
			refreshing: OneShotSignal::new(),
			empty_query: OneShotSignal::new(),
		}
	}
}

/// Single writer of coordinator state.
///
/// Commands, flight emissions and teardown are handled one at a time by
/// [`Driver::run`]; nothing else mutates the fields below.
pub(super) struct Driver<S>
where
	S: ResourceSource,
{
	mode: SearchMode,
	source: Arc<S>,
	freshness: Arc<dyn FreshnessStore>,
	connectivity: watch::Receiver<Connectivity>,
	query: QueryState,
	clock: EpochClock,
	flight: Option<Flight>,
	/// A refresh raised the refreshing signal and waits for a terminal state.
	refresh_pending: bool,
	outputs: Outputs<S::Data>,
	flight_tx: mpsc::UnboundedSender<FlightEvent<S::Data>>,
	lifetime: CancellationToken,
}

impl<S> Driver<S>
where
	S: ResourceSource,
{
	pub fn new(
		mode: SearchMode,
		ports: &SearchPorts<S>,
		connectivity: watch::Receiver<Connectivity>,
		initial_query: String,
		outputs: Outputs<S::Data>,
		flight_tx: mpsc::UnboundedSender<FlightEvent<S::Data>>,
		lifetime: CancellationToken,
	) -> Self {
		Self {
			mode,
			source: Arc::clone(&ports.source),
			freshness: Arc::clone(&ports.freshness),
			connectivity,
			query: QueryState::new(initial_query),
			clock: EpochClock::new(),
			flight: None,
			refresh_pending: false,
			outputs,
			flight_tx,
			lifetime,
		}
	}

	pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, mut flights: mpsc::UnboundedReceiver<FlightEvent<S::Data>>) {
		self.request_fetch(Trigger::Initial).await;

		loop {
			tokio::select! {
				biased;
				_ = self.lifetime.cancelled() => break,
				Some(event) = flights.recv() => self.on_flight_event(event).await,
				cmd = commands.recv() => {
					let Some(cmd) = cmd else {
						break;
					};
					self.handle(cmd).await;
				}
			}
		}

		self.stop().await;
		tracing::debug!(epoch = %self.clock.current(), "search.driver.exit");
	}

	pub async fn handle(&mut self, cmd: Command) {
		match cmd {
			Command::QueryChanged(text) => {
				self.query.edit(text);
				self.publish_current_query();
			}
			Command::Submit(text) => {
				self.query.commit(text);
				self.publish_current_query();
				self.request_fetch(Trigger::Submit).await;
			}
			Command::SubmitCurrent => {
				self.query.commit_current();
				self.request_fetch(Trigger::Submit).await;
			}
			Command::Retry => self.request_fetch(Trigger::Retry).await,
			Command::Refresh => self.request_fetch(Trigger::Refresh).await,
			Command::Clear => {
				self.query.clear();
				self.publish_current_query();
			}
			Command::AcknowledgeEmptyQuery => {
				self.outputs.empty_query.acknowledge();
			}
			Command::AcknowledgeRefresh => {
				self.refresh_pending = false;
				self.outputs.refreshing.acknowledge();
			}
			Command::Flush(done) => {
				let _ = done.send(());
			}
		}
	}

	/// Runs the fetch decision for the committed query and acts on it.
	pub async fn request_fetch(&mut self, trigger: Trigger) {
		let committed = self.query.committed().to_owned();
		// Simple mode never consults the freshness store.
		let last_fetched = match self.mode {
			SearchMode::Simple => None,
			SearchMode::Advanced => self.last_fetched_query().await,
		};
		let connectivity = *self.connectivity.borrow();
		let decision = self.mode.decide(&committed, last_fetched.as_deref(), connectivity);
		tracing::debug!(
			mode = self.mode.as_str(),
			trigger = trigger.as_str(),
			query = %committed,
			decision = decision.as_str(),
			"search.decide"
		);

		if !decision.fetches() {
			if decision == FetchDecision::EmptyQuery && !self.outputs.empty_query.raise() {
				tracing::trace!("search.empty_query.unacknowledged");
			}
			self.settle_refresh_without_fetch(trigger);
			return;
		}

		if trigger == Trigger::Refresh {
			self.refresh_pending = true;
			self.outputs.refreshing.raise();
		}
		let persist = self.mode == SearchMode::Advanced && decision == FetchDecision::Fresh;
		self.start_flight(committed, persist).await;
	}

	/// A refresh that starts nothing must not leave a spinner behind. A refresh
	/// still waiting on an earlier flight resolves with that flight.
	fn settle_refresh_without_fetch(&mut self, trigger: Trigger) {
		if trigger == Trigger::Refresh && !self.refresh_pending {
			self.outputs.refreshing.acknowledge();
		}
	}

	async fn start_flight(&mut self, query: String, persist: bool) {
		if let Some(previous) = self.flight.take() {
			tracing::debug!(epoch = %previous.epoch(), query = previous.query(), "search.fetch.cancel");
			previous.cancel().await;
		}

		let epoch = self.clock.advance();
		let ticket = FetchTicket::new(epoch, self.lifetime.child_token());
		let stream = self.source.subscribe(&query);
		tracing::debug!(epoch = %epoch, query = %query, persist, "search.fetch.start");
		self.flight = Some(Flight::start(ticket, query, persist, stream, self.flight_tx.clone()));
	}

	pub async fn on_flight_event(&mut self, event: FlightEvent<S::Data>) {
		let epoch = event.epoch();
		if !self.clock.is_current(epoch) {
			tracing::trace!(epoch = %epoch, current = %self.clock.current(), "search.fetch.stale");
			return;
		}

		match event {
			FlightEvent::Emission { resource, .. } => {
				let terminal = resource.is_terminal();
				let success = resource.is_success();
				tracing::trace!(epoch = %epoch, state = resource.as_str(), "search.fetch.emission");
				self.publish_resource(resource);
				if success {
					self.persist_success().await;
				}
				if terminal {
					self.settle_refresh();
				}
			}
			FlightEvent::Ended { .. } => {
				tracing::debug!(epoch = %epoch, "search.fetch.end");
				self.stop().await;
				self.settle_refresh();
			}
		}
	}

	fn settle_refresh(&mut self) {
		if std::mem::take(&mut self.refresh_pending) {
			self.outputs.refreshing.acknowledge();
		}
	}

	async fn persist_success(&mut self) {
		let Some(flight) = self.flight.as_mut() else {
			return;
		};
		if !flight.claim_persist() {
			return;
		}
		let query = flight.query().to_owned();
		match self.freshness.set_last_query(&query).await {
			Ok(()) => tracing::debug!(query = %query, "search.freshness.recorded"),
			Err(err) => tracing::warn!(query = %query, error = %err, "search.freshness.write_failed"),
		}
	}

	async fn last_fetched_query(&self) -> Option<String> {
		match self.freshness.last_query().await {
			Ok(query) => query,
			Err(err) => {
				tracing::warn!(error = %err, "search.freshness.read_failed");
				None
			}
		}
	}

	fn publish_resource(&self, resource: Resource<S::Data>) {
		self.outputs.resource.send_replace(Some(resource.clone()));
		let _ = self.outputs.transitions.send(resource);
	}

	fn publish_current_query(&self) {
		let current = self.query.current();
		self.outputs.current_query.send_if_modified(|published| {
			if published == current {
				return false;
			}
			current.clone_into(published);
			true
		});
	}

	/// Cancels the active flight, if any, and waits for its stream to drop.
	pub async fn stop(&mut self) {
		if let Some(flight) = self.flight.take() {
			flight.cancel().await;
		}
	}
}
