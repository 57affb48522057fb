//! Forwarding of one resource subscription into the coordinator driver.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::epoch::{FetchEpoch, FetchTicket};
use crate::ports::ResourceStream;
use crate::resource::Resource;
use crate::spawn::{TaskKind, spawn};

/// Message from a forwarding task, tagged with the epoch it was started under.
#[derive(Debug)]
pub(crate) enum FlightEvent<T> {
	Emission { epoch: FetchEpoch, resource: Resource<T> },
	/// The subscription finished: stream exhausted or an `Error` was forwarded.
	Ended { epoch: FetchEpoch },
}

impl<T> FlightEvent<T> {
	pub fn epoch(&self) -> FetchEpoch {
		match self {
			Self::Emission { epoch, .. } | Self::Ended { epoch } => *epoch,
		}
	}
}

/// The single active fetch subscription of a coordinator.
#[derive(Debug)]
pub(crate) struct Flight {
	ticket: FetchTicket,
	query: String,
	/// Record the query in the freshness store on first success.
	persist: bool,
	persisted: bool,
	task: JoinHandle<()>,
}

impl Flight {
	/// Starts forwarding `stream` to `events`.
	pub fn start<T>(ticket: FetchTicket, query: String, persist: bool, stream: ResourceStream<T>, events: mpsc::UnboundedSender<FlightEvent<T>>) -> Self
	where
		T: Send + 'static,
	{
		let task = spawn(TaskKind::Fetch, forward(ticket.clone(), stream, events));
		Self {
			ticket,
			query,
			persist,
			persisted: false,
			task,
		}
	}

	pub fn epoch(&self) -> FetchEpoch {
		self.ticket.epoch()
	}

	pub fn query(&self) -> &str {
		&self.query
	}

	/// Claims the one-time freshness write for this flight.
	///
	/// Returns `true` exactly once, and only for flights started to persist.
	pub fn claim_persist(&mut self) -> bool {
		if !self.persist || self.persisted {
			return false;
		}
		self.persisted = true;
		true
	}

	/// Cancels the subscription and waits until its stream has been dropped.
	pub async fn cancel(self) {
		self.ticket.cancel();
		if let Err(err) = self.task.await
			&& err.is_panic()
		{
			tracing::warn!(epoch = %self.ticket.epoch(), "search.fetch.panicked");
		}
	}
}

async fn forward<T>(ticket: FetchTicket, mut stream: ResourceStream<T>, events: mpsc::UnboundedSender<FlightEvent<T>>) {
	let epoch = ticket.epoch();
	loop {
		let next = tokio::select! {
			biased;
			_ = ticket.cancelled() => return,
			next = stream.next() => next,
		};
		let Some(resource) = next else {
			break;
		};
		let failed = resource.is_error();
		if events.send(FlightEvent::Emission { epoch, resource }).is_err() {
			return;
		}
		if failed {
			break;
		}
	}
	let _ = events.send(FlightEvent::Ended { epoch });
}
