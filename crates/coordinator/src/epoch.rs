use std::fmt;

use tokio_util::sync::CancellationToken;

/// Generation number of one fetch subscription.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FetchEpoch(u64);

impl fmt::Display for FetchEpoch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Monotonic epoch counter owned by the coordinator driver.
///
/// Starts at epoch 0, which no fetch ever carries.
#[derive(Debug, Default)]
pub(crate) struct EpochClock {
	current: FetchEpoch,
}

impl EpochClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Epoch of the most recently started fetch.
	pub const fn current(&self) -> FetchEpoch {
		self.current
	}

	/// Moves to the next epoch and returns it.
	pub fn advance(&mut self) -> FetchEpoch {
		self.current = FetchEpoch(self.current.0 + 1);
		self.current
	}

	/// Returns `true` when `epoch` belongs to the most recently started fetch.
	pub fn is_current(&self, epoch: FetchEpoch) -> bool {
		epoch == self.current
	}
}

/// Epoch-scoped cancellation handle for one fetch subscription.
#[derive(Debug, Clone)]
pub(crate) struct FetchTicket {
	epoch: FetchEpoch,
	cancel: CancellationToken,
}

impl FetchTicket {
	pub fn new(epoch: FetchEpoch, cancel: CancellationToken) -> Self {
		Self { epoch, cancel }
	}

	pub const fn epoch(&self) -> FetchEpoch {
		self.epoch
	}

	/// Requests that the subscription stop forwarding and drop its stream.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn advance_is_strictly_increasing() {
		let mut clock = EpochClock::new();
		let mut previous = clock.current();
		for _ in 0..16 {
			let next = clock.advance();
			assert!(next > previous);
			assert!(clock.is_current(next));
			assert!(!clock.is_current(previous));
			previous = next;
		}
		assert_eq!(previous, FetchEpoch(16));
	}

	#[test]
	fn ticket_follows_parent_cancellation() {
		let lifetime = CancellationToken::new();
		let child = lifetime.child_token();
		let _ticket = FetchTicket::new(EpochClock::new().advance(), child.clone());
		assert!(!child.is_cancelled());
		lifetime.cancel();
		assert!(child.is_cancelled());
	}

	#[test]
	fn ticket_cancel_does_not_reach_parent() {
		let lifetime = CancellationToken::new();
		let child = lifetime.child_token();
		let ticket = FetchTicket::new(EpochClock::new().advance(), child.clone());
		ticket.cancel();
		assert!(child.is_cancelled());
		assert!(!lifetime.is_cancelled());
	}
}
