use tokio::sync::watch;

/// Acknowledge-gated boolean signal.
///
/// Once raised the signal stays up until it is acknowledged. Raising a signal
/// that is already up changes nothing and wakes no watcher.
#[derive(Debug)]
pub(crate) struct OneShotSignal {
	tx: watch::Sender<bool>,
}

impl OneShotSignal {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(false);
		Self { tx }
	}

	/// Raises the signal. Returns `false` if it was already raised.
	pub fn raise(&self) -> bool {
		self.tx.send_if_modified(|raised| {
			if *raised {
				return false;
			}
			*raised = true;
			true
		})
	}

	/// Lowers the signal. Returns `false` if it was not raised.
	pub fn acknowledge(&self) -> bool {
		self.tx.send_if_modified(|raised| {
			if !*raised {
				return false;
			}
			*raised = false;
			true
		})
	}

	pub fn subscribe(&self) -> watch::Receiver<bool> {
		self.tx.subscribe()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn raise_is_not_rearmed_until_acknowledged() {
		let signal = OneShotSignal::new();
		let mut rx = signal.subscribe();

		assert!(signal.raise());
		assert!(rx.has_changed().unwrap_or(false));
		rx.mark_unchanged();

		assert!(!signal.raise(), "second raise must be a no-op");
		assert!(!rx.has_changed().unwrap_or(true));
		assert!(*rx.borrow());

		assert!(signal.acknowledge());
		assert!(!*rx.borrow());
		assert!(!signal.acknowledge());

		assert!(signal.raise(), "raises again once acknowledged");
	}
}
