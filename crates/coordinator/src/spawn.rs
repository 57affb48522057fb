use std::future::Future;

use tokio::task::JoinHandle;

/// Tasks a coordinator runs besides its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TaskKind {
	/// The single-writer loop that owns coordinator state.
	Driver,
	/// Forwarding of one resource subscription.
	Fetch,
	/// The long-lived connectivity merge.
	Connectivity,
}

impl TaskKind {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Driver => "driver",
			Self::Fetch => "fetch",
			Self::Connectivity => "connectivity",
		}
	}
}

/// Spawns a coordinator task on the current Tokio runtime.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
pub(crate) fn spawn<F>(kind: TaskKind, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(task = kind.as_str(), "search.spawn");
	tokio::spawn(fut)
}
