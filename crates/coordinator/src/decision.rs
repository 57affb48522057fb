//! Fetch-or-reuse decision.

use serde::Deserialize;

use crate::ports::Connectivity;

/// Coordinator flavour.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
	/// Every request fetches; no freshness check, no connectivity gate, no
	/// empty-query warning.
	Simple,
	/// Reuses the last successful query, gates new queries on connectivity
	/// and warns about empty queries.
	#[default]
	Advanced,
}

impl SearchMode {
	/// Decides what a fetch request for `committed` should do in this mode.
	pub fn decide(self, committed: &str, last_fetched: Option<&str>, connectivity: Connectivity) -> FetchDecision {
		match self {
			Self::Simple => FetchDecision::Fresh,
			Self::Advanced => decide(committed, last_fetched, connectivity),
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Simple => "simple",
			Self::Advanced => "advanced",
		}
	}
}

/// Outcome of evaluating one fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
	/// The committed query is empty: warn, do not fetch.
	EmptyQuery,
	/// The query was the last one fetched successfully: resubscribe without
	/// the connectivity gate.
	Reuse,
	/// A new query while connected: fetch and record it on success.
	Fresh,
	/// A new query while disconnected: leave everything as it is.
	Offline,
}

impl FetchDecision {
	/// Returns `true` when the decision starts a subscription.
	pub const fn fetches(self) -> bool {
		matches!(self, Self::Reuse | Self::Fresh)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::EmptyQuery => "empty_query",
			Self::Reuse => "reuse",
			Self::Fresh => "fresh",
			Self::Offline => "offline",
		}
	}
}

/// Three-way decision of the advanced coordinator.
///
/// Queries compare exactly as typed; case and whitespace are significant.
pub fn decide(committed: &str, last_fetched: Option<&str>, connectivity: Connectivity) -> FetchDecision {
	if committed.is_empty() {
		FetchDecision::EmptyQuery
	} else if last_fetched == Some(committed) {
		FetchDecision::Reuse
	} else if connectivity.is_connected() {
		FetchDecision::Fresh
	} else {
		FetchDecision::Offline
	}
}
