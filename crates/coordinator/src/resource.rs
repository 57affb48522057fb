use crate::error::FetchError;

/// State of one asynchronous fetch as emitted by a [`ResourceSource`](crate::ResourceSource).
///
/// Each emission replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
	/// The fetch is in progress.
	Loading,
	/// The fetch produced data.
	Success(T),
	/// The fetch failed; terminal for the subscription that emitted it.
	Error(FetchError),
}

impl<T> Resource<T> {
	/// Returns `true` for `Success` and `Error`.
	pub const fn is_terminal(&self) -> bool {
		matches!(self, Self::Success(_) | Self::Error(_))
	}

	pub const fn is_loading(&self) -> bool {
		matches!(self, Self::Loading)
	}

	pub const fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	pub const fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	/// Returns the data of a `Success`.
	pub fn data(&self) -> Option<&T> {
		match self {
			Self::Success(data) => Some(data),
			_ => None,
		}
	}

	/// Returns the cause of an `Error`.
	pub fn error(&self) -> Option<&FetchError> {
		match self {
			Self::Error(err) => Some(err),
			_ => None,
		}
	}

	/// Maps the success payload, keeping the variant.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
		match self {
			Self::Loading => Resource::Loading,
			Self::Success(data) => Resource::Success(f(data)),
			Self::Error(err) => Resource::Error(err),
		}
	}

	/// Short variant name for logs.
	pub(crate) const fn as_str(&self) -> &'static str {
		match self {
			Self::Loading => "loading",
			Self::Success(_) => "success",
			Self::Error(_) => "error",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_success_and_error_are_terminal() {
		assert!(!Resource::<u8>::Loading.is_terminal());
		assert!(Resource::Success(1u8).is_terminal());
		assert!(Resource::<u8>::Error(FetchError::Other("x".into())).is_terminal());
	}

	#[test]
	fn map_keeps_error_cause() {
		let err = FetchError::Network("timed out".into());
		let mapped = Resource::<u8>::Error(err.clone()).map(|n| n.to_string());
		assert_eq!(mapped.error(), Some(&err));
		assert_eq!(Resource::Success(2u8).map(|n| n * 2).data(), Some(&4));
	}
}
