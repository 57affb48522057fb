/// Live edit buffer and the query a fetch decision is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QueryState {
	current: String,
	committed: String,
}

impl QueryState {
	/// Starts with both roles set to `initial`.
	pub fn new(initial: String) -> Self {
		Self {
			current: initial.clone(),
			committed: initial,
		}
	}

	pub fn current(&self) -> &str {
		&self.current
	}

	pub fn committed(&self) -> &str {
		&self.committed
	}

	/// Typing: touches the edit buffer only.
	pub fn edit(&mut self, text: String) {
		self.current = text;
	}

	/// Searching: the submitted text becomes both the buffer and the committed query.
	pub fn commit(&mut self, text: String) {
		self.current.clone_from(&text);
		self.committed = text;
	}

	/// Commits the edit buffer unchanged.
	pub fn commit_current(&mut self) {
		self.committed.clone_from(&self.current);
	}

	/// Empties the edit buffer, keeping the committed query.
	pub fn clear(&mut self) {
		self.current.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn editing_never_commits() {
		let mut query = QueryState::new("alpha".into());
		query.edit("alp".into());
		assert_eq!((query.current(), query.committed()), ("alp", "alpha"));

		query.clear();
		assert_eq!((query.current(), query.committed()), ("", "alpha"));

		query.commit("beta".into());
		assert_eq!((query.current(), query.committed()), ("beta", "beta"));
	}

	#[test]
	fn commit_current_keeps_the_buffer() {
		let mut query = QueryState::new("alpha".into());
		query.edit("beta".into());
		query.commit_current();
		assert_eq!((query.current(), query.committed()), ("beta", "beta"));
	}
}
