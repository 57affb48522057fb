//! Line commands and the state printer for the interactive session.

use std::fmt;

use seeker_coordinator::{Connectivity, Resource, SearchCoordinator};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const HELP: &str = "\
commands:
  type <text>    edit the query without searching
  search [text]  submit text (or the edited query)
  retry          run the last submitted query again
  refresh        like retry, with the refresh indicator
  clear          empty the edit buffer
  ack            acknowledge the empty-query warning
  done           acknowledge the refresh indicator
  online|offline simulate a connectivity change
  status         print the current state
  help           show this text
  quit           shut down and exit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
	Type(String),
	/// `None` submits the current edit buffer.
	Search(Option<String>),
	Retry,
	Refresh,
	Clear,
	AckWarning,
	AckRefresh,
	Online,
	Offline,
	Status,
	Help,
	Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown command {:?}, try `help`", self.0)
	}
}

impl std::error::Error for ParseError {}

impl ReplCommand {
	/// Parses one line. Blank lines yield `Ok(None)`.
	pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
		let line = line.trim();
		if line.is_empty() {
			return Ok(None);
		}
		let (word, rest) = match line.split_once(char::is_whitespace) {
			Some((word, rest)) => (word, rest.trim()),
			None => (line, ""),
		};

		let cmd = match word {
			"type" | "t" => Self::Type(rest.to_owned()),
			"search" | "s" => Self::Search((!rest.is_empty()).then(|| rest.to_owned())),
			"retry" | "r" => Self::Retry,
			"refresh" => Self::Refresh,
			"clear" => Self::Clear,
			"ack" => Self::AckWarning,
			"done" => Self::AckRefresh,
			"online" => Self::Online,
			"offline" => Self::Offline,
			"status" => Self::Status,
			"help" | "?" => Self::Help,
			"quit" | "q" | "exit" => Self::Quit,
			_ => return Err(ParseError(word.to_owned())),
		};
		Ok(Some(cmd))
	}
}

pub fn describe(resource: &Resource<Vec<String>>) -> String {
	match resource {
		Resource::Loading => "loading...".to_owned(),
		Resource::Success(items) if items.is_empty() => "no results".to_owned(),
		Resource::Success(items) => format!("{} result(s): {}", items.len(), items.join(", ")),
		Resource::Error(err) => format!("error: {err}"),
	}
}

pub fn status_line(coordinator: &SearchCoordinator<Vec<String>>) -> String {
	let resource = coordinator.resource().map_or_else(|| "idle".to_owned(), |r| describe(&r));
	format!(
		"[{}] query={:?} {} refreshing={} warning={} | {}",
		coordinator.mode().as_str(),
		coordinator.current_query(),
		connectivity_label(coordinator.connectivity()),
		coordinator.is_refreshing(),
		coordinator.empty_query_warning(),
		resource,
	)
}

fn connectivity_label(connectivity: Connectivity) -> &'static str {
	if connectivity.is_connected() { "online" } else { "offline" }
}

/// Prints every observable change until aborted or the coordinator stops.
pub fn spawn_printer(coordinator: &SearchCoordinator<Vec<String>>) -> JoinHandle<()> {
	let mut transitions = coordinator.subscribe_resources();
	let mut connectivity = coordinator.watch_connectivity();
	let mut refreshing = coordinator.watch_refreshing();
	let mut warning = coordinator.watch_empty_query_warning();

	tokio::spawn(async move {
		loop {
			tokio::select! {
				next = transitions.recv() => match next {
					Ok(resource) => println!("  {}", describe(&resource)),
					Err(broadcast::error::RecvError::Lagged(missed)) => {
						tracing::warn!(missed, "repl.printer.lagged");
					}
					Err(broadcast::error::RecvError::Closed) => break,
				},
				changed = connectivity.changed() => {
					if changed.is_err() {
						break;
					}
					let now = *connectivity.borrow_and_update();
					println!("  network {}", connectivity_label(now));
				}
				changed = refreshing.changed() => {
					if changed.is_err() {
						break;
					}
					if *refreshing.borrow_and_update() {
						println!("  refreshing...");
					}
				}
				changed = warning.changed() => {
					if changed.is_err() {
						break;
					}
					if *warning.borrow_and_update() {
						println!("  warning: empty query, nothing searched (`ack` to dismiss)");
					}
				}
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;
	use seeker_coordinator::FetchError;

	use super::*;

	#[rstest]
	#[case("type rust lang", ReplCommand::Type("rust lang".into()))]
	#[case("t", ReplCommand::Type(String::new()))]
	#[case("search  tokio ", ReplCommand::Search(Some("tokio".into())))]
	#[case("s", ReplCommand::Search(None))]
	#[case("retry", ReplCommand::Retry)]
	#[case("refresh", ReplCommand::Refresh)]
	#[case("clear", ReplCommand::Clear)]
	#[case("ack", ReplCommand::AckWarning)]
	#[case("done", ReplCommand::AckRefresh)]
	#[case("offline", ReplCommand::Offline)]
	#[case("  quit  ", ReplCommand::Quit)]
	fn parses_commands(#[case] line: &str, #[case] expected: ReplCommand) {
		assert_eq!(ReplCommand::parse(line), Ok(Some(expected)));
	}

	#[test]
	fn blank_line_is_no_command() {
		assert_eq!(ReplCommand::parse("   "), Ok(None));
	}

	#[test]
	fn unknown_command_is_reported() {
		let err = ReplCommand::parse("frobnicate now").expect_err("unknown word");
		assert_eq!(err, ParseError("frobnicate".into()));
		assert!(err.to_string().contains("help"));
	}

	#[test]
	fn describes_each_state() {
		assert_eq!(describe(&Resource::Loading), "loading...");
		assert_eq!(describe(&Resource::Success(Vec::new())), "no results");
		assert_eq!(describe(&Resource::Success(vec!["a".into(), "b".into()])), "2 result(s): a, b");
		assert_eq!(describe(&Resource::Error(FetchError::Other("boom".into()))), "error: boom");
	}
}
