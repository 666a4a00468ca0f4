//! Line-oriented shell standing in for the shop's screens.
//!
//! Each input line is one command acting on the current wizard screen. The
//! shell prints the outcome and, after navigation, the new screen's options.

use cupcake_core::{OrderWizard, ShopEngine, SubmitError};
use cupcake_history::HistoryView;
use cupcake_types::{format_price, WizardStep};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Start screen pictures, switched by the catalog's picture variant flag.
const PICTURE_DEFAULT: &str = "cupcake picture";
const PICTURE_VARIANT: &str = "cupcake picture, new look";

/// Errors from parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
	#[error("Unknown command '{0}', try 'help'")]
	Unknown(String),
	#[error("'{0}' needs an argument")]
	MissingArgument(&'static str),
	#[error("'{0}' is not a number")]
	InvalidNumber(String),
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Quantity(u32),
	Flavor(String),
	Date(String),
	Next,
	Back,
	Cancel,
	Submit,
	History,
	Status,
	Options,
	Help,
	Quit,
}

impl FromStr for Command {
	type Err = CommandError;

	fn from_str(line: &str) -> Result<Self, Self::Err> {
		let line = line.trim();
		let (word, rest) = match line.split_once(char::is_whitespace) {
			Some((word, rest)) => (word, rest.trim()),
			None => (line, ""),
		};

		let argument = |name: &'static str| {
			if rest.is_empty() {
				Err(CommandError::MissingArgument(name))
			} else {
				Ok(rest.to_string())
			}
		};

		match word.to_ascii_lowercase().as_str() {
			"quantity" => {
				let value = argument("quantity")?;
				value
					.parse()
					.map(Command::Quantity)
					.map_err(|_| CommandError::InvalidNumber(value))
			},
			"flavor" | "flavour" => argument("flavor").map(Command::Flavor),
			"date" => argument("date").map(Command::Date),
			"next" => Ok(Command::Next),
			"back" => Ok(Command::Back),
			"cancel" => Ok(Command::Cancel),
			"submit" => Ok(Command::Submit),
			"history" => Ok(Command::History),
			"status" => Ok(Command::Status),
			"options" => Ok(Command::Options),
			"help" => Ok(Command::Help),
			"quit" | "exit" => Ok(Command::Quit),
			_ => Err(CommandError::Unknown(word.to_string())),
		}
	}
}

const HELP: &str = "Commands: quantity <n>, flavor <name>, date <label>, next, back, cancel, \
	submit, history, status, options, help, quit";

/// Interactive session over one wizard.
pub struct Shell<'a> {
	engine: &'a ShopEngine,
	wizard: OrderWizard,
	history_view: Option<HistoryView>,
	history_wait: Duration,
}

impl<'a> Shell<'a> {
	pub async fn new(engine: &'a ShopEngine) -> Self {
		// Leave the store its own timeout before giving up on the view
		let history_wait =
			Duration::from_secs(engine.config().history.list_timeout_seconds.saturating_add(1));
		Self {
			engine,
			wizard: engine.new_wizard().await,
			history_view: None,
			history_wait,
		}
	}

	pub fn wizard(&self) -> &OrderWizard {
		&self.wizard
	}

	/// Greeting and the start screen's options.
	pub async fn welcome(&self) -> Vec<String> {
		let session = self.engine.session().await;
		let mut lines = match session.greeting_name() {
			"" => vec!["Welcome to the cupcake shop!".to_string()],
			name => vec![format!("Welcome to the cupcake shop, {}!", name)],
		};
		lines.extend(self.options());
		lines
	}

	/// Runs one command and returns the lines to print.
	pub async fn execute(&mut self, command: Command) -> Vec<String> {
		let result = match command {
			Command::Quantity(n) => self.wizard.select_quantity(n).map(|_| self.screen()),
			Command::Flavor(flavor) => self
				.wizard
				.select_flavor(&flavor)
				.map(|_| vec![self.subtotal()]),
			Command::Date(date) => self
				.wizard
				.select_date(&date)
				.map(|_| vec![self.subtotal()]),
			Command::Next => self.wizard.next().map(|_| self.screen()),
			Command::Back => {
				let result = self.wizard.back().map(|_| self.screen());
				if self.wizard.step() != WizardStep::History {
					self.history_view = None;
				}
				result
			},
			Command::Cancel => {
				self.wizard.cancel();
				self.history_view = None;
				Ok(self.screen())
			},
			Command::Submit => return self.submit(),
			Command::History => return self.history().await,
			Command::Status => Ok(self.status()),
			Command::Options => Ok(self.options()),
			Command::Help => Ok(vec![HELP.to_string()]),
			Command::Quit => Ok(Vec::new()),
		};
		result.unwrap_or_else(|e| vec![e.to_string()])
	}

	fn submit(&mut self) -> Vec<String> {
		match self.wizard.submit() {
			Ok(submission) => {
				let order = submission.order;
				// The save finishes in the background
				drop(submission.save);
				let mut lines = vec![format!(
					"Order sent: {} x {} for {}, pickup {}",
					order.quantity,
					order.flavor,
					format_price(order.price),
					order.pickup_date
				)];
				lines.extend(self.screen());
				lines
			},
			Err(e @ (SubmitError::OutOfStock { .. } | SubmitError::DateTooClose { .. })) => {
				vec![format!("Cannot place order: {}", e)]
			},
			Err(e) => vec![e.to_string()],
		}
	}

	async fn history(&mut self) -> Vec<String> {
		if let Err(e) = self.wizard.open_history() {
			return vec![e.to_string()];
		}
		let Some(mut view) = self.engine.open_history_view().await else {
			return vec!["Sign in to see your orders".to_string()];
		};

		if tokio::time::timeout(self.history_wait, view.changed())
			.await
			.is_err()
		{
			tracing::debug!("History not retrieved in time");
		}
		self.history_view = Some(view);
		self.screen()
	}

	/// Title and options of the current screen.
	fn screen(&self) -> Vec<String> {
		let mut lines = vec![format!("== {} ==", self.wizard.step().title())];
		lines.extend(self.options());
		lines
	}

	fn subtotal(&self) -> String {
		format!("Subtotal {}", format_price(self.wizard.order().price))
	}

	fn options(&self) -> Vec<String> {
		match self.wizard.step() {
			WizardStep::Start => {
				let catalog = self.wizard.catalog();
				let picture = if catalog.picture_variant_enabled {
					PICTURE_VARIANT
				} else {
					PICTURE_DEFAULT
				};
				let mut lines = vec![format!("  [{}]", picture)];
				lines.extend(
					catalog
						.quantity_options
						.iter()
						.map(|option| format!("  quantity {}  ({})", option.count, option.label)),
				);
				lines
			},
			WizardStep::Flavor => self
				.wizard
				.catalog()
				.flavors
				.iter()
				.map(|flavor| format!("  flavor {}", flavor))
				.collect(),
			WizardStep::Pickup => self
				.wizard
				.pickup_options()
				.into_iter()
				.map(|date| format!("  date {}", date))
				.collect(),
			WizardStep::Summary => {
				let mut lines = self.status();
				lines.push("  submit | back | cancel".to_string());
				lines
			},
			WizardStep::History => {
				let orders = self
					.history_view
					.as_ref()
					.map(HistoryView::orders)
					.unwrap_or_default();
				if orders.is_empty() {
					return vec!["No orders yet".to_string()];
				}
				orders
					.iter()
					.map(|record| {
						format!(
							"{}  {} x {}  {}",
							record.date,
							record.quantity,
							record.flavor,
							format_price(record.price)
						)
					})
					.collect()
			},
		}
	}

	fn status(&self) -> Vec<String> {
		let order = self.wizard.order();
		vec![
			format!("Step: {}", self.wizard.step()),
			format!("Quantity: {}", order.quantity),
			format!("Flavor: {}", order.flavor),
			format!("Pickup date: {}", order.pickup_date),
			self.subtotal(),
		]
	}
}

/// Reads commands from `input` until it ends or `quit` is entered.
pub async fn run<R, W>(
	engine: &ShopEngine,
	input: R,
	mut output: W,
) -> Result<(), std::io::Error>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut shell = Shell::new(engine).await;
	write_lines(&mut output, &shell.welcome().await).await?;

	let mut lines = input.lines();
	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}
		let command = match line.parse::<Command>() {
			Ok(command) => command,
			Err(e) => {
				write_lines(&mut output, &[e.to_string()]).await?;
				continue;
			},
		};
		if command == Command::Quit {
			break;
		}
		let reply = shell.execute(command).await;
		write_lines(&mut output, &reply).await?;
	}

	output.flush().await
}

async fn write_lines<W: AsyncWrite + Unpin>(
	output: &mut W,
	lines: &[String],
) -> Result<(), std::io::Error> {
	for line in lines {
		output.write_all(line.as_bytes()).await?;
		output.write_all(b"\n").await?;
	}
	output.flush().await
}
