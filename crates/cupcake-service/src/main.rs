//! Main entry point for the cupcake shop service.
//!
//! Loads the configuration, builds the shop engine from the configured
//! implementations, signs the customer in, waits for the catalog and then
//! serves the order screens as a shell on stdin/stdout.

use clap::Parser;
use cupcake_config::Config;
use tokio::io::BufReader;

mod factory_registry;
mod shell;

/// Command-line arguments for the shop service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/demo.toml")]
	config: String,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// Logs go to stderr so they do not interleave with the shell's output
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	tracing::info!("Started cupcake shop");

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.shop.id);

	let engine = factory_registry::build_shop_from_config(config).await?;
	engine.initialize().await?;
	engine.catalog().wait_ready().await;

	let input = BufReader::new(tokio::io::stdin());
	let output = tokio::io::stdout();

	tokio::select! {
		result = shell::run(&engine, input, output) => {
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Interrupted");
		}
	}

	engine.shutdown().await?;
	tracing::info!("Stopped cupcake shop");
	Ok(())
}
