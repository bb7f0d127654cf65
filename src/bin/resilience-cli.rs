use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

use http_resilience::config::{load_config, validate_config, ResilienceConfig};
use http_resilience::observability::init_logging;
use http_resilience::outcome::ErrorKind;
use http_resilience::report::call_report;

#[derive(Parser)]
#[command(name = "resilience-cli")]
#[command(about = "Issue HTTP calls through a resilience pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL through the configured pipeline
    Call {
        url: Url,

        /// Backoff schedule override, e.g. `--backoff-ms 100,200,400`
        #[arg(long, value_delimiter = ',')]
        backoff_ms: Option<Vec<u64>>,

        /// Per-attempt deadline override
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Treat attempt timeouts as transient
        #[arg(long)]
        retry_timeouts: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ResilienceConfig::default(),
    };

    match cli.command {
        Commands::Call {
            url,
            backoff_ms,
            timeout_ms,
            retry_timeouts,
        } => {
            if let Some(delays) = backoff_ms {
                config.retry.backoff_ms = delays;
            }
            if timeout_ms.is_some() {
                config.timeout.attempt_ms = timeout_ms;
            }
            if retry_timeouts && !config.retry.transient_kinds.contains(&ErrorKind::Timeout) {
                config.retry.transient_kinds.push(ErrorKind::Timeout);
            }
            validate_config(&config).map_err(|errors| {
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })?;

            init_logging(&config.observability);

            let report = call_report(&config, url).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
