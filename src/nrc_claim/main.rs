use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nrc_claim::common::config::Config;
use nrc_claim::common::nrc_client::NrcClient;
use nrc_claim::common::types::FetchError;
use nrc_claim::pipeline::{InputSource, Pipeline};

const EXIT_FAILURE: u8 = 1;
const EXIT_UNAUTHORIZED: u8 = 2;

/// Claim your NRC activities and convert them to GPX format.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Access token retrieved from the browser (falls back to NRC_ACCESS_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Directories containing NRC activities in JSON format, or individual JSON files
    #[arg(short, long, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Directory for raw activity JSON
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Directory for converted GPX files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().with_current_span(false).init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Cli::parse();
    init_tracing(args.json_logs);

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    if let Some(dir) = args.raw_dir {
        config.raw_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    // Explicit inputs mean the JSON is already on disk; skip the remote phase.
    let (inputs, token) = if args.input.is_empty() {
        let token = args.token.or_else(|| env::var("NRC_ACCESS_TOKEN").ok());
        if token.is_none() {
            info!("No access token given, converting previously claimed activities only.");
        }
        (InputSource::Default, token)
    } else {
        (InputSource::Paths(args.input), None)
    };

    let client = match token.as_deref().map(|t| NrcClient::new(t, &config)).transpose() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create HTTP client: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let pipeline = Pipeline::new(config);
    match pipeline.run(client, &inputs).await {
        Ok(summary) if summary.fetch_failed() => {
            error!("The activity listing did not complete; some activities were not claimed.");
            ExitCode::from(EXIT_FAILURE)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<FetchError>() {
            Some(fetch_error) if fetch_error.is_fatal() => {
                error!("Are you sure you provided the correct access token? {fetch_error}");
                ExitCode::from(EXIT_UNAUTHORIZED)
            }
            _ => {
                error!("An error occurred: {e:#}");
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}
