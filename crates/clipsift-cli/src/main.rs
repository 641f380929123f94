//! clipsift binary: one video plus one query in, one highlight reel out.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipsift_cli::config::Cli;
use clipsift_cli::{run_pipeline, PipelineError, ResourceGuard, RunConfig, EXIT_CONFIG, EXIT_SUCCESS};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("clipsift=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let cli = Cli::parse();
    let config = match RunConfig::resolve(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", PipelineError::Config(e));
            std::process::exit(EXIT_CONFIG);
        }
    };

    if config.maintenance_mode {
        info!("Maintenance mode enabled, refusing new runs");
        std::process::exit(EXIT_SUCCESS);
    }

    let guard = ResourceGuard::new(config.memory_limit_mb);

    match run_pipeline(&config, &guard).await {
        Ok(()) => {
            info!(output = %config.output_path.display(), "Done");
            std::process::exit(EXIT_SUCCESS);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
