use std::path::PathBuf;

use anyhow::{Context, Result};
use carewatch_tracker::{runner, TrackerConfig};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carewatch-tracker")]
#[command(about = "Turns pose landmark frames into caregiver activity logs", long_about = None)]
struct Cli {
    #[arg(short, long, help = "Configuration file (defaults to the user config dir)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Child name used in care log descriptions")]
    child: Option<String>,

    #[arg(short, long, help = "JSON-lines frame input, '-' for stdin")]
    input: Option<String>,

    #[arg(short, long, help = "Care log output file, '-' for stdout")]
    output: Option<String>,

    #[arg(long, help = "Close the open session after this many ms without frames")]
    idle_timeout_ms: Option<u64>,

    #[arg(long, help = "Shortest session that produces a care log, in ms")]
    min_session_ms: Option<u64>,

    #[arg(long, help = "Write the command-line overrides back to the configuration file")]
    save: bool,
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(TrackerConfig::default_config_path)
    }

    fn apply(&self, config: &mut TrackerConfig) {
        if let Some(child) = &self.child {
            config.child.name = child.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
        if let Some(ms) = self.idle_timeout_ms {
            config.detection.idle_timeout_ms = ms;
        }
        if let Some(ms) = self.min_session_ms {
            config.detection.min_session_duration_ms = ms;
        }
    }

    /// Load the configuration file and layer the flags on top.
    fn resolve_config(&self) -> Result<TrackerConfig> {
        let path = self.config_path();
        let mut config = TrackerConfig::load_from_path(&path)?;

        if self.save {
            config.update_and_save(&path, |c| self.apply(c))?;
        } else {
            self.apply(&mut config);
            config.validate()?;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout may carry care logs, so diagnostics go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_filter_reloading();
    let filter_handle = builder.reload_handle();
    builder.init();

    info!("Starting Carewatch Tracker");

    let config = cli.resolve_config()?;

    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        filter_handle
            .reload(EnvFilter::new(&config.general.log_level))
            .context("Failed to apply configured log level")?;
    }

    if let Err(e) = runner::run(config, cli.input.as_deref()).await {
        error!("Tracker error: {}", e);
        return Err(e);
    }

    info!("Carewatch Tracker stopped");
    Ok(())
}
