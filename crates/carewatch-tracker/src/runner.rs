use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, BufReader};
use tokio::signal;
use tracing::info;

use crate::config::TrackerConfig;
use crate::frame_reader::FrameReader;
use crate::monitor::ActivityMonitor;
use crate::service::{TrackerHandle, TrackerService};
use crate::sink::{CareLogSink, JsonLinesSink};

const FRAME_BUFFER: usize = 64;

/// Stdin/stdout marker for input and output paths.
pub const STDIO: &str = "-";

/// Track frames from `input` until it ends or a shutdown signal arrives.
/// Returns the monitor after the open session has been flushed.
pub async fn run(config: TrackerConfig, input: Option<&str>) -> Result<ActivityMonitor> {
    info!("Initializing tracker for {}", config.child.name);

    let mut reader = FrameReader::new(open_input(input).await?);
    let sink = open_sink(config.output.path.as_deref())?;
    let monitor = ActivityMonitor::new(config.child.name.clone(), config.detection.clone());
    let handle = TrackerService::new(monitor, sink).spawn(FRAME_BUFFER);

    info!(
        "Tracker running, idle timeout {}ms, minimum session {}ms",
        config.detection.idle_timeout_ms, config.detection.min_session_duration_ms
    );

    tokio::select! {
        result = forward_frames(&mut reader, &handle) => {
            result?;
            info!("Frame input ended");
        }
        result = shutdown_signal() => result?,
    }

    let monitor = handle.stop().await?;

    info!(
        "Tracked {} sessions, wrote {} care logs",
        monitor.history().len(),
        monitor.logs().len()
    );
    Ok(monitor)
}

async fn forward_frames<R>(reader: &mut FrameReader<R>, handle: &TrackerHandle) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(frame) = reader.next_frame().await? {
        handle.send_frame(frame).await?;
    }
    Ok(())
}

async fn open_input(input: Option<&str>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match input {
        None | Some(STDIO) => {
            info!("Reading frames from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open frame input: {:?}", path))?;
            info!("Reading frames from {:?}", path);
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn open_sink(output: Option<&str>) -> Result<Box<dyn CareLogSink>> {
    match output {
        None | Some(STDIO) => Ok(Box::new(JsonLinesSink::new(std::io::stdout()))),
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {:?}", parent)
                    })?;
                }
            }

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open care log output: {:?}", path))?;
            info!("Appending care logs to {:?}", path);
            Ok(Box::new(JsonLinesSink::new(file)))
        }
    }
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, flushing open session...");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, flushing open session...");
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, flushing open session...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, flushing open session...");
    }

    Ok(())
}
