//! Rootstar Affect Application
//!
//! Runs the EEG + face affect pipeline against simulated hardware and
//! reports the fused state.
//!
//! # Usage
//!
//! ```bash
//! # Run until Ctrl-C, logging a summary every 5 s
//! rootstar-affect run
//!
//! # One minute for subject S01, export history on exit
//! rootstar-affect run --subject S01 --duration-secs 60 --export history.csv
//!
//! # Inject lead artifacts and face dropouts
//! rootstar-affect run --artifact-every 15 --dropout-every 7
//!
//! # Print the default configuration
//! rootstar-affect export-config > affect.json
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rootstar_affect_native::{AffectPipeline, PipelineConfig, PipelineHandle, Sensors, Snapshot};

/// Rootstar Affect Application
#[derive(Parser, Debug)]
#[command(name = "rootstar-affect")]
#[command(author, version, about = "Multimodal EEG + facial affect fusion", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline on simulated sensors
    Run {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(short, long)]
        duration_secs: Option<u64>,

        /// Initial subject id
        #[arg(short, long)]
        subject: Option<String>,

        /// Tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Seconds between summary log lines
        #[arg(long, default_value = "5")]
        report_every_secs: u64,

        /// Write the history as CSV on exit
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Inject a lead artifact on every n-th EEG poll
        #[arg(long)]
        artifact_every: Option<u64>,

        /// Drop the face on every n-th camera poll
        #[arg(long)]
        dropout_every: Option<u64>,
    },

    /// Print the default configuration as JSON
    ExportConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            config,
            duration_secs,
            subject,
            tick_ms,
            report_every_secs,
            export,
            artifact_every,
            dropout_every,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(subject) = subject {
                pipeline_config.initial_subject = subject;
            }
            if let Some(ms) = tick_ms {
                pipeline_config.tick_interval = Duration::from_millis(ms);
            }
            pipeline_config.validate()?;

            let options = RunOptions {
                duration: duration_secs.map(Duration::from_secs),
                report_every: Duration::from_secs(report_every_secs.max(1)),
                export,
                artifact_every,
                dropout_every,
            };
            run(pipeline_config, options)?;
        }
        Commands::ExportConfig => {
            println!("{}", PipelineConfig::default().to_json_pretty()?);
        }
    }

    Ok(())
}

struct RunOptions {
    duration: Option<Duration>,
    report_every: Duration,
    export: Option<PathBuf>,
    artifact_every: Option<u64>,
    dropout_every: Option<u64>,
}

/// Run the pipeline until the duration elapses or Ctrl-C
fn run(config: PipelineConfig, options: RunOptions) -> anyhow::Result<()> {
    info!("Rootstar Affect v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Subject: {}, tick: {} ms",
        config.initial_subject,
        config.tick_interval.as_millis()
    );

    let rt = Runtime::new()?;
    rt.block_on(async {
        let sensors =
            Sensors::simulated_with_faults(&config, options.artifact_every, options.dropout_every);
        let handle = AffectPipeline::spawn(config, sensors)?;

        let deadline = async {
            match options.duration {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut report = tokio::time::interval(options.report_every);
        report.tick().await;

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    info!("Run duration elapsed");
                    break;
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!("Ctrl-C handler failed: {}", e);
                    }
                    info!("Interrupted");
                    break;
                }
                _ = report.tick() => report_snapshot(&handle),
            }
        }

        report_snapshot(&handle);
        if let Some(path) = &options.export {
            export_history(&handle, path)?;
        }
        handle.shutdown().await?;
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn report_snapshot(handle: &PipelineHandle) {
    let s: Arc<Snapshot> = handle.snapshot();
    let eeg = s.eeg_emotion.map_or("--", |l| l.name());
    let face = s.face_emotion.map_or("--", |e| e.name());
    info!(
        "[{}] #{} EEG {} ({:.2}) | face {} ({:.2}) | {} -> {} ({:.2}){} | V {:.2} A {:.2} S {:.2} | history {}",
        s.session_subject_id,
        s.sequence,
        eeg,
        s.eeg_confidence,
        face,
        s.face_confidence,
        s.fusion.status.name(),
        s.fusion.final_label.name(),
        s.fusion.confidence,
        if s.fusion.is_fake { " [fake]" } else { "" },
        s.eeg_metrics.valence,
        s.eeg_metrics.arousal,
        s.eeg_metrics.stress,
        handle.reader().history_len(),
    );
}

fn export_history(handle: &PipelineHandle, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    handle.export_history_csv(BufWriter::new(file))?;
    info!("History exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "rootstar-affect",
            "--log-level",
            "debug",
            "run",
            "--subject",
            "S01",
            "--duration-secs",
            "3",
            "--tick-ms",
            "50",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { subject, duration_secs, tick_ms, report_every_secs, .. } => {
                assert_eq!(subject.as_deref(), Some("S01"));
                assert_eq!(duration_secs, Some(3));
                assert_eq!(tick_ms, Some(50));
                assert_eq!(report_every_secs, 5);
            }
            Commands::ExportConfig => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_parses_fault_injection() {
        let cli = Cli::try_parse_from([
            "rootstar-affect",
            "run",
            "--artifact-every",
            "15",
            "--dropout-every",
            "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { artifact_every, dropout_every, export, .. } => {
                assert_eq!(artifact_every, Some(15));
                assert_eq!(dropout_every, Some(7));
                assert!(export.is_none());
            }
            Commands::ExportConfig => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_parses_export_config() {
        let cli = Cli::try_parse_from(["rootstar-affect", "export-config"]).unwrap();
        assert!(matches!(cli.command, Commands::ExportConfig));
    }
}
