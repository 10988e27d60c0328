use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use matra_audio::OnsetSource;
use matra_click::{ClickPlayer, ClickSchedule};
use matra_tempo::{TempoEstimator, TempoPipeline};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Tempo estimation and click playback for audio files"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate the tempo and first-beat offset of a track
    Estimate {
        /// Audio file to analyze
        path: PathBuf,
        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,
        /// Store detected onsets in a beatmap file next to the audio
        #[arg(long)]
        write_cache: bool,
    },
    /// Play a track with metronome clicks on the estimated beat grid
    Click {
        path: PathBuf,
        #[arg(long)]
        write_cache: bool,
    },
    /// Play a track with a click at every detected onset
    Onsets { path: PathBuf },
    /// Remove the stored beatmap for a track
    Invalidate { path: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Estimate {
            path,
            json,
            write_cache,
        } => {
            let estimate = pipeline(write_cache).find_bpm(&path)?;
            if json {
                println!("{}", serde_json::to_string(&estimate)?);
            } else {
                println!("{} BPM, first beat at {:.3}s", estimate.bpm, estimate.offset);
            }
        }
        Command::Click { path, write_cache } => {
            let estimate = pipeline(write_cache).find_bpm(&path)?;
            println!("{} BPM, first beat at {:.3}s", estimate.bpm, estimate.offset);
            ClickPlayer::new().play(&path, &ClickSchedule::Grid(estimate))?;
        }
        Command::Onsets { path } => {
            let onsets = pipeline(false).onset_times(&path)?;
            info!(count = onsets.len(), "playing detected onsets");
            ClickPlayer::new().play(&path, &ClickSchedule::Onsets(onsets))?;
        }
        Command::Invalidate { path } => {
            pipeline(false).invalidate(&path)?;
            println!("Removed beatmap for {}", path.display());
        }
    }
    Ok(())
}

fn pipeline(write_cache: bool) -> TempoPipeline {
    TempoPipeline::with_parts(
        OnsetSource::new().write_back(write_cache),
        TempoEstimator::new(),
    )
}
