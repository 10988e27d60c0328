use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use matra_click::{ClickPlayer, ClickSchedule};
use matra_tempo::TempoPipeline;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run the tempo estimator against tracks with known BPM"
)]
struct Args {
    /// JSON manifest mapping file names to expected BPM; defaults to the
    /// built-in reference corpus
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Directory holding the audio files
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    /// Play the first failing track with its estimated click grid
    #[arg(long)]
    play: bool,
}

/// Tracks the estimator is expected to handle, with their true tempos.
fn reference_corpus() -> BTreeMap<String, f64> {
    [
        ("24-7.mp3", 200.0),
        ("Afterglow.mp3", 250.0),
        ("Anniversary.mp3", 150.0),
        ("Counting Down.mp3", 110.0),
        ("Essence.mp3", 45.0),
        ("In conclusion.mp3", 180.0),
        ("White.mp3", 180.0),
        ("bat.ogg", 230.0),
        ("catswing.ogg", 260.0),
        ("darkzone.ogg", 200.0),
        ("fromnowon.ogg", 265.0),
        ("third.ogg", 340.0),
        ("tvtime.ogg", 148.0),
        ("tvworld.ogg", 145.0),
    ]
    .into_iter()
    .map(|(name, bpm)| (name.to_string(), bpm))
    .collect()
}

fn load_manifest(path: &Path) -> Result<BTreeMap<String, f64>> {
    let file =
        File::open(path).with_context(|| format!("opening manifest {}", path.display()))?;
    let manifest = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    Ok(manifest)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let expectations = match &args.manifest {
        Some(path) => load_manifest(path)?,
        None => reference_corpus(),
    };

    let pipeline = TempoPipeline::new();
    let mut checked = 0;
    for (name, expected) in &expectations {
        let path = args.dir.join(name);
        if !path.exists() {
            warn!(track = name.as_str(), "audio file missing, skipping");
            continue;
        }
        let estimate = pipeline.find_bpm(&path)?;
        if estimate.matches_octave(*expected) {
            info!(
                track = name.as_str(),
                bpm = estimate.bpm,
                expected,
                "passed"
            );
            checked += 1;
            continue;
        }
        println!(
            "FAILED: {} estimated {} BPM, expected {}",
            name, estimate.bpm, expected
        );
        if args.play {
            ClickPlayer::new().play(&path, &ClickSchedule::Grid(estimate))?;
        }
        return Ok(ExitCode::FAILURE);
    }
    println!("all {checked} tracks passed");
    Ok(ExitCode::SUCCESS)
}
