// Markov Melody Generator — CLI entry point.
//
// Builds a random Markov chain, walks it, maps the walk to pitches, and
// writes the melody to a MIDI file.
// The pipeline: config -> chain -> walk -> pitches -> MIDI output.
//
// Usage:
//   cargo run -p markov_melody -- [output.mid] [--config FILE] [--states N]
//     [--order N] [--steps N] [--init 0,1] [--seed N] [--base-pitch N]
//     [--duration TICKS] [--velocity N] [--parallel]
//
// Flags override values from `--config`, which override the defaults.
// Set RUST_LOG=debug for chain/walk diagnostics.

use clap::Parser;
use markov_melody::Result;
use markov_melody::config::GenerationConfig;
use markov_melody::midi::write_midi;
use markov_melody::pipeline::{BuildMode, generate};
use markov_melody_prng::MelodyRng;
use rand::Rng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate", about = "Generate a melody from a random Markov chain")]
struct Cli {
    /// Output MIDI file
    #[arg(default_value = "new_song.mid")]
    output: PathBuf,

    /// JSON generation config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of chain states
    #[arg(long)]
    states: Option<usize>,

    /// History length
    #[arg(long)]
    order: Option<usize>,

    /// Number of notes to draw after the seed history
    #[arg(long)]
    steps: Option<usize>,

    /// Seed history, comma separated
    #[arg(long, value_delimiter = ',')]
    init: Option<Vec<usize>>,

    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Pitch of symbol 0
    #[arg(long)]
    base_pitch: Option<u8>,

    /// Note length in ticks
    #[arg(long)]
    duration: Option<u32>,

    /// Note velocity
    #[arg(long)]
    velocity: Option<u8>,

    /// Build the chain on all cores
    #[arg(long)]
    parallel: bool,
}

impl Cli {
    fn into_config(self) -> Result<(GenerationConfig, PathBuf, BuildMode)> {
        let mut config = match &self.config {
            Some(path) => GenerationConfig::load(path)?,
            None => GenerationConfig::default(),
        };
        if let Some(states) = self.states {
            config.num_states = states;
        }
        if let Some(order) = self.order {
            config.order = order;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(init) = self.init {
            config.init = init;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(base_pitch) = self.base_pitch {
            config.base_pitch = base_pitch;
        }
        if let Some(duration) = self.duration {
            config.midi.note_duration = duration;
        }
        if let Some(velocity) = self.velocity {
            config.midi.velocity = velocity;
        }
        let mode = if self.parallel {
            BuildMode::Parallel
        } else {
            BuildMode::Sequential
        };
        Ok((config, self.output, mode))
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let (config, output, mode) = cli.into_config()?;
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());

    println!("=== Markov Melody Generator ===");
    println!("Output: {}", output.display());
    println!("States: {}  Order: {}  Steps: {}", config.num_states, config.order, config.steps);
    println!("Seed history: {:?}", config.init);
    println!("Seed: {seed}");
    println!();

    println!("[1/3] Building chain and walking it ({mode:?})...");
    let mut rng = MelodyRng::new(seed);
    let melody = generate(&config, &mut rng, mode)?;
    println!("  {} histories in the chain.", melody.model.len());
    println!("  Symbols: {:?}", melody.symbols);

    println!("[2/3] Mapped to pitches:");
    println!("  {:?}", melody.pitches);

    println!("[3/3] Writing MIDI to {}...", output.display());
    write_midi(&melody.pitches, &config.midi, &output)?;
    println!("  Done! {} notes.", melody.pitches.len());

    println!();
    println!("Play with: timidity {} (or any MIDI player)", output.display());
    Ok(())
}
