use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use forager_core::{ForagerConfig, Mode, QLearner, RenderFrame, RenderSink, Simulation};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Pacing delay between ticks, indexed by `--speed` (1 = slowest).
const PACE_DELAYS_MS: [u64; 5] = [500, 200, 100, 50, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Learn a fresh model and save it on completion or interrupt.
    Train,
    /// Replay a saved model greedily until interrupted.
    Play,
}

#[derive(Debug, Parser)]
#[command(name = "forager", about = "Train or replay a marker-foraging policy")]
struct Cli {
    /// Run mode.
    #[arg(short, long, value_enum, default_value_t = ModeArg::Train)]
    mode: ModeArg,

    /// Pacing speed between 1 (slowest) and 5 (fastest).
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    speed: u8,

    /// Number of training iterations before the model is saved.
    #[arg(short, long, default_value_t = 50_000)]
    iterations: u64,

    /// Model file: written after training, read before play.
    #[arg(long, default_value = "model.bin")]
    model: PathBuf,

    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Log the status line every N ticks.
    #[arg(long, default_value_t = 500)]
    status_interval: u64,
}

/// Render sink that forwards the status line to the tracing pipeline.
struct TraceSink {
    every: u64,
}

impl RenderSink for TraceSink {
    fn present(&mut self, frame: &RenderFrame) {
        if self.every > 0 && frame.tick % self.every == 0 {
            info!(tick = frame.tick, status = %frame.status, "frame");
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ForagerConfig {
        rng_seed: cli.seed,
        ..ForagerConfig::default()
    };
    let delay = Duration::from_millis(PACE_DELAYS_MS[usize::from(cli.speed - 1)]);

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("installing interrupt handler")?;
    }

    let mut sink = TraceSink {
        every: cli.status_interval,
    };
    match cli.mode {
        ModeArg::Train => train(config, cli.iterations, &cli.model, delay, &stop, &mut sink),
        ModeArg::Play => play(config, &cli.model, delay, &stop, &mut sink),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn train(
    config: ForagerConfig,
    iterations: u64,
    model: &Path,
    delay: Duration,
    stop: &AtomicBool,
    sink: &mut impl RenderSink,
) -> Result<()> {
    let mut sim = Simulation::new(config, Mode::Train).context("building simulation")?;
    info!(iterations, "training started");

    while sim.tick() < iterations && !stop.load(Ordering::SeqCst) {
        sim.step().context("simulation tick failed")?;
        sink.present(&sim.frame());
        thread::sleep(delay);
    }

    if stop.load(Ordering::SeqCst) {
        info!(tick = sim.tick(), "training interrupted; saving model");
    }
    sim.learner()
        .save(model)
        .with_context(|| format!("saving model to {}", model.display()))?;
    info!(
        entries = sim.learner().len(),
        score = sim.score(),
        path = %model.display(),
        "model saved",
    );
    Ok(())
}

fn play(
    config: ForagerConfig,
    model: &Path,
    delay: Duration,
    stop: &AtomicBool,
    sink: &mut impl RenderSink,
) -> Result<()> {
    let mut learner = QLearner::new(config.epsilon, config.alpha, config.gamma);
    learner
        .load(model)
        .with_context(|| format!("loading model from {}", model.display()))?;
    info!(entries = learner.len(), "model loaded");

    let mut sim =
        Simulation::with_learner(config, Mode::Play, learner).context("building simulation")?;
    while !stop.load(Ordering::SeqCst) {
        sim.step().context("simulation tick failed")?;
        sink.present(&sim.frame());
        thread::sleep(delay);
    }
    info!(
        tick = sim.tick(),
        ratio = sim.capture_ratio(),
        "session ended",
    );
    Ok(())
}
