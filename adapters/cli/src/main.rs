#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner that plays Belt Blast levels with a seeded
//! autopilot and prints the resulting board.

mod autoplay;
mod render;
mod settings;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use belt_blast_core::{Event, LevelData, Outcome, StageConfig};
use belt_blast_levels::{level_name, showcase, LevelCatalog};
use belt_blast_session::{OutcomeListener, Session};
use belt_blast_world::query;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    autoplay::{Action, Autopilot},
    settings::Settings,
};

/// Command-line arguments accepted by the Belt Blast runner.
#[derive(Debug, Parser)]
#[command(name = "belt-blast", about = "Plays Belt Blast levels headlessly")]
struct Args {
    /// Optional TOML settings file with `[stage]` and `[autoplay]` tables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory holding the level files.
    #[arg(long, value_name = "DIR", default_value = "levels")]
    levels: PathBuf,
    /// Level to start from.
    #[arg(long, value_name = "NAME")]
    level: Option<String>,
    /// Plays the generated showcase level instead of reading one.
    #[arg(long, conflicts_with = "campaign")]
    showcase: bool,
    /// Writes the showcase level into the level directory under `--level` and exits.
    #[arg(long, conflicts_with_all = ["showcase", "campaign"])]
    write_showcase: bool,
    /// Continues with the next level after every win.
    #[arg(long)]
    campaign: bool,
    /// Overrides the autopilot seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the number of shooters kept in motion at once.
    #[arg(long)]
    belt_limit: Option<usize>,
    /// Overrides the simulated frame length in milliseconds.
    #[arg(long)]
    frame_ms: Option<u64>,
    /// Overrides the simulated time budget per level in seconds.
    #[arg(long)]
    max_seconds: Option<u64>,
}

/// Logs the outcome reported by the session.
struct LogListener {
    level: String,
}

impl OutcomeListener for LogListener {
    fn on_win(&mut self) {
        tracing::info!(level = %self.level, "level won");
    }

    fn on_loss(&mut self) {
        tracing::info!(level = %self.level, "level lost");
    }
}

/// Totals gathered while a level plays.
#[derive(Debug, Default)]
struct Tally {
    shots: usize,
    destroyed: usize,
    elapsed: Duration,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ProjectileLaunched { .. } => self.shots += 1,
                Event::BlockDestroyed { .. } => self.destroyed += 1,
                _ => {}
            }
        }
    }
}

/// Entry point for the Belt Blast command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        settings.autoplay.seed = seed;
    }
    if let Some(limit) = args.belt_limit {
        settings.autoplay.belt_limit = limit;
    }
    if let Some(frame_ms) = args.frame_ms {
        settings.autoplay.frame_ms = frame_ms;
    }
    if let Some(max_seconds) = args.max_seconds {
        settings.autoplay.max_seconds = max_seconds;
    }
    ensure!(settings.autoplay.frame_ms > 0, "frame length must be positive");

    let catalog = LevelCatalog::new(&args.levels);
    let mut name = args.level.clone().unwrap_or_else(|| level_name(1));

    if args.write_showcase {
        let level = showcase(settings.stage.grid_size);
        catalog
            .save(&name, &level)
            .with_context(|| format!("failed to write showcase level {name}"))?;
        println!("wrote {}", catalog.grid_path(&name).display());
        return Ok(());
    }

    let mut autopilot = Autopilot::new(settings.autoplay.seed, settings.autoplay.belt_limit);
    loop {
        let level = if args.showcase {
            name = "showcase".to_owned();
            showcase(settings.stage.grid_size)
        } else {
            catalog.load_lenient(&name)
        };

        let outcome = play(&name, level, &settings, &mut autopilot)?;
        if !args.campaign || outcome != Some(Outcome::Won) {
            break;
        }
        match catalog.next_level(&name) {
            Some(next) => name = next,
            None => {
                println!("campaign complete");
                break;
            }
        }
    }
    Ok(())
}

fn play(
    name: &str,
    level: LevelData,
    settings: &Settings,
    autopilot: &mut Autopilot,
) -> Result<Option<Outcome>> {
    let stage: StageConfig = settings.stage.clone();
    let mut session = Session::new(stage, Some(level))
        .context("stage settings rejected")?
        .with_listener(Box::new(LogListener {
            level: name.to_owned(),
        }));

    let frame = Duration::from_millis(settings.autoplay.frame_ms);
    let budget = Duration::from_secs(settings.autoplay.max_seconds);
    let mut tally = Tally::default();

    while session.outcome().is_none() && tally.elapsed < budget {
        if query::shooters(session.world()).iter().next().is_none() {
            tracing::warn!(level = name, "no shooters left; level cannot be decided");
            break;
        }
        match autopilot.plan(session.world()) {
            Some(Action::Select(column)) => session.select_column(column),
            Some(Action::Activate(shooter)) => session.activate(shooter),
            None => {}
        }
        session.advance(frame);
        tally.elapsed += frame;
        tally.record(&session.drain_events());
    }

    let outcome = session.outcome();
    print!("{}", render::grid(session.world()));
    println!("{}", render::status(session.world()));
    println!(
        "{name}: {} after {:.1}s, {} shots, {} blocks destroyed",
        outcome.map_or("undecided", |outcome| match outcome {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
        }),
        tally.elapsed.as_secs_f32(),
        tally.shots,
        tally.destroyed,
    );
    Ok(outcome)
}
