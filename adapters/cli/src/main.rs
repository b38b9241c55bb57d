#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives a full Maze Chase session.
//!
//! Runs the complete stack locally: an in-memory store behind the session
//! service, a scripted runner that walks toward the goal, periodic enemy
//! ticks, and optional spectator chaos. Useful for demos and for exercising
//! the orchestration layer end to end without a web frontend.

use anyhow::{Context, Result};
use clap::Parser;
use maze_chase_core::{
    CellCoord, Difficulty, Event, MoveDelta, SabotageKind, SessionDocument, StateView,
    CARDINAL_DELTAS,
};
use maze_chase_service::{SabotageOutcome, SessionService, SystemClock};
use maze_chase_store_memory::InMemoryStore;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// How often the external enemy tick fires, measured in runner steps.
const TICK_EVERY_STEPS: u32 = 5;

/// How often chaos mode injects a sabotage, measured in runner steps.
const SABOTAGE_EVERY_STEPS: u32 = 25;

/// Demo driver for the Maze Chase session engine.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", about = "Run a scripted Maze Chase session")]
struct Cli {
    /// Room identifier to play in.
    #[arg(long, default_value = "demo-room")]
    room: String,

    /// Difficulty: easy, medium, or hard.
    #[arg(long, default_value = "medium")]
    difficulty: String,

    /// Seed for the demo driver; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many runner steps.
    #[arg(long, default_value_t = 400)]
    max_steps: u32,

    /// Inject spectator sabotage while the runner plays.
    #[arg(long)]
    chaos: bool,
}

/// Entry point for the Maze Chase command-line driver.
fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let difficulty: Difficulty = cli
        .difficulty
        .parse()
        .context("unsupported difficulty name")?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let service = SessionService::new(InMemoryStore::new(), SystemClock, rng.gen());

    let outcome = service
        .start(&cli.room, difficulty)
        .context("failed to start the session")?;
    println!(
        "started {} on {}: {} enemies, {} s on the clock, seed {seed}",
        cli.room,
        difficulty.as_str(),
        outcome.document.enemies.len(),
        outcome.document.time_remaining_seconds,
    );

    // One spectator tunes in before the runner moves.
    if let StateView::Session(document) = service
        .state(&cli.room, true)
        .context("failed to read the session")?
    {
        println!("spectators watching: {}", document.viewers);
    }

    let mut document = outcome.document;
    for step in 0..cli.max_steps {
        let delta = choose_step(&document, &mut rng);
        let moved = service
            .move_player(&cli.room, delta.dx(), delta.dy())
            .context("move failed")?;
        report_events(&moved.events);
        document = moved.document;

        if document.status.is_terminal() {
            break;
        }

        if step % TICK_EVERY_STEPS == TICK_EVERY_STEPS - 1 {
            let ticked = service.tick(&cli.room).context("tick failed")?;
            report_events(&ticked.events);
            document = ticked.document;
            if document.status.is_terminal() {
                break;
            }
        }

        if cli.chaos && step % SABOTAGE_EVERY_STEPS == SABOTAGE_EVERY_STEPS - 1 {
            let kind = random_sabotage(&mut rng);
            match service.sabotage(&cli.room, kind).context("sabotage failed")? {
                SabotageOutcome::Applied(applied) => {
                    println!("sabotage {} applied", kind.as_str());
                    report_events(&applied.events);
                    document = applied.document;
                }
                SabotageOutcome::Rejected { kind, reason } => {
                    println!("sabotage {} blocked: {reason}", kind.as_str());
                }
            }
            if document.status.is_terminal() {
                break;
            }
        }
    }

    println!(
        "final: {:?}, score {}, health {}, {} s left, runner at ({}, {})",
        document.status,
        document.player.score,
        document.player.health,
        document.time_remaining_seconds,
        document.player.x,
        document.player.y,
    );
    Ok(())
}

/// Mostly-greedy step selection: prefer a legal step that shrinks the
/// Manhattan distance to the goal, fall back to any legal step, and
/// occasionally wander to shake the runner out of dead ends.
fn choose_step(document: &SessionDocument, rng: &mut ChaCha8Rng) -> MoveDelta {
    let position = document.player.position();
    let legal: Vec<MoveDelta> = CARDINAL_DELTAS
        .into_iter()
        .filter(|delta| {
            position.offset(*delta).is_some_and(|cell| {
                document.maze.is_open(cell)
                    && !document
                        .obstacles
                        .iter()
                        .any(|obstacle| obstacle.position() == cell)
            })
        })
        .collect();

    if legal.is_empty() {
        return MoveDelta::zero();
    }
    if rng.gen_bool(0.25) {
        return legal[rng.gen_range(0..legal.len())];
    }

    let closer = |delta: &MoveDelta| -> u32 {
        position
            .offset(*delta)
            .map_or(u32::MAX, |cell: CellCoord| {
                cell.manhattan_distance(document.goal)
            })
    };
    legal
        .iter()
        .copied()
        .min_by_key(closer)
        .unwrap_or(MoveDelta::zero())
}

fn random_sabotage(rng: &mut ChaCha8Rng) -> SabotageKind {
    const KINDS: [SabotageKind; 4] = [
        SabotageKind::Slow,
        SabotageKind::Block,
        SabotageKind::Damage,
        SabotageKind::Enemy,
    ];
    KINDS[rng.gen_range(0..KINDS.len())]
}

fn report_events(events: &[Event]) {
    for event in events {
        match event {
            Event::SessionStarted { difficulty } => {
                println!("event: session started on {}", difficulty.as_str());
            }
            Event::GoalReached => println!("event: goal reached"),
            Event::Won => println!("event: session won"),
            Event::Lost { cause } => println!("event: session lost ({cause:?})"),
            Event::Hit { remaining_health } => {
                println!("event: enemy contact, {remaining_health} health left");
            }
            Event::SabotageApplied { kind } => {
                println!("event: sabotage {} applied", kind.as_str());
            }
            Event::SabotageRejected { kind, reason } => {
                println!("event: sabotage {} rejected: {reason}", kind.as_str());
            }
        }
    }
}
