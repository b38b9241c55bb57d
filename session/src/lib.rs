#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state machine for Maze Chase.
//!
//! The single entry point is [`apply`]: it takes a freshly loaded
//! [`SessionDocument`], one [`Action`], and the clock/entropy context, and
//! mutates the document in place while pushing [`Event`] values for every
//! externally visible outcome. Elapsed time is reconstructed first on every
//! transition, then the action-specific rule runs, then collisions are
//! resolved if the runner moved. Mutating transitions always advance the
//! document revision, which both drives optimistic store writes and keys
//! the deterministic random streams.

use maze_chase_core::{
    Action, Difficulty, Event, PlayerState, SessionDocument, SessionStatus,
};
use maze_chase_mazegen::GeneratorConfig;

mod enemies;
mod movement;
mod rng;
mod sabotage;
mod timer;

/// Per-request inputs injected by the orchestration layer.
///
/// The state machine never reads the wall clock or an entropy source
/// itself; both arrive here so that identical inputs replay identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionContext {
    now_ms: u64,
    entropy: u64,
}

impl ActionContext {
    /// Creates a context from the current epoch milliseconds and a fresh
    /// entropy value consumed only by `start`.
    #[must_use]
    pub const fn new(now_ms: u64, entropy: u64) -> Self {
        Self { now_ms, entropy }
    }

    /// Epoch milliseconds the transition executes at.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Entropy used to seed a freshly started session.
    #[must_use]
    pub const fn entropy(&self) -> u64 {
        self.entropy
    }
}

/// Applies one action to the session document, mutating it in place.
///
/// Timer reconstruction always runs first, whatever the action. Every call
/// bumps the revision because `lastTickTimestamp` is refreshed
/// unconditionally, so every transition is a write.
pub fn apply(
    document: &mut SessionDocument,
    action: Action,
    ctx: ActionContext,
    out_events: &mut Vec<Event>,
) {
    timer::reconstruct(document, ctx.now_ms(), out_events);

    match action {
        Action::Start { difficulty } => {
            let revision = document.revision;
            *document = started_session(difficulty, ctx, out_events);
            document.revision = revision;
        }
        Action::Move { delta } => {
            if movement::try_step(document, delta) {
                movement::resolve_collisions(document, out_events);
            }
        }
        Action::Tick => enemies::advance_all(document),
        Action::Sabotage { kind } => sabotage::apply_kind(document, kind, out_events),
        Action::StateRead => {}
    }

    document.bump_revision();
}

/// Builds a fully regenerated playing session for the given difficulty.
///
/// Used by [`apply`] when restarting an existing room and by the
/// orchestration layer when a room has no document yet. The caller owns
/// revision continuity; the returned document starts at revision zero.
#[must_use]
pub fn started_session(
    difficulty: Difficulty,
    ctx: ActionContext,
    out_events: &mut Vec<Event>,
) -> SessionDocument {
    let profile = difficulty.profile();
    let maze = maze_chase_mazegen::generate(
        &GeneratorConfig::standard(profile.extra_connections),
        ctx.entropy(),
    );
    let start = maze.start_cell();
    let goal = maze.goal_cell();

    let mut document = SessionDocument {
        player: PlayerState {
            x: start.x(),
            y: start.y(),
            health: profile.player_health,
            speed: 1.0,
            score: 0,
        },
        enemies: Vec::new(),
        obstacles: Vec::new(),
        goal,
        maze,
        status: SessionStatus::Playing,
        viewers: 0,
        time_remaining_seconds: profile.time_limit_seconds,
        last_tick_timestamp: ctx.now_ms(),
        last_move: None,
        difficulty,
        difficulty_settings: profile,
        seed: ctx.entropy(),
        next_entity_id: 0,
        revision: 0,
    };

    enemies::spawn_initial(&mut document, profile.enemy_count);
    out_events.push(Event::SessionStarted { difficulty });
    document
}
