//! Enemy motion and spawn placement.
//!
//! Enemies perform a memoryless random walk: one uniformly chosen cardinal
//! step per tick, accepted only when the destination cell is open. Neither
//! obstacles nor other enemies block them, and the difficulty's advertised
//! chase rate is never consulted.

use maze_chase_core::{
    CellCoord, EnemyState, SessionDocument, CARDINAL_DELTAS, RNG_STREAM_ENEMY_SPAWN,
    RNG_STREAM_ENEMY_WALK, SPAWN_ATTEMPT_LIMIT,
};

use crate::rng::{self, SplitMix64};

/// Advances every enemy one random step while the session is playing.
pub(crate) fn advance_all(document: &mut SessionDocument) {
    if !document.status.is_playing() {
        return;
    }

    let mut stream = rng::stream(document, RNG_STREAM_ENEMY_WALK);
    for index in 0..document.enemies.len() {
        let delta = CARDINAL_DELTAS[stream.next_index(CARDINAL_DELTAS.len())];
        let Some(candidate) = document.enemies[index].position().offset(delta) else {
            continue;
        };
        if document.maze.is_open(candidate) {
            document.enemies[index].set_position(candidate);
        }
    }
}

/// Spawns up to `count` enemies for a freshly started session.
///
/// Each placement draws from the spawn stream independently; an enemy whose
/// placement attempts run dry is simply skipped, so a session may start with
/// fewer enemies than its profile requests.
pub(crate) fn spawn_initial(document: &mut SessionDocument, count: u32) {
    let mut stream = rng::stream(document, RNG_STREAM_ENEMY_SPAWN);
    for _ in 0..count {
        if let Some(cell) = random_open_cell(document, &mut stream) {
            let id = document.allocate_entity_id();
            document.enemies.push(EnemyState {
                id,
                x: cell.x(),
                y: cell.y(),
            });
        }
    }
}

/// Picks a random open interior cell that is neither the runner nor the
/// goal, bounded at [`SPAWN_ATTEMPT_LIMIT`] attempts.
pub(crate) fn random_open_cell(
    document: &SessionDocument,
    stream: &mut SplitMix64,
) -> Option<CellCoord> {
    let width = document.maze.width();
    let height = document.maze.height();
    if width < 5 || height < 5 {
        return None;
    }

    for _ in 0..SPAWN_ATTEMPT_LIMIT {
        let x = 2 + stream.next_index((width - 4) as usize) as u32;
        let y = 2 + stream.next_index((height - 4) as usize) as u32;
        let candidate = CellCoord::new(x, y);

        if !document.maze.is_open(candidate) {
            continue;
        }
        if candidate == document.player.position() || candidate == document.goal {
            continue;
        }
        return Some(candidate);
    }
    None
}
