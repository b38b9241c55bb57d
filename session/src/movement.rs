//! Runner movement validation and post-move collision resolution.

use maze_chase_core::{
    Event, LossCause, MoveDelta, SessionDocument, SessionStatus, ENEMY_CONTACT_DAMAGE, GOAL_SCORE,
};

/// Attempts to displace the runner by one validated step.
///
/// Returns `true` only when the runner actually moved. Illegal candidates
/// (out of bounds, wall, obstacle) and zero deltas leave the document
/// untouched rather than raising an error, and terminal or waiting sessions
/// reject all movement.
pub(crate) fn try_step(document: &mut SessionDocument, delta: MoveDelta) -> bool {
    if !document.status.is_playing() {
        return false;
    }
    if delta.is_zero() {
        return false;
    }

    let Some(candidate) = document.player.position().offset(delta) else {
        return false;
    };
    if !document.maze.is_open(candidate) {
        return false;
    }
    if document
        .obstacles
        .iter()
        .any(|obstacle| obstacle.position() == candidate)
    {
        return false;
    }

    document.player.set_position(candidate);
    document.last_move = Some(delta);
    true
}

/// Applies goal and enemy-contact effects after a successful step.
///
/// Reaching the goal wins the session and awards the goal score exactly
/// once; the terminal-state rule then blocks any further mutation. Sharing
/// a cell with an enemy costs contact damage and loses the session when
/// health runs out.
pub(crate) fn resolve_collisions(document: &mut SessionDocument, out_events: &mut Vec<Event>) {
    if document.player.position() == document.goal {
        document.status = SessionStatus::Won;
        document.player.score = document.player.score.saturating_add(GOAL_SCORE);
        out_events.push(Event::GoalReached);
        out_events.push(Event::Won);
        return;
    }

    let contact = document
        .enemies
        .iter()
        .any(|enemy| enemy.position() == document.player.position());
    if contact {
        document.player.health = document.player.health.saturating_sub(ENEMY_CONTACT_DAMAGE);
        out_events.push(Event::Hit {
            remaining_health: document.player.health,
        });
        if document.player.health == 0 {
            document.status = SessionStatus::Lost;
            out_events.push(Event::Lost {
                cause: LossCause::HealthDepleted,
            });
        }
    }
}
