//! Spectator sabotage application.
//!
//! Every kind checks its preconditions against the loaded document and
//! either mutates the session or pushes a rejection event carrying the
//! reason spectators see as "blocked" feedback. A rejected sabotage never
//! mutates anything beyond the shared timer reconstruction.

use maze_chase_core::{
    CellCoord, EnemyState, Event, LossCause, ObstacleState, SabotageError, SabotageKind,
    SessionDocument, SessionStatus, ENEMY_CAP, OBSTACLE_SEARCH_RADIUS, RNG_STREAM_ENEMY_SPAWN,
    SABOTAGE_DAMAGE, SPEED_PENALTY_FACTOR,
};

use crate::{enemies, rng};

/// Applies one sabotage kind, reporting the outcome through events.
pub(crate) fn apply_kind(
    document: &mut SessionDocument,
    kind: SabotageKind,
    out_events: &mut Vec<Event>,
) {
    if !document.status.is_playing() {
        out_events.push(Event::SabotageRejected {
            kind,
            reason: SabotageError::NotActive,
        });
        return;
    }

    let mut health_depleted = false;
    let outcome = match kind {
        SabotageKind::Slow => {
            document.player.speed *= SPEED_PENALTY_FACTOR;
            Ok(())
        }
        SabotageKind::Block => place_obstacle(document),
        SabotageKind::Damage => {
            if document.player.health == 0 {
                Err(SabotageError::HealthDepleted)
            } else {
                document.player.health = document.player.health.saturating_sub(SABOTAGE_DAMAGE);
                if document.player.health == 0 {
                    document.status = SessionStatus::Lost;
                    health_depleted = true;
                }
                Ok(())
            }
        }
        SabotageKind::Enemy => spawn_extra_enemy(document),
    };

    match outcome {
        Ok(()) => {
            out_events.push(Event::SabotageApplied { kind });
            if health_depleted {
                out_events.push(Event::Lost {
                    cause: LossCause::HealthDepleted,
                });
            }
        }
        Err(reason) => out_events.push(Event::SabotageRejected { kind, reason }),
    }
}

/// Places an obstacle on the nearest open cell around the runner.
///
/// Candidates within the bounded Manhattan radius are scanned closest
/// first with a fixed tie order, skipping the runner's cell, the goal, and
/// cells that already carry an obstacle.
fn place_obstacle(document: &mut SessionDocument) -> Result<(), SabotageError> {
    let player = document.player.position();
    let radius = OBSTACLE_SEARCH_RADIUS as i64;

    let mut candidates: Vec<(u32, CellCoord)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx == 0 && dy == 0 {
                continue;
            }
            let x = i64::from(player.x()) + dx;
            let y = i64::from(player.y()) + dy;
            if x < 0 || y < 0 {
                continue;
            }
            let cell = CellCoord::new(x as u32, y as u32);
            let distance = player.manhattan_distance(cell);
            if distance > OBSTACLE_SEARCH_RADIUS {
                continue;
            }
            candidates.push((distance, cell));
        }
    }
    candidates.sort_by_key(|(distance, cell)| (*distance, cell.y(), cell.x()));

    for (_, cell) in candidates {
        if !document.maze.is_open(cell) {
            continue;
        }
        if cell == document.goal {
            continue;
        }
        if document
            .obstacles
            .iter()
            .any(|obstacle| obstacle.position() == cell)
        {
            continue;
        }

        let id = document.allocate_entity_id();
        document.obstacles.push(ObstacleState {
            id,
            x: cell.x(),
            y: cell.y(),
        });
        return Ok(());
    }

    Err(SabotageError::NoLegalPlacement)
}

/// Spawns one additional enemy below the session cap.
fn spawn_extra_enemy(document: &mut SessionDocument) -> Result<(), SabotageError> {
    if document.enemies.len() >= ENEMY_CAP {
        return Err(SabotageError::EnemyCapReached);
    }

    let mut stream = rng::stream(document, RNG_STREAM_ENEMY_SPAWN);
    let Some(cell) = enemies::random_open_cell(document, &mut stream) else {
        return Err(SabotageError::NoLegalPlacement);
    };

    let id = document.allocate_entity_id();
    document.enemies.push(EnemyState {
        id,
        x: cell.x(),
        y: cell.y(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_core::{CellKind, Difficulty, EntityId, MazeGrid, PlayerState};

    fn document_with_open_interior() -> SessionDocument {
        let mut maze = MazeGrid::filled(9, 7, CellKind::Wall);
        for y in 1..6 {
            for x in 1..8 {
                maze.set(CellCoord::new(x, y), CellKind::Open);
            }
        }
        let goal = maze.goal_cell();
        SessionDocument {
            player: PlayerState {
                x: 1,
                y: 1,
                health: 100,
                speed: 1.0,
                score: 0,
            },
            enemies: Vec::new(),
            obstacles: Vec::new(),
            goal,
            maze,
            status: SessionStatus::Playing,
            viewers: 0,
            time_remaining_seconds: 120,
            last_tick_timestamp: 0,
            last_move: None,
            difficulty: Difficulty::Medium,
            difficulty_settings: Difficulty::Medium.profile(),
            seed: 5,
            next_entity_id: 0,
            revision: 0,
        }
    }

    #[test]
    fn slow_compounds_multiplicatively() {
        let mut document = document_with_open_interior();
        let mut events = Vec::new();

        apply_kind(&mut document, SabotageKind::Slow, &mut events);
        assert!((document.player.speed - 0.7).abs() < 1e-9);

        apply_kind(&mut document, SabotageKind::Slow, &mut events);
        assert!((document.player.speed - 0.49).abs() < 1e-9);

        assert_eq!(
            events,
            vec![
                Event::SabotageApplied {
                    kind: SabotageKind::Slow
                };
                2
            ]
        );
    }

    #[test]
    fn block_places_the_nearest_open_cell() {
        let mut document = document_with_open_interior();
        let mut events = Vec::new();

        apply_kind(&mut document, SabotageKind::Block, &mut events);

        // Distance-1 candidates around (1, 1) in tie order: (1, 0) and
        // (0, 1) are border walls, so (2, 1) wins.
        assert_eq!(document.obstacles.len(), 1);
        assert_eq!(document.obstacles[0].position(), CellCoord::new(2, 1));
        assert_eq!(
            events,
            vec![Event::SabotageApplied {
                kind: SabotageKind::Block
            }]
        );
    }

    #[test]
    fn block_skips_cells_that_already_hold_an_obstacle() {
        let mut document = document_with_open_interior();
        apply_kind(&mut document, SabotageKind::Block, &mut Vec::new());
        apply_kind(&mut document, SabotageKind::Block, &mut Vec::new());

        assert_eq!(document.obstacles.len(), 2);
        assert_ne!(
            document.obstacles[0].position(),
            document.obstacles[1].position()
        );
    }

    #[test]
    fn block_reports_no_legal_placement_when_walled_in() {
        let mut document = document_with_open_interior();
        let player = document.player.position();
        document.maze = MazeGrid::filled(9, 7, CellKind::Wall);
        document.maze.set(player, CellKind::Open);

        let mut events = Vec::new();
        apply_kind(&mut document, SabotageKind::Block, &mut events);

        assert!(document.obstacles.is_empty());
        assert_eq!(
            events,
            vec![Event::SabotageRejected {
                kind: SabotageKind::Block,
                reason: SabotageError::NoLegalPlacement,
            }]
        );
    }

    #[test]
    fn damage_wounds_and_eventually_loses_the_session() {
        let mut document = document_with_open_interior();
        let mut events = Vec::new();

        apply_kind(&mut document, SabotageKind::Damage, &mut events);
        assert_eq!(document.player.health, 80);
        assert_eq!(document.status, SessionStatus::Playing);

        document.player.health = 15;
        events.clear();
        apply_kind(&mut document, SabotageKind::Damage, &mut events);
        assert_eq!(document.player.health, 0);
        assert_eq!(document.status, SessionStatus::Lost);
        assert_eq!(
            events,
            vec![
                Event::SabotageApplied {
                    kind: SabotageKind::Damage
                },
                Event::Lost {
                    cause: LossCause::HealthDepleted
                },
            ]
        );
    }

    #[test]
    fn enemy_spawn_respects_the_cap() {
        let mut document = document_with_open_interior();
        for index in 0..ENEMY_CAP {
            document.enemies.push(EnemyState {
                id: EntityId::new(index as u32),
                x: 3,
                y: 3,
            });
        }
        document.next_entity_id = ENEMY_CAP as u32;

        let mut events = Vec::new();
        apply_kind(&mut document, SabotageKind::Enemy, &mut events);

        assert_eq!(document.enemies.len(), ENEMY_CAP);
        assert_eq!(
            events,
            vec![Event::SabotageRejected {
                kind: SabotageKind::Enemy,
                reason: SabotageError::EnemyCapReached,
            }]
        );
        assert_eq!(SabotageError::EnemyCapReached.to_string(), "enemy cap reached");
    }

    #[test]
    fn enemy_spawn_lands_on_a_legal_cell() {
        let mut document = document_with_open_interior();
        let mut events = Vec::new();
        apply_kind(&mut document, SabotageKind::Enemy, &mut events);

        assert_eq!(document.enemies.len(), 1);
        let spawned = document.enemies[0].position();
        assert!(document.maze.is_open(spawned));
        assert_ne!(spawned, document.player.position());
        assert_ne!(spawned, document.goal);
    }

    #[test]
    fn inactive_sessions_reject_all_kinds() {
        for status in [SessionStatus::Waiting, SessionStatus::Won, SessionStatus::Lost] {
            let mut document = document_with_open_interior();
            document.status = status;
            let before_speed = document.player.speed;

            let mut events = Vec::new();
            apply_kind(&mut document, SabotageKind::Slow, &mut events);

            assert_eq!(document.player.speed, before_speed);
            assert_eq!(
                events,
                vec![Event::SabotageRejected {
                    kind: SabotageKind::Slow,
                    reason: SabotageError::NotActive,
                }]
            );
        }
    }
}
