use maze_chase_core::{
    Action, CellCoord, CellKind, Difficulty, EnemyState, EntityId, Event, LossCause, MazeGrid,
    MoveDelta, PlayerState, SabotageError, SabotageKind, SessionDocument, SessionStatus,
    GOAL_SCORE,
};
use maze_chase_session::{apply, started_session, ActionContext};

const BASE_MS: u64 = 1_700_000_000_000;

fn ctx_at(now_ms: u64) -> ActionContext {
    ActionContext::new(now_ms, 0xfeed)
}

fn delta(dx: i32, dy: i32) -> MoveDelta {
    MoveDelta::try_new(dx, dy).expect("delta")
}

/// A 7x5 board with a fully open interior for hand-positioned scenarios.
fn open_board_document() -> SessionDocument {
    let mut maze = MazeGrid::filled(7, 5, CellKind::Wall);
    for y in 1..4 {
        for x in 1..6 {
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
        last_tick_timestamp: BASE_MS,
        last_move: None,
        difficulty: Difficulty::Medium,
        difficulty_settings: Difficulty::Medium.profile(),
        seed: 21,
        next_entity_id: 0,
        revision: 0,
    }
}

#[test]
fn easy_start_produces_the_documented_layout() {
    let mut events = Vec::new();
    let document = started_session(Difficulty::Easy, ctx_at(BASE_MS), &mut events);

    assert_eq!(document.maze.width(), 35);
    assert_eq!(document.maze.height(), 25);
    assert_eq!(document.player.position(), CellCoord::new(1, 1));
    assert_eq!(document.goal, CellCoord::new(33, 23));
    assert_eq!(document.time_remaining_seconds, 180);
    assert_eq!(document.status, SessionStatus::Playing);
    assert_eq!(document.validate(), Ok(()));
    assert_eq!(
        events,
        vec![Event::SessionStarted {
            difficulty: Difficulty::Easy
        }]
    );
}

#[test]
fn goal_entry_through_apply_wins_and_blocks_further_moves() {
    let mut document = open_board_document();
    document.player.set_position(CellCoord::new(4, 3));

    let mut events = Vec::new();
    apply(&mut document, Action::Move { delta: delta(1, 0) }, ctx_at(BASE_MS), &mut events);

    assert_eq!(document.status, SessionStatus::Won);
    assert_eq!(document.player.score, GOAL_SCORE);
    assert_eq!(events, vec![Event::GoalReached, Event::Won]);

    let mut more_events = Vec::new();
    apply(
        &mut document,
        Action::Move { delta: delta(0, -1) },
        ctx_at(BASE_MS),
        &mut more_events,
    );
    assert_eq!(document.player.position(), document.goal);
    assert_eq!(document.player.score, GOAL_SCORE);
    assert!(more_events.is_empty());
}

#[test]
fn fatal_enemy_contact_through_apply_loses_the_session() {
    let mut document = open_board_document();
    document.player.health = 20;
    document.enemies.push(EnemyState {
        id: EntityId::new(0),
        x: 2,
        y: 1,
    });

    let mut events = Vec::new();
    apply(&mut document, Action::Move { delta: delta(1, 0) }, ctx_at(BASE_MS), &mut events);

    assert_eq!(document.player.health, 0);
    assert_eq!(document.status, SessionStatus::Lost);
    assert_eq!(
        events,
        vec![
            Event::Hit {
                remaining_health: 0
            },
            Event::Lost {
                cause: LossCause::HealthDepleted
            },
        ]
    );
}

#[test]
fn zero_delta_move_returns_an_identical_snapshot() {
    let mut document = open_board_document();
    let before = document.clone();

    let mut events = Vec::new();
    apply(
        &mut document,
        Action::Move {
            delta: MoveDelta::zero(),
        },
        ctx_at(BASE_MS),
        &mut events,
    );

    assert!(events.is_empty());
    assert_eq!(document.player, before.player);
    assert_eq!(document.last_move, before.last_move);
    // The transition still counts as a touch: timestamp and revision move.
    assert_eq!(document.revision, before.revision + 1);
}

#[test]
fn wall_moves_are_idempotently_rejected() {
    let mut document = open_board_document();

    for _ in 0..3 {
        let mut events = Vec::new();
        apply(
            &mut document,
            Action::Move {
                delta: delta(0, -1),
            },
            ctx_at(BASE_MS),
            &mut events,
        );
        assert_eq!(document.player.position(), CellCoord::new(1, 1));
        assert!(events.is_empty());
    }
}

#[test]
fn countdown_is_monotone_and_clamps_at_zero() {
    let mut document = open_board_document();
    document.time_remaining_seconds = 30;

    let mut previous = document.time_remaining_seconds;
    for step in 1..=4_u64 {
        apply(
            &mut document,
            Action::StateRead,
            ctx_at(BASE_MS + step * 3_000),
            &mut Vec::new(),
        );
        assert!(document.time_remaining_seconds <= previous);
        previous = document.time_remaining_seconds;
    }

    let mut events = Vec::new();
    apply(
        &mut document,
        Action::StateRead,
        ctx_at(BASE_MS + 60_000),
        &mut events,
    );
    assert_eq!(document.time_remaining_seconds, 0);
    assert_eq!(document.status, SessionStatus::Lost);
    assert_eq!(
        events,
        vec![Event::Lost {
            cause: LossCause::TimerExpired
        }]
    );
}

#[test]
fn timer_runs_before_the_action_transition() {
    // The runner stands next to the goal but the countdown has already
    // expired by the time the move arrives: the timer rules first and the
    // move is rejected in the lost session.
    let mut document = open_board_document();
    document.player.set_position(CellCoord::new(4, 3));
    document.time_remaining_seconds = 2;

    let mut events = Vec::new();
    apply(
        &mut document,
        Action::Move { delta: delta(1, 0) },
        ctx_at(BASE_MS + 5_000),
        &mut events,
    );

    assert_eq!(document.status, SessionStatus::Lost);
    assert_eq!(document.player.position(), CellCoord::new(4, 3));
    assert_eq!(document.player.score, 0);
    assert_eq!(
        events,
        vec![Event::Lost {
            cause: LossCause::TimerExpired
        }]
    );
}

#[test]
fn health_never_leaves_the_initial_range() {
    let mut document = open_board_document();
    let initial = document.player.health;
    document.enemies.push(EnemyState {
        id: EntityId::new(0),
        x: 2,
        y: 1,
    });

    for step in 0..12_u64 {
        let back_and_forth = if step % 2 == 0 { delta(1, 0) } else { delta(-1, 0) };
        apply(
            &mut document,
            Action::Move {
                delta: back_and_forth,
            },
            ctx_at(BASE_MS),
            &mut Vec::new(),
        );
        assert!(document.player.health <= initial);
        if document.status != SessionStatus::Playing {
            break;
        }
    }
}

#[test]
fn slow_sabotage_compounds_through_apply() {
    let mut document = open_board_document();

    for _ in 0..2 {
        apply(
            &mut document,
            Action::Sabotage {
                kind: SabotageKind::Slow,
            },
            ctx_at(BASE_MS),
            &mut Vec::new(),
        );
    }
    assert!((document.player.speed - 0.49).abs() < 1e-9);
}

#[test]
fn enemy_sabotage_at_cap_is_rejected_with_a_reason() {
    let mut document = open_board_document();
    for index in 0..10_u32 {
        document.enemies.push(EnemyState {
            id: EntityId::new(index),
            x: 3,
            y: 2,
        });
    }
    document.next_entity_id = 10;

    let mut events = Vec::new();
    apply(
        &mut document,
        Action::Sabotage {
            kind: SabotageKind::Enemy,
        },
        ctx_at(BASE_MS),
        &mut events,
    );

    assert_eq!(document.enemies.len(), 10);
    assert_eq!(
        events,
        vec![Event::SabotageRejected {
            kind: SabotageKind::Enemy,
            reason: SabotageError::EnemyCapReached,
        }]
    );
}

#[test]
fn tick_only_moves_enemies_and_the_clock() {
    let mut document = open_board_document();
    document.enemies.push(EnemyState {
        id: EntityId::new(0),
        x: 3,
        y: 2,
    });
    let player_before = document.player.clone();

    apply(
        &mut document,
        Action::Tick,
        ctx_at(BASE_MS + 1_000),
        &mut Vec::new(),
    );

    assert_eq!(document.player, player_before);
    assert!(document.maze.is_open(document.enemies[0].position()));
    assert!(document
        .enemies[0]
        .position()
        .manhattan_distance(CellCoord::new(3, 2)) <= 1);
}
