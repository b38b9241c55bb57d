#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase session engine.
//!
//! This crate defines the surface that connects the maze generator, the
//! authoritative session state machine, and the store adapters. Callers
//! submit [`Action`] values describing desired transitions, the session
//! crate executes them via its `apply` entry point, and [`Event`] values
//! report every externally visible outcome so that no caller ever has to
//! diff two snapshots. The persisted [`SessionDocument`] is the only shared
//! state in the system and is validated at the store boundary.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score awarded exactly once when the runner reaches the goal cell.
pub const GOAL_SCORE: u32 = 1_000;

/// Health removed when the runner shares a cell with an enemy.
pub const ENEMY_CONTACT_DAMAGE: u32 = 25;

/// Health removed by a `damage` sabotage.
pub const SABOTAGE_DAMAGE: u32 = 20;

/// Multiplicative speed penalty applied by a `slow` sabotage.
pub const SPEED_PENALTY_FACTOR: f64 = 0.7;

/// Maximum number of enemies a session may hold.
pub const ENEMY_CAP: usize = 10;

/// Manhattan radius searched around the runner for obstacle placement.
pub const OBSTACLE_SEARCH_RADIUS: u32 = 3;

/// Upper bound on random placement attempts when spawning an enemy.
pub const SPAWN_ATTEMPT_LIMIT: u32 = 50;

/// RNG stream label for the maze carving phase.
pub const RNG_STREAM_MAZE_CARVE: &str = "maze-carve";

/// RNG stream label for the maze braiding phase.
pub const RNG_STREAM_MAZE_BRAID: &str = "maze-braid";

/// RNG stream label for enemy random-walk steps.
pub const RNG_STREAM_ENEMY_WALK: &str = "enemy-walk";

/// RNG stream label for enemy spawn placement.
pub const RNG_STREAM_ENEMY_SPAWN: &str = "enemy-spawn";

/// Location of a single maze cell expressed as x and y coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Applies a single-step displacement, rejecting coordinate underflow.
    #[must_use]
    pub fn offset(self, delta: MoveDelta) -> Option<CellCoord> {
        let x = self.x.checked_add_signed(delta.dx())?;
        let y = self.y.checked_add_signed(delta.dy())?;
        Some(CellCoord::new(x, y))
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Per-axis displacement of a single move, each component in `{-1, 0, 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveDelta {
    x: i8,
    y: i8,
}

impl MoveDelta {
    /// Validates raw axis displacements into a move delta.
    pub fn try_new(dx: i32, dy: i32) -> Result<Self, ValidationError> {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            return Err(ValidationError::InvalidMoveDelta { dx, dy });
        }
        Ok(Self {
            x: dx as i8,
            y: dy as i8,
        })
    }

    /// The zero displacement.
    #[must_use]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Horizontal component of the displacement.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.x as i32
    }

    /// Vertical component of the displacement.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.y as i32
    }

    /// Reports whether both components are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// The four single-step cardinal displacements in scan order.
pub const CARDINAL_DELTAS: [MoveDelta; 4] = [
    MoveDelta { x: 0, y: -1 },
    MoveDelta { x: 1, y: 0 },
    MoveDelta { x: 0, y: 1 },
    MoveDelta { x: -1, y: 0 },
];

/// Contents of a single maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Traversable floor.
    Open,
    /// Impassable wall.
    Wall,
}

/// Dense row-major maze grid, serialized as nested `0`/`1` arrays.
///
/// `0` encodes [`CellKind::Open`] and `1` encodes [`CellKind::Wall`], the
/// wire format every client renders from. Structural invariants (odd
/// dimensions, sealed border, open start and goal, connectivity) are checked
/// by [`MazeGrid::validate`] at the store boundary rather than on every
/// conversion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct MazeGrid {
    width: u32,
    height: u32,
    cells: Vec<CellKind>,
}

impl MazeGrid {
    /// Creates a grid of the given dimensions filled with one cell kind.
    #[must_use]
    pub fn filled(width: u32, height: u32, kind: CellKind) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![kind; capacity],
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The runner's fixed entry cell.
    #[must_use]
    pub const fn start_cell(&self) -> CellCoord {
        CellCoord::new(1, 1)
    }

    /// The fixed goal cell in the opposite corner.
    #[must_use]
    pub const fn goal_cell(&self) -> CellCoord {
        CellCoord::new(self.width.saturating_sub(2), self.height.saturating_sub(2))
    }

    /// Retrieves the cell kind at the given coordinate, if in bounds.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<CellKind> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether the coordinate lies in bounds on an open cell.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.kind(cell) == Some(CellKind::Open)
    }

    /// Overwrites the cell kind at the given coordinate; out-of-bounds
    /// coordinates are ignored.
    pub fn set(&mut self, cell: CellCoord, kind: CellKind) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = kind;
        }
    }

    /// Checks every structural invariant of a playable maze.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.width < 5 || self.height < 5 || self.width % 2 == 0 || self.height % 2 == 0 {
            return Err(DocumentError::BadDimensions {
                width: self.width,
                height: self.height,
            });
        }

        for x in 0..self.width {
            for y in [0, self.height - 1] {
                if self.is_open(CellCoord::new(x, y)) {
                    return Err(DocumentError::OpenBorder { x, y });
                }
            }
        }
        for y in 0..self.height {
            for x in [0, self.width - 1] {
                if self.is_open(CellCoord::new(x, y)) {
                    return Err(DocumentError::OpenBorder { x, y });
                }
            }
        }

        if !self.is_open(self.start_cell()) {
            return Err(DocumentError::BlockedStart);
        }
        if !self.is_open(self.goal_cell()) {
            return Err(DocumentError::BlockedGoal);
        }
        if !self.reaches_goal() {
            return Err(DocumentError::UnreachableGoal);
        }
        Ok(())
    }

    /// Breadth-first reachability check from the start cell to the goal.
    fn reaches_goal(&self) -> bool {
        let goal = self.goal_cell();
        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();

        let Some(start_index) = self.index(self.start_cell()) else {
            return false;
        };
        visited[start_index] = true;
        queue.push_back(self.start_cell());

        while let Some(cell) = queue.pop_front() {
            if cell == goal {
                return true;
            }
            for delta in CARDINAL_DELTAS {
                let Some(neighbor) = cell.offset(delta) else {
                    continue;
                };
                if !self.is_open(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if visited[neighbor_index] {
                    continue;
                }
                visited[neighbor_index] = true;
                queue.push_back(neighbor);
            }
        }
        false
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.x() < self.width && cell.y() < self.height {
            let x = usize::try_from(cell.x()).ok()?;
            let y = usize::try_from(cell.y()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(y * width + x)
        } else {
            None
        }
    }
}

impl TryFrom<Vec<Vec<u8>>> for MazeGrid {
    type Error = DocumentError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        let height = u32::try_from(rows.len()).map_err(|_| DocumentError::Oversized)?;
        let width = match rows.first() {
            Some(row) => u32::try_from(row.len()).map_err(|_| DocumentError::Oversized)?,
            None => 0,
        };

        let mut cells = Vec::with_capacity(rows.len() * width as usize);
        for row in &rows {
            if row.len() != width as usize {
                return Err(DocumentError::RaggedRows);
            }
            for value in row {
                cells.push(match value {
                    0 => CellKind::Open,
                    1 => CellKind::Wall,
                    other => return Err(DocumentError::InvalidCellValue(*other)),
                });
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

impl From<MazeGrid> for Vec<Vec<u8>> {
    fn from(grid: MazeGrid) -> Self {
        let width = (grid.width as usize).max(1);
        grid.cells
            .chunks(width)
            .map(|row| {
                row.iter()
                    .map(|kind| match kind {
                        CellKind::Open => 0,
                        CellKind::Wall => 1,
                    })
                    .collect()
            })
            .collect()
    }
}

/// Unique identifier allocated to an enemy or obstacle within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// The runner's persisted state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Current column of the runner.
    pub x: u32,
    /// Current row of the runner.
    pub y: u32,
    /// Remaining health, clamped at zero.
    pub health: u32,
    /// Speed multiplier, reduced by `slow` sabotage; always positive.
    pub speed: f64,
    /// Accumulated score.
    pub score: u32,
}

impl PlayerState {
    /// Current cell occupied by the runner.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    /// Moves the runner to the given cell.
    pub fn set_position(&mut self, cell: CellCoord) {
        self.x = cell.x();
        self.y = cell.y();
    }
}

/// A roaming enemy's persisted state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyState {
    /// Identifier unique within the session.
    pub id: EntityId,
    /// Current column of the enemy.
    pub x: u32,
    /// Current row of the enemy.
    pub y: u32,
}

impl EnemyState {
    /// Current cell occupied by the enemy.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    /// Moves the enemy to the given cell.
    pub fn set_position(&mut self, cell: CellCoord) {
        self.x = cell.x();
        self.y = cell.y();
    }
}

/// A sabotage-created transient wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleState {
    /// Identifier unique within the session.
    pub id: EntityId,
    /// Column of the obstacle.
    pub x: u32,
    /// Row of the obstacle.
    pub y: u32,
}

impl ObstacleState {
    /// Cell blocked by the obstacle.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }
}

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The room exists but no game has been started.
    Waiting,
    /// The countdown runs and the runner may move.
    Playing,
    /// The runner reached the goal; terminal.
    Won,
    /// Health or the countdown reached zero; terminal.
    Lost,
}

impl SessionStatus {
    /// Reports whether the session rejects further player-state mutation.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    /// Reports whether the countdown and movement are active.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Why a session transitioned to [`SessionStatus::Lost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LossCause {
    /// The runner's health reached zero.
    HealthDepleted,
    /// The countdown reached zero.
    TimerExpired,
}

/// Named difficulty selected when a session starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Generous health and time, few enemies, heavily braided maze.
    Easy,
    /// Baseline settings.
    Medium,
    /// Low health and time, many enemies, nearly tree-shaped maze.
    Hard,
}

impl Difficulty {
    /// Canonical lowercase name of the difficulty.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Resolves the tuning profile associated with the difficulty.
    #[must_use]
    pub const fn profile(&self) -> DifficultyProfile {
        match self {
            Self::Easy => DifficultyProfile {
                enemy_count: 2,
                enemy_speed_tier: 1,
                enemy_chase_rate: 0.6,
                player_health: 150,
                time_limit_seconds: 180,
                extra_connections: 18,
            },
            Self::Medium => DifficultyProfile {
                enemy_count: 3,
                enemy_speed_tier: 2,
                enemy_chase_rate: 0.75,
                player_health: 100,
                time_limit_seconds: 120,
                extra_connections: 10,
            },
            Self::Hard => DifficultyProfile {
                enemy_count: 4,
                enemy_speed_tier: 3,
                enemy_chase_rate: 0.9,
                player_health: 75,
                time_limit_seconds: 90,
                extra_connections: 4,
            },
        }
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ValidationError::UnknownDifficulty(other.to_owned())),
        }
    }
}

/// Tuning parameters selected by a [`Difficulty`], persisted with the
/// session so spectators render consistent metadata.
///
/// `enemy_chase_rate` is carried configuration; enemy motion is a pure
/// random walk and never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    /// Number of enemies spawned at start.
    pub enemy_count: u32,
    /// Relative enemy cadence tier consumed by the external tick driver.
    pub enemy_speed_tier: u32,
    /// Advertised pursuit aggressiveness; not consumed by enemy motion.
    pub enemy_chase_rate: f64,
    /// Initial runner health.
    pub player_health: u32,
    /// Countdown length in seconds.
    pub time_limit_seconds: u32,
    /// Interior walls removed after carving to open extra corridors.
    pub extra_connections: u32,
}

/// The complete persisted snapshot of one session.
///
/// This is the single shared document every handler loads, transforms, and
/// fully re-persists; nothing else survives between requests. `seed` and
/// `revision` make transitions replayable: random streams are derived from
/// `(seed, revision, label)` and `revision` doubles as the compare-and-swap
/// token for optimistic writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// The runner's state.
    pub player: PlayerState,
    /// All roaming enemies.
    pub enemies: Vec<EnemyState>,
    /// All sabotage-created obstacles.
    pub obstacles: Vec<ObstacleState>,
    /// The goal cell the runner must reach.
    pub goal: CellCoord,
    /// The maze layout.
    pub maze: MazeGrid,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Number of connected spectators; never negative.
    pub viewers: u32,
    /// Seconds left on the countdown, clamped at zero.
    pub time_remaining_seconds: u32,
    /// Epoch milliseconds of the last timer reconstruction.
    pub last_tick_timestamp: u64,
    /// Direction of the last accepted move; display hint only.
    pub last_move: Option<MoveDelta>,
    /// Difficulty the session was started with.
    pub difficulty: Difficulty,
    /// Tuning profile resolved from the difficulty.
    pub difficulty_settings: DifficultyProfile,
    /// Seed all random streams of this session derive from.
    pub seed: u64,
    /// Next entity identifier to allocate.
    pub next_entity_id: u32,
    /// Monotonically increasing write version.
    pub revision: u64,
}

impl SessionDocument {
    /// Allocates the next enemy/obstacle identifier.
    pub fn allocate_entity_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    /// Advances the write version after a mutating transition.
    pub fn bump_revision(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    /// Checks every invariant a stored document must satisfy.
    pub fn validate(&self) -> Result<(), DocumentError> {
        self.maze.validate()?;

        if self.goal != self.maze.goal_cell() {
            return Err(DocumentError::GoalMismatch);
        }
        if !self.maze.is_open(self.player.position()) {
            return Err(DocumentError::PlayerOffGrid);
        }
        if self.player.speed <= 0.0 {
            return Err(DocumentError::NonPositiveSpeed);
        }
        for enemy in &self.enemies {
            if !self.maze.is_open(enemy.position()) {
                return Err(DocumentError::EnemyOffGrid { id: enemy.id.get() });
            }
        }
        for obstacle in &self.obstacles {
            if !self.maze.is_open(obstacle.position()) {
                return Err(DocumentError::ObstacleOffGrid {
                    id: obstacle.id.get(),
                });
            }
        }
        Ok(())
    }
}

/// Synthetic snapshot returned on read paths when no playable session
/// exists, mirroring the waiting-room payload spectators poll before a
/// game starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingState {
    /// Always [`SessionStatus::Waiting`].
    pub status: SessionStatus,
    /// Human-readable explanation for the waiting state.
    pub message: String,
    /// Viewer count reported while waiting.
    pub viewers: u32,
    /// Countdown reported while waiting.
    pub time_remaining_seconds: u32,
}

impl WaitingState {
    /// Waiting state for a room that has never been started.
    #[must_use]
    pub fn uninitialized() -> Self {
        Self {
            status: SessionStatus::Waiting,
            message: "Room not initialized yet".to_owned(),
            viewers: 0,
            time_remaining_seconds: 0,
        }
    }

    /// Waiting state substituted when the store cannot be reached.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            status: SessionStatus::Waiting,
            message: "Service temporarily unavailable".to_owned(),
            viewers: 0,
            time_remaining_seconds: 0,
        }
    }
}

/// Snapshot returned by the state-read path: either the live document or a
/// synthetic waiting placeholder.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateView {
    /// The live session document.
    Session(SessionDocument),
    /// No playable session; a synthetic waiting snapshot.
    Waiting(WaitingState),
}

/// Sabotage kinds spectators may inject into a session.
///
/// Free-text sabotage descriptions are resolved to one of these by an
/// external classifier before they reach the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SabotageKind {
    /// Multiplicatively reduce the runner's speed.
    Slow,
    /// Place an obstacle near the runner.
    Block,
    /// Reduce the runner's health.
    Damage,
    /// Spawn an additional enemy.
    Enemy,
}

impl SabotageKind {
    /// Canonical lowercase name of the sabotage kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Block => "block",
            Self::Damage => "damage",
            Self::Enemy => "enemy",
        }
    }
}

impl FromStr for SabotageKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "block" => Ok(Self::Block),
            "damage" => Ok(Self::Damage),
            "enemy" => Ok(Self::Enemy),
            other => Err(ValidationError::UnknownSabotage(other.to_owned())),
        }
    }
}

/// Actions that express all permissible session transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Regenerates maze and entities and enters [`SessionStatus::Playing`].
    Start {
        /// Difficulty selecting the tuning profile.
        difficulty: Difficulty,
    },
    /// Attempts to displace the runner by one step.
    Move {
        /// Validated per-axis displacement.
        delta: MoveDelta,
    },
    /// Advances enemies and the countdown; driven externally on an interval.
    Tick,
    /// Applies a named adverse effect on behalf of a spectator.
    Sabotage {
        /// The effect to apply.
        kind: SabotageKind,
    },
    /// Reconstructs elapsed time without any other mutation.
    StateRead,
}

/// Events reported after a transition so callers never diff snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A fresh game entered [`SessionStatus::Playing`].
    SessionStarted {
        /// Difficulty the game was started with.
        difficulty: Difficulty,
    },
    /// The runner stepped onto the goal cell.
    GoalReached,
    /// The session transitioned to [`SessionStatus::Won`].
    Won,
    /// The session transitioned to [`SessionStatus::Lost`].
    Lost {
        /// What drove the loss.
        cause: LossCause,
    },
    /// The runner shared a cell with an enemy after moving.
    Hit {
        /// Health left after the contact damage.
        remaining_health: u32,
    },
    /// A sabotage passed its preconditions and mutated the session.
    SabotageApplied {
        /// The effect that was applied.
        kind: SabotageKind,
    },
    /// A sabotage failed a precondition; nothing was mutated.
    SabotageRejected {
        /// The effect that was requested.
        kind: SabotageKind,
        /// Why the engine refused it.
        reason: SabotageError,
    },
}

/// Reasons the sabotage engine refuses a request without mutating state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum SabotageError {
    /// The session is waiting or already terminal.
    #[error("session is not active")]
    NotActive,
    /// No legal cell was found for an obstacle or enemy.
    #[error("no legal placement")]
    NoLegalPlacement,
    /// A `damage` sabotage requires remaining health.
    #[error("player already at zero health")]
    HealthDepleted,
    /// The session already holds the maximum number of enemies.
    #[error("enemy cap reached")]
    EnemyCapReached,
}

/// Malformed input detected before any session document is loaded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A move component lay outside `{-1, 0, 1}`.
    #[error("move delta components must be -1, 0, or 1, got ({dx}, {dy})")]
    InvalidMoveDelta {
        /// Offending horizontal component.
        dx: i32,
        /// Offending vertical component.
        dy: i32,
    },
    /// The difficulty name did not match a known profile.
    #[error("unknown difficulty {0:?}")]
    UnknownDifficulty(String),
    /// The sabotage name did not match a known kind.
    #[error("unknown sabotage kind {0:?}")]
    UnknownSabotage(String),
    /// Session identifiers must be non-empty.
    #[error("session id must not be empty")]
    EmptySessionId,
}

/// Invariant violations detected when a document crosses the store boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Maze rows had differing lengths.
    #[error("maze rows must share one width")]
    RaggedRows,
    /// A maze cell was neither `0` nor `1`.
    #[error("maze cells must be 0 or 1, found {0}")]
    InvalidCellValue(u8),
    /// Maze dimensions exceeded the supported coordinate range.
    #[error("maze dimensions exceed the supported size")]
    Oversized,
    /// Maze dimensions must be odd and at least five.
    #[error("maze dimensions must be odd and at least 5, found {width}x{height}")]
    BadDimensions {
        /// Offending width.
        width: u32,
        /// Offending height.
        height: u32,
    },
    /// A border cell was open.
    #[error("maze border must be sealed, found open cell at ({x}, {y})")]
    OpenBorder {
        /// Column of the open border cell.
        x: u32,
        /// Row of the open border cell.
        y: u32,
    },
    /// The start cell was a wall.
    #[error("start cell must be open")]
    BlockedStart,
    /// The goal cell was a wall.
    #[error("goal cell must be open")]
    BlockedGoal,
    /// No open path connects start and goal.
    #[error("goal must be reachable from the start cell")]
    UnreachableGoal,
    /// The document goal disagrees with the maze goal cell.
    #[error("goal position must match the maze goal cell")]
    GoalMismatch,
    /// The runner stood out of bounds or on a wall.
    #[error("player must stand on an open cell")]
    PlayerOffGrid,
    /// The speed multiplier must stay positive.
    #[error("player speed must be positive")]
    NonPositiveSpeed,
    /// An enemy stood out of bounds or on a wall.
    #[error("enemy {id} must stand on an open cell")]
    EnemyOffGrid {
        /// Identifier of the offending enemy.
        id: u32,
    },
    /// An obstacle stood out of bounds or on a wall slot.
    #[error("obstacle {id} must occupy an open cell")]
    ObstacleOffGrid {
        /// Identifier of the offending obstacle.
        id: u32,
    },
}

/// Failures reported by a [`SessionStore`] implementation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No document exists for the session id.
    #[error("session not found")]
    NotFound,
    /// An optimistic write observed a different revision than expected.
    #[error("revision conflict: expected {expected}, found {found}")]
    Conflict {
        /// Revision the writer based its transition on.
        expected: u64,
        /// Revision currently persisted.
        found: u64,
    },
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A stored payload failed to deserialize.
    #[error("stored document corrupt: {0}")]
    Corrupt(String),
    /// A document failed validation on its way into the store.
    #[error("document rejected: {0}")]
    InvalidDocument(#[from] DocumentError),
}

/// Write semantics requested from [`SessionStore::put`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutMode {
    /// Unconditionally replace (or create) the document.
    Replace,
    /// Replace only if the persisted revision still matches.
    ReplaceIfRevision(u64),
    /// Merge into an existing document where the backend supports field
    /// merges; document stores that only hold full snapshots may treat
    /// this as [`PutMode::Replace`].
    MergeExisting,
}

/// Counters a store must adjust atomically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterField {
    /// The spectator presence counter.
    Viewers,
}

impl fmt::Display for CounterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viewers => write!(f, "viewers"),
        }
    }
}

/// Abstract per-session document store consumed by the orchestration layer.
///
/// Implementations must hand out copies: a snapshot returned by `get` is
/// owned by the caller and never aliases store-internal state, so every
/// transition is a pure load, compute, and re-persist cycle.
pub trait SessionStore {
    /// Loads the full document for a session.
    fn get(&self, session_id: &str) -> Result<SessionDocument, StoreError>;

    /// Persists a complete validated document under the given semantics.
    fn put(
        &self,
        session_id: &str,
        document: &SessionDocument,
        mode: PutMode,
    ) -> Result<(), StoreError>;

    /// Atomically adjusts a counter, clamping at zero, and returns the new
    /// value.
    fn increment(
        &self,
        session_id: &str,
        field: CounterField,
        delta: i32,
    ) -> Result<u32, StoreError>;
}
