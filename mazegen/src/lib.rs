#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic maze generation for Maze Chase sessions.
//!
//! Carving treats odd coordinates as cell centers and even coordinates as
//! wall slots between them. A recursive-backtracking pass (run with an
//! explicit stack) produces a spanning tree, a pair of guaranteed corridors
//! keeps start and goal connected regardless of how the carve went, and a
//! braiding pass knocks out additional interior walls so easier difficulties
//! offer multiple routes.

use maze_chase_core::{
    CellCoord, CellKind, DocumentError, MazeGrid, RNG_STREAM_MAZE_BRAID, RNG_STREAM_MAZE_CARVE,
};
use sha2::{Digest, Sha256};

/// Board width used by the standard session layout.
pub const STANDARD_WIDTH: u32 = 35;

/// Board height used by the standard session layout.
pub const STANDARD_HEIGHT: u32 = 25;

/// Carving steps jump two cells so that every move leaves a wall slot.
const CARVE_STRIDE: u32 = 2;

/// Braiding attempts allowed per requested extra connection.
const BRAID_TRIES_PER_CONNECTION: u32 = 10;

/// Validated parameters for one maze generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    width: u32,
    height: u32,
    extra_connections: u32,
}

impl GeneratorConfig {
    /// Creates a configuration, rejecting even or undersized dimensions.
    pub fn new(width: u32, height: u32, extra_connections: u32) -> Result<Self, DocumentError> {
        if width < 5 || height < 5 || width % 2 == 0 || height % 2 == 0 {
            return Err(DocumentError::BadDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            extra_connections,
        })
    }

    /// Configuration for the standard 35x25 session board.
    #[must_use]
    pub fn standard(extra_connections: u32) -> Self {
        Self {
            width: STANDARD_WIDTH,
            height: STANDARD_HEIGHT,
            extra_connections,
        }
    }

    /// Width of the board in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the board in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of interior walls the braiding pass tries to remove.
    #[must_use]
    pub const fn extra_connections(&self) -> u32 {
        self.extra_connections
    }
}

/// Generates a connected maze for the given configuration and seed.
///
/// The same `(config, seed)` pair always yields the same grid: the carve
/// and braid phases draw from separate labeled streams derived from the
/// seed, so neither phase perturbs the other.
#[must_use]
pub fn generate(config: &GeneratorConfig, seed: u64) -> MazeGrid {
    let mut grid = MazeGrid::filled(config.width, config.height, CellKind::Wall);

    let mut carve_rng = SplitMix64::new(derive_labeled_seed(seed, RNG_STREAM_MAZE_CARVE));
    carve_spanning_tree(&mut grid, config, &mut carve_rng);
    force_anchor_cells(&mut grid);
    carve_safety_corridors(&mut grid, config);

    let mut braid_rng = SplitMix64::new(derive_labeled_seed(seed, RNG_STREAM_MAZE_BRAID));
    braid(&mut grid, config, &mut braid_rng);

    grid
}

/// Recursive-backtracking carve over the odd-coordinate cell lattice.
fn carve_spanning_tree(grid: &mut MazeGrid, config: &GeneratorConfig, rng: &mut SplitMix64) {
    let mut visited = vec![false; (config.width * config.height) as usize];
    let mut stack: Vec<CellCoord> = Vec::new();
    let mut current = grid.start_cell();

    grid.set(current, CellKind::Open);
    visited[cell_index(config, current)] = true;

    loop {
        let neighbors = unvisited_neighbors(config, &visited, current);

        if !neighbors.is_empty() {
            let next = neighbors[rng.next_index(neighbors.len())];
            let wall = midpoint(current, next);
            grid.set(wall, CellKind::Open);
            grid.set(next, CellKind::Open);
            visited[cell_index(config, next)] = true;
            stack.push(current);
            current = next;
        } else if let Some(previous) = stack.pop() {
            current = previous;
        } else {
            break;
        }
    }
}

/// Cell centers two steps away that stay inside the border and are
/// unvisited, in scan order (up, right, down, left).
fn unvisited_neighbors(
    config: &GeneratorConfig,
    visited: &[bool],
    cell: CellCoord,
) -> Vec<CellCoord> {
    let jumps: [(i64, i64); 4] = [
        (0, -(CARVE_STRIDE as i64)),
        (CARVE_STRIDE as i64, 0),
        (0, CARVE_STRIDE as i64),
        (-(CARVE_STRIDE as i64), 0),
    ];

    let mut neighbors = Vec::with_capacity(4);
    for (dx, dy) in jumps {
        let x = i64::from(cell.x()) + dx;
        let y = i64::from(cell.y()) + dy;
        if x <= 0 || y <= 0 || x >= i64::from(config.width) - 1 || y >= i64::from(config.height) - 1
        {
            continue;
        }
        let candidate = CellCoord::new(x as u32, y as u32);
        if !visited[cell_index(config, candidate)] {
            neighbors.push(candidate);
        }
    }
    neighbors
}

/// Start and goal cells are always open, whatever the carve produced.
fn force_anchor_cells(grid: &mut MazeGrid) {
    let start = grid.start_cell();
    let goal = grid.goal_cell();
    grid.set(start, CellKind::Open);
    grid.set(goal, CellKind::Open);
}

/// Opens a full corridor along the top row and the right column.
///
/// Runs unconditionally, even when the spanning tree already connects start
/// and goal: the corridors are a connectivity safety net, not an
/// optimization target.
fn carve_safety_corridors(grid: &mut MazeGrid, config: &GeneratorConfig) {
    let mut x = 1;
    while x < config.width - 2 {
        grid.set(CellCoord::new(x, 1), CellKind::Open);
        x += CARVE_STRIDE;
    }

    let column = config.width - 2;
    let mut y = 1;
    while y < config.height - 2 {
        grid.set(CellCoord::new(column, y), CellKind::Open);
        y += CARVE_STRIDE;
    }
}

/// Removes up to `extra_connections` interior walls that separate two open
/// cells, bounded at ten random attempts per requested connection.
fn braid(grid: &mut MazeGrid, config: &GeneratorConfig, rng: &mut SplitMix64) {
    let target = config.extra_connections;
    let try_limit = target.saturating_mul(BRAID_TRIES_PER_CONNECTION);

    let mut added = 0;
    let mut tries = 0;
    while added < target && tries < try_limit {
        tries += 1;

        let x = 1 + rng.next_index((config.width - 2) as usize) as u32;
        let y = 1 + rng.next_index((config.height - 2) as usize) as u32;
        let candidate = CellCoord::new(x, y);

        if grid.kind(candidate) != Some(CellKind::Wall) {
            continue;
        }
        if !bridges_open_cells(grid, candidate) {
            continue;
        }

        grid.set(candidate, CellKind::Open);
        added += 1;
    }
}

/// A wall qualifies for removal only when it sits directly between two open
/// cells, horizontally or vertically.
fn bridges_open_cells(grid: &MazeGrid, cell: CellCoord) -> bool {
    let x = cell.x();
    let y = cell.y();

    let horizontal = x >= 1
        && grid.is_open(CellCoord::new(x - 1, y))
        && grid.is_open(CellCoord::new(x + 1, y));
    let vertical = y >= 1
        && grid.is_open(CellCoord::new(x, y - 1))
        && grid.is_open(CellCoord::new(x, y + 1));

    horizontal || vertical
}

fn midpoint(a: CellCoord, b: CellCoord) -> CellCoord {
    CellCoord::new((a.x() + b.x()) / 2, (a.y() + b.y()) / 2)
}

fn cell_index(config: &GeneratorConfig, cell: CellCoord) -> usize {
    (cell.y() * config.width + cell.x()) as usize
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    fn next_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "next_index requires a positive bound");
        (self.next_u64() % bound as u64) as usize
    }
}
