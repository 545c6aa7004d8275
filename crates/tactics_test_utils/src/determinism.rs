//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the battle guards against:
//!
//! - **Floating-point math**: positions and timings use
//!   [`tactics_core::math::Fixed`].
//! - **HashMap iteration order**: units, tiles and queues iterate in
//!   sorted order; search scratch maps are never iterated.
//! - **Search ties**: A* and the enemy AI break ties by coordinate.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tactics_core::battle::Battle;
use tactics_core::math::Fixed;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Creates the initial state
/// * `step` - Advances the state by one step
/// * `hash` - Computes the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Advance a battle by one step of `dt`, ending the player phase whenever
/// the player has control and nothing is in flight.
///
/// Lets the enemy AI play against idle characters indefinitely.
///
/// # Panics
///
/// Panics if the battle returns an error.
pub fn step_enemy_rounds(battle: &mut Battle, dt: Fixed) {
    if battle.can_interact() && !battle.is_busy() {
        if let Err(err) = battle.request_end_turn() {
            panic!("end turn failed: {err}");
        }
    }
    if let Err(err) = battle.tick(dt) {
        panic!("tick failed: {err}");
    }
}

/// Run a battle twice from the same setup and compare final state hashes.
pub fn verify_battle_determinism<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> bool
where
    F: Fn() -> Battle,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |battle| step_enemy_rounds(battle, dt),
        Battle::state_hash,
    )
    .is_deterministic
}

/// Compare two battle runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(tick)` if they diverge at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, dt: Fixed) -> Option<u64>
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        step_enemy_rounds(&mut first, dt);
        step_enemy_rounds(&mut second, dt);

        if first.state_hash() != second.state_hash() {
            tracing::warn!(tick, "Battles diverged");
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for grids and battles.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::grid::{HexGrid, Terrain};
    use tactics_core::hex::HexCoord;

    /// Terrain of a random tile, mostly standard ground.
    pub fn arb_terrain() -> impl Strategy<Value = Terrain> {
        prop_oneof![
            6 => Just(Terrain::Standard),
            1 => Just(Terrain::Wall),
            1 => Just(Terrain::Impassable),
        ]
    }

    /// Terrain cost of a random tile (0-5).
    pub fn arb_terrain_cost() -> impl Strategy<Value = u32> {
        0u32..=5
    }

    /// Description of a small grid, turned into a [`HexGrid`] by
    /// [`GridSpec::build`].
    #[derive(Debug, Clone)]
    pub struct GridSpec {
        /// Tiles along `q`.
        pub width: u32,
        /// Tiles along `r`.
        pub height: u32,
        /// Row-major terrain and cost of every tile.
        pub tiles: Vec<(Terrain, u32)>,
    }

    impl GridSpec {
        /// Build the grid.
        #[must_use]
        pub fn build(&self) -> HexGrid {
            let mut grid = HexGrid::new();
            let coords = self.coords();
            for (coord, &(terrain, cost)) in coords.into_iter().zip(&self.tiles) {
                grid.insert_tile(coord, terrain, cost);
            }
            grid
        }

        /// Every coordinate, row-major.
        #[must_use]
        pub fn coords(&self) -> Vec<HexCoord> {
            let (width, height) = (to_i32(self.width), to_i32(self.height));
            (0..height)
                .flat_map(|r| (0..width).map(move |q| HexCoord::new(q, r)))
                .collect()
        }
    }

    fn to_i32(n: u32) -> i32 {
        i32::try_from(n).unwrap_or(i32::MAX)
    }

    /// A grid of at most `max_side` by `max_side` tiles with random terrain.
    pub fn arb_grid(max_side: u32) -> impl Strategy<Value = GridSpec> {
        (2..=max_side, 2..=max_side).prop_flat_map(|(width, height)| {
            let count = (width * height) as usize;
            proptest::collection::vec((arb_terrain(), arb_terrain_cost()), count).prop_map(
                move |tiles| GridSpec {
                    width,
                    height,
                    tiles,
                },
            )
        })
    }

    /// A grid together with two of its coordinates.
    pub fn arb_grid_with_endpoints(
        max_side: u32,
    ) -> impl Strategy<Value = (GridSpec, HexCoord, HexCoord)> {
        arb_grid(max_side).prop_flat_map(|layout| {
            let coords = layout.coords();
            let pick = proptest::sample::select(coords);
            (Just(layout), pick.clone(), pick)
        })
    }

    /// Weapon or move range in tiles (0-6).
    pub fn arb_range() -> impl Strategy<Value = u32> {
        0u32..=6
    }
}
