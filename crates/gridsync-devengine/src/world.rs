//! The development engine's lattice.
//!
//! This is not a simulation: each tick rewrites a few random cells and
//! then applies any injected commands, so injections win within a tick.
//! Only active cells are stored.

use std::collections::BTreeMap;

use gridsync_types::{CellState, Command, Coord, Delta, WireBatch, WireCell};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::error::DevEngineError;

/// Mutable engine-side grid state.
#[derive(Debug)]
pub struct World {
    tick: u64,
    cells: BTreeMap<Coord, CellState>,
    pending: Vec<Delta>,
    rng: StdRng,
    range: i32,
    flips_per_tick: u32,
}

impl World {
    /// Create an empty world at tick 0.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tick: 0,
            cells: BTreeMap::new(),
            pending: Vec::new(),
            rng: StdRng::seed_from_u64(config.seed),
            range: i32::from(config.range),
            flips_per_tick: config.flips_per_tick,
        }
    }

    /// The last completed tick.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of active cells.
    pub fn active_cells(&self) -> usize {
        self.cells.len()
    }

    /// The state of one cell.
    pub fn state_at(&self, coord: &Coord) -> CellState {
        self.cells.get(coord).copied().unwrap_or(CellState::Empty)
    }

    /// Whether `coord` lies inside `[-range, range]` on every axis.
    pub fn contains(&self, coord: &Coord) -> bool {
        let bounds = self.range.saturating_neg()..=self.range;
        bounds.contains(&coord.x) && bounds.contains(&coord.y) && bounds.contains(&coord.z)
    }

    /// Queue a command for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`DevEngineError::OutOfBounds`] if the command targets a cell
    /// outside the lattice; nothing is queued.
    pub fn inject(&mut self, command: Command) -> Result<(), DevEngineError> {
        match command {
            Command::InjectState { coord, state } => {
                if !self.contains(&coord) {
                    return Err(DevEngineError::OutOfBounds {
                        coord,
                        range: self.range,
                    });
                }
                self.pending.push(Delta::new(coord, state));
            }
        }
        Ok(())
    }

    /// Every active cell, stamped with the current tick.
    ///
    /// Sent to a newly connected client so it converges without history.
    pub fn snapshot(&self) -> WireBatch {
        WireBatch {
            tick: self.tick,
            cells: self
                .cells
                .iter()
                .map(|(&coord, &state)| WireCell::from(Delta::new(coord, state)))
                .collect(),
        }
    }

    /// Run one tick and return the deltas it produced.
    pub fn advance(&mut self) -> WireBatch {
        self.tick = self.tick.saturating_add(1);

        let mut deltas = Vec::new();
        for _ in 0..self.flips_per_tick {
            let delta = self.random_delta();
            deltas.push(delta);
        }
        deltas.append(&mut self.pending);

        for delta in &deltas {
            if delta.state.is_empty() {
                self.cells.remove(&delta.coord);
            } else {
                self.cells.insert(delta.coord, delta.state);
            }
        }

        WireBatch {
            tick: self.tick,
            cells: deltas.into_iter().map(WireCell::from).collect(),
        }
    }

    fn random_delta(&mut self) -> Delta {
        let range = self.range;
        let coord = Coord::new(
            self.rng.random_range(-range..=range),
            self.rng.random_range(-range..=range),
            self.rng.random_range(-range..=range),
        );
        let state = match self.rng.random_range(0..3_u8) {
            0 => CellState::Negative,
            1 => CellState::Empty,
            _ => CellState::Positive,
        };
        Delta::new(coord, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            flips_per_tick: 0,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn injection_appears_in_next_tick() {
        let mut world = World::new(&quiet_config());
        assert!(
            world
                .inject(Command::InjectState {
                    coord: Coord::new(1, 2, 3),
                    state: CellState::Negative,
                })
                .is_ok()
        );

        let batch = world.advance();

        assert_eq!(batch.tick, 1);
        assert_eq!(
            batch.cells,
            vec![WireCell {
                x: 1,
                y: 2,
                z: 3,
                state: -1
            }]
        );
        assert_eq!(world.state_at(&Coord::new(1, 2, 3)), CellState::Negative);

        let next = world.advance();
        assert!(next.cells.is_empty());
    }

    #[test]
    fn zero_injection_removes_cell() {
        let mut world = World::new(&quiet_config());
        let coord = Coord::new(0, 0, 0);
        assert!(
            world
                .inject(Command::InjectState {
                    coord,
                    state: CellState::Positive,
                })
                .is_ok()
        );
        world.advance();
        assert!(
            world
                .inject(Command::InjectState {
                    coord,
                    state: CellState::Empty,
                })
                .is_ok()
        );
        world.advance();

        assert_eq!(world.active_cells(), 0);
        assert!(world.snapshot().cells.is_empty());
    }

    #[test]
    fn random_flips_stay_in_range() {
        let config = EngineConfig {
            range: 2,
            flips_per_tick: 50,
            ..EngineConfig::default()
        };
        let mut world = World::new(&config);
        for _ in 0..10 {
            let batch = world.advance();
            assert_eq!(batch.cells.len(), 50);
            for cell in batch.cells {
                assert!((-2..=2).contains(&cell.x));
                assert!((-2..=2).contains(&cell.y));
                assert!((-2..=2).contains(&cell.z));
                assert!((-1..=1).contains(&cell.state));
            }
        }
    }

    #[test]
    fn snapshot_lists_only_active_cells() {
        let config = EngineConfig {
            range: 3,
            flips_per_tick: 40,
            ..EngineConfig::default()
        };
        let mut world = World::new(&config);
        world.advance();
        let snapshot = world.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.cells.len(), world.active_cells());
        assert!(snapshot.cells.iter().all(|cell| cell.state != 0));
    }

    #[test]
    fn injection_outside_the_lattice_is_refused() {
        let mut world = World::new(&EngineConfig {
            range: 4,
            ..quiet_config()
        });
        for coord in [Coord::new(5, 0, 0), Coord::new(0, -5, 0), Coord::new(0, 0, i32::MAX)] {
            let result = world.inject(Command::InjectState {
                coord,
                state: CellState::Positive,
            });
            assert!(matches!(
                result,
                Err(DevEngineError::OutOfBounds { range: 4, .. })
            ));
        }
        assert!(
            world
                .inject(Command::InjectState {
                    coord: Coord::new(4, -4, 4),
                    state: CellState::Positive,
                })
                .is_ok()
        );

        let batch = world.advance();
        assert_eq!(batch.cells.len(), 1);
        assert_eq!(world.active_cells(), 1);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = World::new(&EngineConfig::default());
        let mut b = World::new(&EngineConfig::default());
        assert_eq!(a.advance(), b.advance());
        assert_eq!(a.advance(), b.advance());
    }
}
