//! Reconciliation engine: folds delta batches into the active-cell set.
//!
//! The [`ActiveCellSet`] holds exactly the cells whose most recent delta was
//! non-zero. A zero-state delta removes its entry outright, so the set is
//! bounded by the number of truly active cells rather than by the number of
//! deltas ever seen.
//!
//! [`Reconciler`] is the only writer. Readers get an immutable
//! [`RenderFrame`] built after each batch.

use std::collections::BTreeMap;

use gridsync_types::{Category, Coord, DeltaBatch};
use serde::Serialize;
use tracing::debug;

use crate::mapper::{CoordinateMapper, RenderPosition};

/// The record kept for one active cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveCell {
    /// Which of the two active categories the cell is in.
    pub category: Category,
    /// The cell's position in render space.
    pub position: RenderPosition,
}

/// Net effect of one [`Reconciler::apply`] call, counted per delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Deltas that added a previously absent cell.
    pub inserted: usize,
    /// Deltas that overwrote an existing cell.
    pub updated: usize,
    /// Deltas that removed an existing cell.
    pub removed: usize,
    /// Zero-state deltas for cells that were already absent.
    pub ignored_removals: usize,
}

/// Sparse map from coordinate to active cell.
///
/// Iteration order is coordinate order, so frames are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveCellSet {
    cells: BTreeMap<Coord, ActiveCell>,
}

impl ActiveCellSet {
    /// Number of active cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is active.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up one cell.
    pub fn get(&self, coord: &Coord) -> Option<&ActiveCell> {
        self.cells.get(coord)
    }

    /// Whether a coordinate is currently active.
    pub fn contains(&self, coord: &Coord) -> bool {
        self.cells.contains_key(coord)
    }

    /// Iterate active cells in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (&Coord, &ActiveCell)> {
        self.cells.iter()
    }

    /// Count active cells per category.
    pub fn count(&self, category: Category) -> usize {
        self.cells
            .values()
            .filter(|cell| cell.category == category)
            .count()
    }

    /// Build the immutable view handed to the render adapter.
    pub fn frame(&self, tick: Option<u64>) -> RenderFrame {
        RenderFrame {
            tick,
            cells: self
                .cells
                .iter()
                .map(|(coord, cell)| RenderCell {
                    key: coord.key(),
                    position: cell.position,
                    category: cell.category,
                })
                .collect(),
        }
    }
}

/// One cell as the render adapter consumes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderCell {
    /// Stable key, formatted `x,y,z` in engine coordinates.
    pub key: String,
    /// Position in render space.
    pub position: RenderPosition,
    /// Active category, which selects the color.
    pub category: Category,
}

/// Read-only snapshot of the active-cell set after a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    /// Tick of the batch that produced the frame, if it carried one.
    pub tick: Option<u64>,
    /// Active cells in coordinate order.
    pub cells: Vec<RenderCell>,
}

impl RenderFrame {
    /// Number of cells in the frame.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the frame shows no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Find a cell by its `x,y,z` key.
    pub fn cell(&self, key: &str) -> Option<&RenderCell> {
        self.cells.iter().find(|cell| cell.key == key)
    }
}

/// Owner and sole writer of the [`ActiveCellSet`].
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    cells: ActiveCellSet,
    mapper: CoordinateMapper,
}

impl Reconciler {
    /// Create an empty reconciler that maps positions with `mapper`.
    pub fn new(mapper: CoordinateMapper) -> Self {
        Self {
            cells: ActiveCellSet::default(),
            mapper,
        }
    }

    /// The current active-cell set.
    pub const fn cells(&self) -> &ActiveCellSet {
        &self.cells
    }

    /// Apply a batch in order, last write wins per coordinate.
    ///
    /// Cells not named in the batch are untouched. A zero-state delta for
    /// an absent coordinate is a no-op.
    pub fn apply(&mut self, batch: &DeltaBatch) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for delta in &batch.deltas {
            match delta.state.category() {
                None => {
                    if self.cells.cells.remove(&delta.coord).is_some() {
                        outcome.removed = outcome.removed.saturating_add(1);
                    } else {
                        outcome.ignored_removals = outcome.ignored_removals.saturating_add(1);
                    }
                }
                Some(category) => {
                    let cell = ActiveCell {
                        category,
                        position: self.mapper.map(delta.coord),
                    };
                    if self.cells.cells.insert(delta.coord, cell).is_some() {
                        outcome.updated = outcome.updated.saturating_add(1);
                    } else {
                        outcome.inserted = outcome.inserted.saturating_add(1);
                    }
                }
            }
        }
        debug!(
            tick = ?batch.tick,
            deltas = batch.len(),
            inserted = outcome.inserted,
            updated = outcome.updated,
            removed = outcome.removed,
            active = self.cells.len(),
            "batch reconciled"
        );
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use gridsync_types::{CellState, Delta};

    use super::*;

    fn c(x: i32, y: i32, z: i32) -> Coord {
        Coord::new(x, y, z)
    }

    fn batch(tick: u64, deltas: &[(Coord, CellState)]) -> DeltaBatch {
        DeltaBatch::new(
            tick,
            deltas.iter().map(|&(coord, state)| Delta::new(coord, state)).collect(),
        )
    }

    #[test]
    fn deleting_absent_cell_is_a_no_op() {
        let mut engine = Reconciler::default();
        engine.apply(&batch(1, &[(c(5, 5, 5), CellState::Positive)]));
        let before = engine.cells().clone();

        let outcome = engine.apply(&batch(2, &[(c(9, 9, 9), CellState::Empty)]));

        assert_eq!(engine.cells(), &before);
        assert_eq!(outcome.ignored_removals, 1);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn last_write_wins_within_batch() {
        let mut engine = Reconciler::default();
        let target = c(1, 2, 3);
        engine.apply(&batch(
            1,
            &[
                (target, CellState::Positive),
                (target, CellState::Negative),
                (target, CellState::Empty),
            ],
        ));
        assert!(!engine.cells().contains(&target));
        assert!(engine.cells().is_empty());
    }

    #[test]
    fn last_non_zero_write_sets_category() {
        let mut engine = Reconciler::default();
        let target = c(0, 0, 0);
        let outcome = engine.apply(&batch(
            1,
            &[
                (target, CellState::Positive),
                (target, CellState::Negative),
            ],
        ));
        assert_eq!(
            engine.cells().get(&target).map(|cell| cell.category),
            Some(Category::Negative)
        );
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn insert_then_remove_restores_prior_state() {
        let mut engine = Reconciler::default();
        engine.apply(&batch(1, &[(c(7, 0, 0), CellState::Negative)]));
        let before = engine.cells().clone();

        engine.apply(&batch(2, &[(c(1, 1, 1), CellState::Positive)]));
        engine.apply(&batch(3, &[(c(1, 1, 1), CellState::Empty)]));

        assert_eq!(engine.cells(), &before);
    }

    #[test]
    fn cells_outside_the_batch_are_untouched() {
        let mut engine = Reconciler::default();
        engine.apply(&batch(
            1,
            &[(c(1, 0, 0), CellState::Positive), (c(2, 0, 0), CellState::Positive)],
        ));
        engine.apply(&batch(2, &[(c(1, 0, 0), CellState::Negative)]));

        assert_eq!(
            engine.cells().get(&c(2, 0, 0)).map(|cell| cell.category),
            Some(Category::Positive)
        );
        assert_eq!(engine.cells().len(), 2);
    }

    #[test]
    fn scenario_two_ticks() {
        let mut engine = Reconciler::default();
        engine.apply(&batch(
            1,
            &[(c(1, 0, 0), CellState::Positive), (c(2, 0, 0), CellState::Negative)],
        ));
        engine.apply(&batch(2, &[(c(1, 0, 0), CellState::Empty)]));

        let frame = engine.cells().frame(Some(2));
        assert_eq!(frame.len(), 1);
        let only = frame.cell("2,0,0");
        assert_eq!(only.map(|cell| cell.category), Some(Category::Negative));
        assert_eq!(only.map(|cell| cell.position.to_array()), Some([4.0, 0.0, 0.0]));
    }

    #[test]
    fn frame_is_in_coordinate_order() {
        let mut engine = Reconciler::default();
        engine.apply(&batch(
            1,
            &[
                (c(3, 0, 0), CellState::Positive),
                (c(-1, 0, 0), CellState::Negative),
                (c(0, 5, 0), CellState::Positive),
            ],
        ));
        let keys: Vec<String> = engine
            .cells()
            .frame(Some(1))
            .cells
            .into_iter()
            .map(|cell| cell.key)
            .collect();
        assert_eq!(keys, vec!["-1,0,0", "0,5,0", "3,0,0"]);
        assert_eq!(engine.cells().count(Category::Positive), 2);
        assert_eq!(engine.cells().count(Category::Negative), 1);
    }
}
