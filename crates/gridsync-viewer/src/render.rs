//! Log-based stand-in for a render adapter.
//!
//! Summarises each published frame instead of drawing it.

use gridsync_client::RenderFrame;
use gridsync_types::Category;
use tracing::{debug, info};

/// Per-frame counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    /// Tick of the batch that produced the frame, if stamped.
    pub tick: Option<u64>,
    /// Total active cells.
    pub active: usize,
    /// Cells in [`Category::Positive`].
    pub positive: usize,
    /// Cells in [`Category::Negative`].
    pub negative: usize,
}

impl FrameSummary {
    /// Count the cells of `frame` by category.
    pub fn of(frame: &RenderFrame) -> Self {
        let positive = frame
            .cells
            .iter()
            .filter(|cell| cell.category == Category::Positive)
            .count();
        Self {
            tick: frame.tick,
            active: frame.len(),
            positive,
            negative: frame.len().saturating_sub(positive),
        }
    }
}

/// Log one frame: the summary at `info`, each cell at `debug`.
pub fn draw(frame: &RenderFrame) -> FrameSummary {
    let summary = FrameSummary::of(frame);
    info!(
        tick = ?summary.tick,
        active = summary.active,
        positive = summary.positive,
        negative = summary.negative,
        "frame"
    );
    for cell in &frame.cells {
        let [x, y, z] = cell.position.to_array();
        debug!(key = %cell.key, x, y, z, color = ?cell.category.color(), "cell");
    }
    summary
}
