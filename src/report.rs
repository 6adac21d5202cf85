// 📊 Reports - level histogram chart and near-level recommendations

use crate::db::find_in_level_range;
use crate::monster::StoredMonster;
use anyhow::{anyhow, Result};
use plotters::prelude::*;
use rusqlite::Connection;
use std::path::Path;

// ============================================================================
// LEVEL HISTOGRAM
// ============================================================================

/// Width of each level bucket (1-30, 31-60, ...)
pub const BUCKET_WIDTH: i64 = 30;

/// Eight closed buckets plus the open-ended "241+"
pub const BUCKET_COUNT: usize = 9;

pub const CHART_SIZE: (u32, u32) = (800, 600);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelHistogram {
    counts: [usize; BUCKET_COUNT],
}

impl LevelHistogram {
    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut histogram = LevelHistogram::default();
        for level in levels {
            if let Some(idx) = Self::bucket_index(level) {
                histogram.counts[idx] += 1;
            }
        }
        histogram
    }

    /// Bucket for a level; levels below 1 are not counted
    pub fn bucket_index(level: i64) -> Option<usize> {
        if level < 1 {
            return None;
        }
        let idx = ((level - 1) / BUCKET_WIDTH) as usize;
        Some(idx.min(BUCKET_COUNT - 1))
    }

    pub fn counts(&self) -> &[usize; BUCKET_COUNT] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// "1-30", "31-60", ..., "211-240", "241+"
    pub fn labels() -> Vec<String> {
        (0..BUCKET_COUNT)
            .map(|i| {
                let low = i as i64 * BUCKET_WIDTH + 1;
                if i == BUCKET_COUNT - 1 {
                    format!("{}+", low)
                } else {
                    format!("{}-{}", low, low + BUCKET_WIDTH - 1)
                }
            })
            .collect()
    }
}

/// Draw the histogram as a bar chart PNG
pub fn render_chart(histogram: &LevelHistogram, path: &Path) -> Result<()> {
    let labels = LevelHistogram::labels();
    let max_count = histogram.counts().iter().copied().max().unwrap_or(0) as u32;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("Failed to prepare chart: {}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monster Level Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0u32..BUCKET_COUNT as u32).into_segmented(), 0u32..max_count + 1)
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Level")
        .y_desc("Monsters")
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                labels.get(*i as usize).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        })
        .draw()
        .map_err(|e| anyhow!("Failed to draw chart axes: {}", e))?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.mix(0.6).filled())
                .margin(8)
                .data(
                    histogram
                        .counts()
                        .iter()
                        .enumerate()
                        .map(|(i, count)| (i as u32, *count as u32)),
                ),
        )
        .map_err(|e| anyhow!("Failed to draw chart bars: {}", e))?;

    root.present()
        .map_err(|e| anyhow!("Failed to write chart to {}: {}", path.display(), e))?;

    Ok(())
}

// ============================================================================
// RECOMMENDATIONS
// ============================================================================

/// Monsters within this many levels of the target are recommended
pub const RECOMMEND_RADIUS: i64 = 5;

/// Inclusive level window around a target
pub fn level_window(target: i64) -> (i64, i64) {
    (
        target.saturating_sub(RECOMMEND_RADIUS),
        target.saturating_add(RECOMMEND_RADIUS),
    )
}

pub fn recommend(conn: &Connection, table: &str, target: i64) -> Result<Vec<StoredMonster>> {
    let (low, high) = level_window(target);
    find_in_level_range(conn, table, low, high)
}
