//! Echo ridge tracing through a thinned skeleton.
//!
//! The tracer picks the row holding the most skeleton cells inside a column
//! window as the anchor of a ridge, then follows the ridge outward from the
//! anchor row. While cells stay set it steps one column at a time; across a
//! gap it jumps to the strongest cell in a search box ahead of it. A walk
//! stops when the box is empty or the ridge wanders too far from the anchor
//! row, which keeps it from climbing an unrelated perpendicular structure.
//!
//! # Example
//!
//! ```rust
//! use iono_analysis::thinning::Skeleton;
//! use iono_analysis::trace::{TraceSettings, trace};
//!
//! // a ridge at row 12 with a one-row step at column 20
//! let points: Vec<(usize, usize)> = (0..40)
//!     .filter(|&x| x != 19)
//!     .map(|x| (x, if x < 20 { 12 } else { 13 }))
//!     .collect();
//! let skeleton = Skeleton::from_points(40, 30, &points).unwrap();
//!
//! let settings = TraceSettings {
//!     start_y: 0,
//!     min_support: 10,
//!     ..TraceSettings::ionospheric()
//! };
//! let ridge = trace(&skeleton, 0..40, &settings).unwrap().unwrap();
//! assert_eq!(ridge.len(), 39);
//! assert!(ridge.windows(2).all(|w| w[0].x < w[1].x));
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Axis, Result};
use crate::grid::{GridPoint, check_range};
use crate::thinning::Skeleton;

/// Tunables of one tracing run. The column window is passed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSettings {
    /// First row considered for the anchor.
    pub start_y: usize,
    /// Minimum set cells in the anchor row.
    pub min_support: usize,
    /// Columns searched ahead of a gap.
    pub search_width: usize,
    /// Rows searched above and below the current row across a gap.
    pub search_half_height: usize,
    /// Largest allowed distance of the ridge from the anchor row.
    pub max_row_departure: usize,
}

impl TraceSettings {
    /// Ionospheric echo over the low-frequency half.
    pub const fn ionospheric() -> Self {
        Self {
            start_y: 20,
            min_support: 20,
            search_width: 40,
            search_half_height: 10,
            max_row_departure: 60,
        }
    }

    /// Surface (ground) echo over the high-frequency half.
    pub const fn ground() -> Self {
        Self {
            start_y: 0,
            min_support: 40,
            search_width: 80,
            search_half_height: 10,
            max_row_departure: 60,
        }
    }
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self::ionospheric()
    }
}

/// Follow the dominant ridge of `skeleton` within `columns`.
///
/// Returns `Ok(None)` when no row in `[start_y, height)` reaches
/// `min_support` set cells, and an error if `columns` leaves the skeleton.
/// Returned points have strictly increasing `x`.
pub fn trace(
    skeleton: &Skeleton,
    columns: Range<usize>,
    settings: &TraceSettings,
) -> Result<Option<Vec<GridPoint>>> {
    check_range(Axis::Frequency, &columns, skeleton.width())?;
    if columns.is_empty() || settings.start_y >= skeleton.height() {
        return Ok(None);
    }

    let Some((anchor, support)) = anchor_row(skeleton, &columns, settings.start_y) else {
        return Ok(None);
    };
    if support < settings.min_support.max(1) {
        #[cfg(feature = "tracing")]
        tracing::trace!(anchor, support, "trace: anchor row below minimum support");
        return Ok(None);
    }

    let Some(first_x) = columns.clone().rev().find(|&x| skeleton.is_set(x, anchor)) else {
        return Ok(None);
    };

    let walker = Walker {
        skeleton,
        columns: &columns,
        anchor,
        settings,
    };

    let mut points = walker.walk(first_x, Direction::Left);
    points.reverse();
    if first_x + 1 < columns.end {
        points.extend(walker.walk(first_x + 1, Direction::Right));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(anchor, support, points = points.len(), "trace: ridge followed");

    Ok((!points.is_empty()).then_some(points))
}

/// Row with the most set cells in `columns`, earliest on ties, with its count.
fn anchor_row(skeleton: &Skeleton, columns: &Range<usize>, start_y: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for y in start_y..skeleton.height() {
        let count = columns.clone().filter(|&x| skeleton.is_set(x, y)).count();
        if count > 0 && best.is_none_or(|(_, c)| count > c) {
            best = Some((y, count));
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

struct Walker<'a> {
    skeleton: &'a Skeleton,
    columns: &'a Range<usize>,
    anchor: usize,
    settings: &'a TraceSettings,
}

impl Walker<'_> {
    /// Walk from `start_x` on the anchor row, whether or not that cell is set.
    fn walk(&self, start_x: usize, direction: Direction) -> Vec<GridPoint> {
        let mut points = Vec::new();
        let mut y = self.anchor;
        let mut x = start_x;

        loop {
            if self.skeleton.is_set(x, y) {
                points.push(GridPoint::new(x, y));
            } else {
                let Some((nx, ny)) = self.next_coords(x, y, direction) else {
                    break;
                };
                if ny.abs_diff(self.anchor) > self.settings.max_row_departure {
                    break;
                }
                x = nx;
                y = ny;
                points.push(GridPoint::new(x, y));
            }

            match direction {
                Direction::Left if x > self.columns.start => x -= 1,
                Direction::Right if x + 1 < self.columns.end => x += 1,
                _ => break,
            }
        }
        points
    }

    /// Strongest set cell in the search box starting at column `x`.
    ///
    /// Columns are scanned outward from `x`, rows by increasing distance from
    /// `y` with the smaller row index first; the first strictly larger value wins.
    fn next_coords(&self, x: usize, y: usize, direction: Direction) -> Option<(usize, usize)> {
        let xs: Box<dyn Iterator<Item = usize>> = match direction {
            Direction::Left => {
                let stop = x.saturating_sub(self.settings.search_width).max(self.columns.start);
                Box::new((stop..=x).rev())
            }
            Direction::Right => {
                let stop = (x + self.settings.search_width).min(self.columns.end - 1);
                Box::new(x..=stop)
            }
        };

        let height = self.skeleton.height();
        let mut best: Option<(usize, usize)> = None;
        let mut max = 0.0f32;
        for xx in xs {
            for dy in 0..=self.settings.search_half_height {
                for yy in [y.checked_sub(dy), y.checked_add(dy)].into_iter().flatten() {
                    if yy >= height {
                        continue;
                    }
                    let v = self.skeleton.get(xx, yy);
                    if v > max {
                        max = v;
                        best = Some((xx, yy));
                    }
                }
            }
        }
        best
    }
}
