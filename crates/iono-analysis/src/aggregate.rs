//! Row and column projections of a grid.
//!
//! Summing along one axis collapses the grid into a 1D profile. Row sums over
//! the delay axis expose the horizontal echo bands; column sums over the
//! frequency axis expose the vertical harmonic lines.

use std::ops::Range;

use crate::error::{Axis, Result};
use crate::grid::{Grid, check_range};

/// Sum of every row over the columns in `columns` (all columns when `None`).
///
/// The result has one entry per delay bin.
pub fn row_sums(grid: &Grid, columns: Option<Range<usize>>) -> Result<Vec<f64>> {
    let range = columns.unwrap_or(0..grid.width());
    check_range(Axis::Frequency, &range, grid.width())?;

    let mut sums = vec![0.0f64; grid.height()];
    for x in range {
        for (sum, &v) in sums.iter_mut().zip(grid.column(x)) {
            *sum += v as f64;
        }
    }
    Ok(sums)
}

/// Sum of every column over the rows in `rows` (all rows when `None`).
///
/// The result has one entry per frequency bin.
pub fn column_sums(grid: &Grid, rows: Option<Range<usize>>) -> Result<Vec<f64>> {
    let range = rows.unwrap_or(0..grid.height());
    check_range(Axis::Delay, &range, grid.height())?;

    Ok((0..grid.width())
        .map(|x| {
            grid.column(x)[range.clone()]
                .iter()
                .map(|&v| v as f64)
                .sum()
        })
        .collect())
}

/// Projection onto `axis`: column sums for [`Axis::Frequency`], row sums for
/// [`Axis::Delay`].
pub fn project(grid: &Grid, axis: Axis) -> Vec<f64> {
    match axis {
        Axis::Frequency => (0..grid.width())
            .map(|x| grid.column(x).iter().map(|&v| v as f64).sum())
            .collect(),
        Axis::Delay => {
            let mut sums = vec![0.0f64; grid.height()];
            for x in 0..grid.width() {
                for (sum, &v) in sums.iter_mut().zip(grid.column(x)) {
                    *sum += v as f64;
                }
            }
            sums
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{DelayAxis, FrequencyBand};
    use crate::error::AnalysisError;

    fn grid() -> Grid {
        // 3 columns x 2 rows: column x holds [x, 10 + x]
        let columns = (0..3).map(|x| vec![x as f32, 10.0 + x as f32]).collect();
        Grid::from_columns("agg", columns, FrequencyBand::new(0.0, 1.0), DelayAxis::unit()).unwrap()
    }

    #[test]
    fn test_row_sums_full() {
        assert_eq!(row_sums(&grid(), None).unwrap(), vec![3.0, 33.0]);
    }

    #[test]
    fn test_row_sums_restricted() {
        assert_eq!(row_sums(&grid(), Some(1..3)).unwrap(), vec![3.0, 23.0]);
        assert_eq!(row_sums(&grid(), Some(1..1)).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_column_sums() {
        assert_eq!(column_sums(&grid(), None).unwrap(), vec![10.0, 12.0, 14.0]);
        assert_eq!(column_sums(&grid(), Some(0..1)).unwrap(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_out_of_bounds_range() {
        assert!(matches!(
            row_sums(&grid(), Some(2..5)),
            Err(AnalysisError::RangeOutOfBounds { axis: Axis::Frequency, .. })
        ));
        assert!(matches!(
            column_sums(&grid(), Some(0..3)),
            Err(AnalysisError::RangeOutOfBounds { axis: Axis::Delay, .. })
        ));
    }

    #[test]
    fn test_project_matches_sums() {
        let g = grid();
        assert_eq!(project(&g, Axis::Frequency), column_sums(&g, None).unwrap());
        assert_eq!(project(&g, Axis::Delay), row_sums(&g, None).unwrap());
    }
}
