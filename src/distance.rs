//! Euclidean distance matrix over a point snapshot plus the depot.
//!
//! The depot is always stored as the last entry, so a matrix built from `n`
//! points has size `n + 1` and the depot sits at index `n`.

use std::collections::HashSet;

use crate::error::{PlannerError, Result};
use crate::point::{Depot, Point};

/// Euclidean norm between two coordinate pairs
#[inline]
pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Symmetric distance matrix with the depot in the last row/column
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
    /// Point id for each non-depot index
    ids: Vec<usize>,
}

impl DistanceMatrix {
    /// Build the matrix for `points` with `depot` appended last.
    ///
    /// Rejects non-finite coordinates and duplicate ids.
    pub fn build(points: &[Point], depot: Depot) -> Result<Self> {
        if !depot.x.is_finite() || !depot.y.is_finite() {
            return Err(PlannerError::invalid(format!(
                "depot coordinates ({}, {}) are not finite",
                depot.x, depot.y
            )));
        }

        let mut seen = HashSet::with_capacity(points.len());
        for p in points {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(PlannerError::invalid(format!(
                    "point {} has non-finite coordinates ({}, {})",
                    p.id, p.x, p.y
                )));
            }
            if !seen.insert(p.id) {
                return Err(PlannerError::invalid(format!("duplicate point id {}", p.id)));
            }
        }

        let coords: Vec<(f64, f64)> = points
            .iter()
            .map(|p| (p.x, p.y))
            .chain(std::iter::once((depot.x, depot.y)))
            .collect();

        let n = coords.len();
        let mut rows = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i + 1..n {
                let d = euclidean(coords[i], coords[j]);
                rows[i][j] = d;
                rows[j][i] = d;
            }
        }

        Ok(DistanceMatrix {
            rows,
            ids: points.iter().map(|p| p.id).collect(),
        })
    }

    /// Build a matrix from explicit rows. The last row is taken to be the depot
    /// and the other indices are identified by their position.
    ///
    /// The rows must form a square matrix of finite, non-negative values.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().position(|r| r.len() != n) {
            return Err(PlannerError::invalid(format!(
                "row {} has {} entries, expected {}",
                bad,
                rows[bad].len(),
                n
            )));
        }
        if rows.iter().flatten().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(PlannerError::invalid("distances must be finite and non-negative"));
        }

        Ok(DistanceMatrix {
            rows,
            ids: (0..n.saturating_sub(1)).collect(),
        })
    }

    /// Number of entries, depot included
    #[inline]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Index of the depot, or `None` for an empty matrix
    #[inline]
    pub fn depot_index(&self) -> Option<usize> {
        self.rows.len().checked_sub(1)
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Point id stored at a non-depot index
    #[inline]
    pub fn id_at(&self, index: usize) -> Option<usize> {
        self.ids.get(index).copied()
    }
}
