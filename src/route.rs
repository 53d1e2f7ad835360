//! Route representation.
//!
//! A route is the ordered list of target ids visited between leaving the depot
//! and returning to it. The depot itself never appears in the list.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::distance::euclidean;
use crate::error::{PlannerError, Result};
use crate::point::{Depot, Point};

/// Ordered sequence of target ids, depot excluded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    ids: Vec<usize>,
}

impl Route {
    pub fn new(ids: Vec<usize>) -> Self {
        Route { ids }
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn into_ids(self) -> Vec<usize> {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get the position of a target in the route
    pub fn position(&self, id: usize) -> Option<usize> {
        self.ids.iter().position(|&n| n == id)
    }

    /// The same targets in reverse order
    pub fn reversed(&self) -> Self {
        Route { ids: self.ids.iter().rev().copied().collect() }
    }

    /// True when no id appears twice
    pub fn has_unique_ids(&self) -> bool {
        let unique: HashSet<usize> = self.ids.iter().copied().collect();
        unique.len() == self.ids.len()
    }

    /// Check that the route visits every point exactly once and nothing else
    pub fn is_permutation_of(&self, points: &[Point]) -> bool {
        if self.ids.len() != points.len() || !self.has_unique_ids() {
            return false;
        }
        let expected: HashSet<usize> = points.iter().map(|p| p.id).collect();
        self.ids.iter().all(|id| expected.contains(id))
    }

    /// Resolve the route's ids against a point dataset, in visiting order.
    pub fn resolve<'a>(&self, points: &'a [Point]) -> Result<Vec<&'a Point>> {
        let by_id: HashMap<usize, &Point> = points.iter().map(|p| (p.id, p)).collect();
        self.ids
            .iter()
            .map(|id| {
                by_id
                    .get(id)
                    .copied()
                    .ok_or_else(|| PlannerError::invalid(format!("route visits unknown point {}", id)))
            })
            .collect()
    }

    /// Closed tour length: depot to the first target, along the route, and
    /// back from the last target to the depot.
    pub fn length(&self, points: &[Point], depot: Depot) -> Result<f64> {
        let stops = self.resolve(points)?;
        Ok(closed_length(stops.iter().map(|p| (p.x, p.y)), depot))
    }
}

/// Length of the closed walk depot → coords... → depot
pub(crate) fn closed_length<I>(coords: I, depot: Depot) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let home = (depot.x, depot.y);
    let mut length = 0.0;
    let mut prev = home;
    for c in coords {
        length += euclidean(prev, c);
        prev = c;
    }
    length + euclidean(prev, home)
}

impl From<Vec<usize>> for Route {
    fn from(ids: Vec<usize>) -> Self {
        Route::new(ids)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "depot")?;
        for id in &self.ids {
            write!(f, " -> {}", id)?;
        }
        write!(f, " -> depot")
    }
}
