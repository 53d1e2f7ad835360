//! Nearest-neighbour route construction.
//!
//! Starting from the depot, the walk repeatedly moves to the closest unvisited
//! entry of the distance matrix until every entry has been visited.
//!
//! Ties are broken by scan order: candidates are examined by ascending matrix
//! index and only a strictly smaller distance replaces the current best, so the
//! earliest of several equidistant candidates is taken. Matrix indices follow
//! the order of the input points, which makes the route fully determined by
//! that order.
//!
//! # Complexity
//!
//! O(n²) per call. Nothing is cached between calls.

use crate::distance::DistanceMatrix;
use crate::error::{PlannerError, Result};
use crate::heuristics::RouteBuilder;
use crate::point::{Depot, Point};
use crate::route::Route;

/// Which end of the route the depot represents.
///
/// The distance matrix is symmetric, so both roles produce the same walk and
/// the same length; `End` only reverses the returned order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepotRole {
    /// The route leaves from the depot (visiting order)
    #[default]
    Start,
    /// The route finishes at the depot (walk built backwards from it)
    End,
}

/// Treatment of candidates at distance zero from the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoincidentPolicy {
    /// Zero-distance candidates compete like any other
    #[default]
    Include,
    /// Pass over zero-distance candidates while a positive-distance one remains.
    /// If only coincident candidates are left, the first in scan order is taken.
    Skip,
}

/// Nearest-neighbour heuristic
#[derive(Debug, Clone, Default)]
pub struct NearestNeighbour {
    pub depot_role: DepotRole,
    pub coincident: CoincidentPolicy,
}

/// Result of one walk over a distance matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    /// Matrix indices in visiting order, depot first
    pub order: Vec<usize>,
    /// Closed length, including the return leg to the depot
    pub length: f64,
}

impl NearestNeighbour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variant whose routes finish at the depot
    pub fn ending_at_depot() -> Self {
        NearestNeighbour { depot_role: DepotRole::End, ..Self::default() }
    }

    pub fn with_coincident(mut self, policy: CoincidentPolicy) -> Self {
        self.coincident = policy;
        self
    }

    fn find_nearest(&self, matrix: &DistanceMatrix, current: usize, visited: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        let mut first_coincident = None;

        for candidate in 0..matrix.size() {
            if candidate == current || visited[candidate] {
                continue;
            }

            let d = matrix.get(current, candidate);
            if self.coincident == CoincidentPolicy::Skip && d == 0.0 {
                first_coincident.get_or_insert(candidate);
                continue;
            }

            // strict: an equal distance never displaces an earlier candidate
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((candidate, d));
            }
        }

        best.map(|(i, _)| i).or(first_coincident)
    }

    /// Walk the whole matrix starting from the depot entry.
    pub fn walk(&self, matrix: &DistanceMatrix) -> Result<Walk> {
        let depot = matrix.depot_index().ok_or_else(|| {
            PlannerError::invalid("distance matrix is empty; it must contain at least the depot")
        })?;

        let n = matrix.size();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        visited[depot] = true;
        order.push(depot);

        let mut current = depot;
        let mut length = 0.0;

        while order.len() < n {
            let next = self
                .find_nearest(matrix, current, &visited)
                .ok_or_else(|| PlannerError::invalid("walk ran out of candidates"))?;

            length += matrix.get(current, next);
            visited[next] = true;
            order.push(next);
            current = next;
        }

        length += matrix.get(current, depot);

        Ok(Walk { order, length })
    }

    /// Route and closed length for an already built matrix.
    pub fn route_from_matrix(&self, matrix: &DistanceMatrix) -> Result<(Route, f64)> {
        let walk = self.walk(matrix)?;

        let ids: Vec<usize> = walk
            .order
            .iter()
            .skip(1)
            .filter_map(|&i| matrix.id_at(i))
            .collect();

        let route = match self.depot_role {
            DepotRole::Start => Route::new(ids),
            DepotRole::End => Route::new(ids).reversed(),
        };

        Ok((route, walk.length))
    }
}

impl RouteBuilder for NearestNeighbour {
    fn build_route(&self, points: &[Point], depot: Depot) -> Result<Route> {
        let matrix = DistanceMatrix::build(points, depot)?;
        let (route, length) = self.route_from_matrix(&matrix)?;
        log::trace!("{}: {} targets, length {:.3}", self.name(), route.len(), length);
        Ok(route)
    }

    fn path_length(&self, points: &[Point], depot: Depot) -> Result<f64> {
        let matrix = DistanceMatrix::build(points, depot)?;
        Ok(self.walk(&matrix)?.length)
    }

    fn name(&self) -> &str {
        match (self.depot_role, self.coincident) {
            (DepotRole::Start, CoincidentPolicy::Include) => "NearestNeighbour",
            (DepotRole::Start, CoincidentPolicy::Skip) => "NearestNeighbour-SkipCoincident",
            (DepotRole::End, CoincidentPolicy::Include) => "NearestNeighbour-EndAtDepot",
            (DepotRole::End, CoincidentPolicy::Skip) => "NearestNeighbour-EndAtDepot-SkipCoincident",
        }
    }
}

/// Nearest-neighbour route over `points` leaving from `depot`.
pub fn build_route(points: &[Point], depot: Depot) -> Result<Route> {
    NearestNeighbour::new().build_route(points, depot)
}

/// Closed length of the nearest-neighbour route over `points`.
pub fn path_length(points: &[Point], depot: Depot) -> Result<f64> {
    NearestNeighbour::new().path_length(points, depot)
}
