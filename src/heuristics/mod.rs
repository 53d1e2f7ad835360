//! Route construction heuristics.
//!
//! This module exports the construction trait used by the threshold sweep and
//! the nearest-neighbour heuristic that implements it.

pub mod nearest_neighbour;

pub use nearest_neighbour::*;

use crate::error::Result;
use crate::point::{Depot, Point};
use crate::route::Route;

/// Builds a visiting order over a set of targets, leaving from and returning to a depot.
pub trait RouteBuilder {
    /// Visiting order over `points`, depot excluded.
    fn build_route(&self, points: &[Point], depot: Depot) -> Result<Route>;

    /// Closed tour length of the route `build_route` would return.
    fn path_length(&self, points: &[Point], depot: Depot) -> Result<f64>;

    fn name(&self) -> &str;
}
