//! Prize Route Planner Library
//!
//! Picks and orders value-bearing targets to visit from a depot and back,
//! maximizing collected value under a budget enforced by a feasibility oracle.
//!
//! # Features
//!
//! - Euclidean distance matrix with the depot as its last entry
//! - Nearest-neighbour route construction with deterministic tie-breaking
//! - Score-threshold sweep that filters targets, rebuilds the route and keeps
//!   the best feasible result
//! - A time-budget oracle, CSV loading, JSON/CSV export and SVG rendering
//!
//! # Example
//!
//! ```no_run
//! use prize_route_planner::point::{Depot, PointSet};
//! use prize_route_planner::oracle::TimeBudgetOracle;
//! use prize_route_planner::sweep::{SweepConfig, ThresholdSearch};
//!
//! let set = PointSet::from_file("banks.csv").unwrap();
//! let mut oracle = TimeBudgetOracle::default();
//!
//! let search = ThresholdSearch::new(SweepConfig::new(0.0, 0.01));
//! let result = search.optimize(&set.points, Depot::default(), &mut oracle).unwrap();
//!
//! println!("{}", result);
//! ```

pub mod error;
pub mod point;
pub mod distance;
pub mod route;
pub mod heuristics;
pub mod oracle;
pub mod sweep;
pub mod report;
pub mod visualization;

pub use error::{PlannerError, Result};
pub use point::{Depot, Point, PointSet};
pub use route::Route;
pub use sweep::{SearchResult, SweepConfig, ThresholdSearch};
