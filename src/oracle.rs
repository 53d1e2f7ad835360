//! Feasibility oracles.
//!
//! An oracle prices a candidate route against the full point dataset and
//! either accepts it, reporting what it earns and how much budget is left, or
//! rejects it for breaking the budget. Rejection is an ordinary answer, not an
//! error: the threshold sweep stops on it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::point::{Depot, Point};
use crate::route::{closed_length, Route};

/// Outcome of pricing one route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Feasible { value_earned: f64, remaining_budget: f64 },
    Rejected,
}

impl Verdict {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Verdict::Feasible { .. })
    }

    /// `(value_earned, remaining_budget)` or [`PlannerError::OracleRejected`]
    pub fn into_result(self) -> Result<(f64, f64)> {
        match self {
            Verdict::Feasible { value_earned, remaining_budget } => Ok((value_earned, remaining_budget)),
            Verdict::Rejected => Err(PlannerError::OracleRejected),
        }
    }
}

/// Judges whether a route fits the budget and what it earns.
pub trait FeasibilityOracle {
    fn evaluate(&mut self, route: &Route, points: &[Point]) -> Verdict;

    /// Depot the oracle prices routes from, if it has one. The sweep refuses
    /// to run when this differs from the depot routes are built from.
    fn depot(&self) -> Option<Depot> {
        None
    }
}

impl<F> FeasibilityOracle for F
where
    F: FnMut(&Route, &[Point]) -> Verdict,
{
    fn evaluate(&mut self, route: &Route, points: &[Point]) -> Verdict {
        self(route, points)
    }
}

/// Time-budget oracle.
///
/// Travel runs at a constant `speed` (distance units per time unit) from the
/// depot through every target and back, and each target adds its
/// `service_time`. A route whose total time exceeds `budget`, that names an
/// unknown target, or that repeats a target is rejected. Otherwise the route
/// earns the sum of its targets' values.
///
/// `depot` must be the depot the routes were built from; the threshold sweep
/// checks this through [`FeasibilityOracle::depot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeBudgetOracle {
    pub depot: Depot,
    pub speed: f64,
    pub budget: f64,
}

impl Default for TimeBudgetOracle {
    fn default() -> Self {
        TimeBudgetOracle {
            depot: Depot::default(),
            speed: 30.0,
            budget: 24.0,
        }
    }
}

impl TimeBudgetOracle {
    pub fn new(depot: Depot, speed: f64, budget: f64) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlannerError::invalid(format!("speed must be positive, got {}", speed)));
        }
        if !budget.is_finite() || budget < 0.0 {
            return Err(PlannerError::invalid(format!("budget must be non-negative, got {}", budget)));
        }
        Ok(TimeBudgetOracle { depot, speed, budget })
    }

    /// Total time the route takes, or `None` if it names an unknown or repeated id
    pub fn route_time(&self, route: &Route, points: &[Point]) -> Option<f64> {
        let stops = self.stops(route, points)?;
        Some(self.time_over(&stops))
    }

    /// The route's targets in visiting order
    fn stops<'a>(&self, route: &Route, points: &'a [Point]) -> Option<Vec<&'a Point>> {
        let by_id: HashMap<usize, &Point> = points.iter().map(|p| (p.id, p)).collect();
        let mut seen = HashSet::with_capacity(route.len());
        let mut stops = Vec::with_capacity(route.len());

        for id in route.ids() {
            if !seen.insert(*id) {
                log::warn!("route visits point {} twice", id);
                return None;
            }
            match by_id.get(id) {
                Some(p) => stops.push(*p),
                None => {
                    log::warn!("route visits unknown point {}", id);
                    return None;
                }
            }
        }
        Some(stops)
    }

    fn time_over(&self, stops: &[&Point]) -> f64 {
        let distance = closed_length(stops.iter().map(|p| (p.x, p.y)), self.depot);
        let service: f64 = stops.iter().map(|p| p.service_time).sum();
        distance / self.speed + service
    }
}

impl FeasibilityOracle for TimeBudgetOracle {
    fn evaluate(&mut self, route: &Route, points: &[Point]) -> Verdict {
        let Some(stops) = self.stops(route, points) else {
            return Verdict::Rejected;
        };

        let time = self.time_over(&stops);
        if time > self.budget {
            return Verdict::Rejected;
        }

        Verdict::Feasible {
            value_earned: stops.iter().map(|p| p.value).sum(),
            remaining_budget: self.budget - time,
        }
    }

    fn depot(&self) -> Option<Depot> {
        Some(self.depot)
    }
}
