//! Score-threshold sweep.
//!
//! Each iteration keeps the targets whose score is strictly above the current
//! threshold, builds a route over them and asks a [`FeasibilityOracle`] to
//! price it. The best feasible value seen is kept and the threshold is raised
//! by a fixed increment until the oracle rejects a route.
//!
//! The sweep stops at the first rejected threshold. This assumes feasibility
//! only improves as the threshold rises (fewer targets, shorter routes). If an
//! oracle breaks that assumption, a better feasible threshold further along the
//! sweep is never tried.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::heuristics::{NearestNeighbour, RouteBuilder};
use crate::oracle::{FeasibilityOracle, Verdict};
use crate::point::{eligible, Depot, Point};
use crate::route::Route;

/// Sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// First threshold tried
    pub start_threshold: f64,
    /// Amount the threshold rises after each feasible iteration. Must be positive.
    pub increment: f64,
    /// Stop after this many oracle calls
    pub max_iterations: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            start_threshold: 0.0,
            increment: 0.01,
            max_iterations: None,
        }
    }
}

impl SweepConfig {
    pub fn new(start_threshold: f64, increment: f64) -> Self {
        SweepConfig { start_threshold, increment, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.start_threshold.is_finite() {
            return Err(PlannerError::invalid(format!(
                "start threshold must be finite, got {}",
                self.start_threshold
            )));
        }
        if !self.increment.is_finite() || self.increment <= 0.0 {
            return Err(PlannerError::invalid(format!(
                "increment must be finite and positive, got {}",
                self.increment
            )));
        }
        Ok(())
    }
}

/// Why the sweep stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The oracle rejected the route at the last threshold
    Rejected,
    /// The best result left no budget
    BudgetSpent,
    /// No target scores above the threshold any more
    TargetsExhausted,
    /// `max_iterations` oracle calls were made
    IterationLimit,
    /// The increment no longer changes the threshold at this magnitude
    ThresholdStalled,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HaltReason::Rejected => "route rejected",
            HaltReason::BudgetSpent => "budget spent",
            HaltReason::TargetsExhausted => "no eligible targets",
            HaltReason::IterationLimit => "iteration limit",
            HaltReason::ThresholdStalled => "threshold stalled",
        };
        f.write_str(s)
    }
}

/// One iteration of the sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStep {
    pub iteration: usize,
    pub threshold: f64,
    /// Targets that passed the threshold
    pub targets: usize,
    pub feasible: bool,
    pub value_earned: Option<f64>,
    pub remaining_budget: Option<f64>,
    /// Whether this step replaced the best result
    pub improved: bool,
}

/// Outcome of one sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best value earned; `-inf` when nothing was feasible
    #[serde(with = "extended_float")]
    pub best_value: f64,
    /// Budget left by the best route; `+inf` when nothing was feasible
    #[serde(with = "extended_float")]
    pub remaining_budget: f64,
    pub route: Route,
    pub targets_visited: usize,
    /// Threshold that produced the best route
    pub best_threshold: Option<f64>,
    /// Last threshold the oracle accepted
    pub last_feasible_threshold: Option<f64>,
    /// Route length over the targets of the final iteration
    pub total_path_length: f64,
    /// Closed length of the best route
    pub best_route_length: f64,
    pub halt: HaltReason,
    pub trace: Vec<SweepStep>,
}

impl SearchResult {
    /// False when the sweep never found a feasible route
    pub fn is_feasible(&self) -> bool {
        self.best_threshold.is_some()
    }

    /// The result, or [`PlannerError::Exhausted`] when nothing was feasible
    pub fn require_feasible(&self) -> Result<&Self> {
        if self.is_feasible() {
            Ok(self)
        } else {
            Err(PlannerError::Exhausted)
        }
    }

    /// Number of oracle calls made
    pub fn iterations(&self) -> usize {
        self.trace.len()
    }

    pub fn thresholds(&self) -> impl Iterator<Item = f64> + '_ {
        self.trace.iter().map(|s| s.threshold)
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sweep result ({} iterations, stopped: {})", self.iterations(), self.halt)?;
        if !self.is_feasible() {
            return writeln!(f, "  No feasible route found");
        }
        writeln!(f, "  Value earned: {:.2}", self.best_value)?;
        writeln!(f, "  Budget remaining: {:.2}", self.remaining_budget)?;
        writeln!(f, "  Targets visited: {}", self.targets_visited)?;
        if let Some(t) = self.best_threshold {
            writeln!(f, "  Best threshold: {:.4}", t)?;
        }
        if let Some(t) = self.last_feasible_threshold {
            writeln!(f, "  Last feasible threshold: {:.4}", t)?;
        }
        writeln!(f, "  Best route length: {:.2}", self.best_route_length)?;
        writeln!(f, "  Final path length: {:.2}", self.total_path_length)
    }
}

/// JSON has no infinities, so non-finite values are written as the strings
/// `"inf"`, `"-inf"` and `"NaN"` and read back from them.
mod extended_float {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("expected a number, \"inf\", \"-inf\" or \"NaN\", got {:?}", other))),
            },
        }
    }
}

/// Best-so-far state of one sweep
#[derive(Debug)]
struct Incumbent {
    value: f64,
    remaining_budget: f64,
    route: Route,
    threshold: Option<f64>,
}

impl Incumbent {
    fn new() -> Self {
        Incumbent {
            value: f64::NEG_INFINITY,
            remaining_budget: f64::INFINITY,
            route: Route::default(),
            threshold: None,
        }
    }

    /// Replace the incumbent if `value` is strictly better
    fn offer(&mut self, value: f64, remaining_budget: f64, route: Route, threshold: f64) -> bool {
        if value > self.value {
            self.value = value;
            self.remaining_budget = remaining_budget;
            self.route = route;
            self.threshold = Some(threshold);
            true
        } else {
            false
        }
    }
}

/// Threshold sweep driven by a route builder
#[derive(Debug, Clone, Default)]
pub struct ThresholdSearch<B = NearestNeighbour> {
    pub builder: B,
    pub config: SweepConfig,
}

impl ThresholdSearch<NearestNeighbour> {
    pub fn new(config: SweepConfig) -> Self {
        ThresholdSearch { builder: NearestNeighbour::new(), config }
    }
}

impl<B: RouteBuilder> ThresholdSearch<B> {
    pub fn with_builder(builder: B, config: SweepConfig) -> Self {
        ThresholdSearch { builder, config }
    }

    /// Run the sweep over `points`, pricing every candidate with `oracle`.
    ///
    /// Invalid point data is an error; a rejected route is not, it ends the
    /// sweep. Check [`SearchResult::is_feasible`] before trusting the result.
    pub fn optimize<O>(&self, points: &[Point], depot: Depot, oracle: &mut O) -> Result<SearchResult>
    where
        O: FeasibilityOracle + ?Sized,
    {
        self.config.validate()?;
        if let Some(priced_from) = oracle.depot() {
            if priced_from != depot {
                return Err(PlannerError::invalid(format!(
                    "oracle prices routes from depot ({}, {}) but routes are built from ({}, {})",
                    priced_from.x, priced_from.y, depot.x, depot.y
                )));
            }
        }

        let increment = self.config.increment;
        let mut best = Incumbent::new();
        let mut threshold = self.config.start_threshold;
        let mut last_feasible = None;
        let mut last_filtered: Vec<Point> = Vec::new();
        let mut trace: Vec<SweepStep> = Vec::new();

        let halt = loop {
            // continue only while budget is positive; a NaN budget stops too
            let budget_left = best.remaining_budget > 0.0;
            if !budget_left {
                break HaltReason::BudgetSpent;
            }
            if self.config.max_iterations.is_some_and(|max| trace.len() >= max) {
                break HaltReason::IterationLimit;
            }

            let filtered = eligible(points, threshold);
            if filtered.is_empty() {
                last_filtered = filtered;
                break HaltReason::TargetsExhausted;
            }

            let route = self.builder.build_route(&filtered, depot)?;
            let verdict = oracle.evaluate(&route, points);

            let mut step = SweepStep {
                iteration: trace.len(),
                threshold,
                targets: filtered.len(),
                feasible: verdict.is_feasible(),
                value_earned: None,
                remaining_budget: None,
                improved: false,
            };
            last_filtered = filtered;

            match verdict {
                Verdict::Feasible { value_earned, remaining_budget } => {
                    step.value_earned = Some(value_earned);
                    step.remaining_budget = Some(remaining_budget);
                    step.improved = best.offer(value_earned, remaining_budget, route, threshold);
                    log::debug!(
                        "threshold {:.4}: {} targets, value {:.2}, remaining {:.4}{}",
                        threshold,
                        step.targets,
                        value_earned,
                        remaining_budget,
                        if step.improved { " (best)" } else { "" }
                    );
                    trace.push(step);
                    last_feasible = Some(threshold);

                    let next = threshold + increment;
                    if next <= threshold {
                        break HaltReason::ThresholdStalled;
                    }
                    threshold = next;
                }
                Verdict::Rejected => {
                    log::debug!("threshold {:.4}: {} targets, rejected", threshold, step.targets);
                    trace.push(step);
                    break HaltReason::Rejected;
                }
            }
        };

        let total_path_length = self.builder.path_length(&last_filtered, depot)?;
        let best_route_length = best.route.length(points, depot)?;

        log::info!(
            "{} sweep stopped after {} iterations ({}): best value {}",
            self.builder.name(),
            trace.len(),
            halt,
            best.value
        );

        Ok(SearchResult {
            best_value: best.value,
            remaining_budget: best.remaining_budget,
            targets_visited: best.route.len(),
            route: best.route,
            best_threshold: best.threshold,
            last_feasible_threshold: last_feasible,
            total_path_length,
            best_route_length,
            halt,
            trace,
        })
    }
}

/// Sweep with the nearest-neighbour builder from `start_threshold` in steps of `increment`.
pub fn optimize<O>(
    points: &[Point],
    depot: Depot,
    start_threshold: f64,
    increment: f64,
    oracle: &mut O,
) -> Result<SearchResult>
where
    O: FeasibilityOracle + ?Sized,
{
    ThresholdSearch::new(SweepConfig::new(start_threshold, increment)).optimize(points, depot, oracle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::TimeBudgetOracle;

    fn scenario_points() -> Vec<Point> {
        vec![
            Point::new(1, 1.0, 0.0).with_score(5.0),
            Point::new(2, 2.0, 0.0).with_score(10.0),
            Point::new(3, 0.0, 1.0).with_score(1.0),
        ]
    }

    /// Accepts every route, earning one unit per target
    fn always_feasible(route: &Route, _points: &[Point]) -> Verdict {
        Verdict::Feasible { value_earned: route.len() as f64, remaining_budget: 1.0 }
    }

    #[test]
    fn test_first_iteration_routes_all_targets() {
        let mut routes = Vec::new();
        let mut oracle = |route: &Route, points: &[Point]| {
            routes.push(route.clone());
            always_feasible(route, points)
        };

        let result = optimize(&scenario_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert_eq!(routes[0].ids(), &[1, 2, 3]);
        assert_eq!(result.route.ids(), &[1, 2, 3]);
        assert_eq!(result.best_value, 3.0);
        assert_eq!(result.best_threshold, Some(0.0));
        assert_eq!(result.halt, HaltReason::TargetsExhausted);
    }

    #[test]
    fn test_thresholds_strictly_increase() {
        let mut calls = 0;
        let mut oracle = |route: &Route, points: &[Point]| {
            calls += 1;
            always_feasible(route, points)
        };

        let result = optimize(&scenario_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();
        let thresholds: Vec<f64> = result.thresholds().collect();

        assert_eq!(thresholds.len(), 10);
        assert!(thresholds.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(calls, result.iterations());
        assert_eq!(result.last_feasible_threshold, Some(9.0));
        // the final iteration found nothing above 10
        assert_eq!(result.total_path_length, 0.0);
    }

    #[test]
    fn test_stops_on_first_rejection() {
        let mut calls = 0;
        let mut oracle = |_route: &Route, _points: &[Point]| {
            calls += 1;
            if calls == 1 {
                Verdict::Feasible { value_earned: 42.0, remaining_budget: 3.0 }
            } else {
                Verdict::Rejected
            }
        };

        let result = optimize(&scenario_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert_eq!(calls, 2);
        assert_eq!(result.halt, HaltReason::Rejected);
        assert_eq!(result.best_value, 42.0);
        assert_eq!(result.remaining_budget, 3.0);
        assert_eq!(result.route.ids(), &[1, 2, 3]);
        assert_eq!(result.targets_visited, 3);
        assert_eq!(result.best_threshold, Some(0.0));
        assert_eq!(result.last_feasible_threshold, Some(0.0));

        // length is reported for the rejected iteration's targets (ids 1 and 2)
        assert!((result.total_path_length - 4.0).abs() < 1e-9);
        let expected_best = 1.0 + 1.0 + 5f64.sqrt() + 1.0;
        assert!((result.best_route_length - expected_best).abs() < 1e-9);
    }

    #[test]
    fn test_first_rejection_leaves_sentinels() {
        let mut oracle = |_route: &Route, _points: &[Point]| Verdict::Rejected;
        let result = optimize(&scenario_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert!(!result.is_feasible());
        assert_eq!(result.best_value, f64::NEG_INFINITY);
        assert_eq!(result.remaining_budget, f64::INFINITY);
        assert!(result.route.is_empty());
        assert_eq!(result.best_threshold, None);
        assert_eq!(result.iterations(), 1);
        assert!(matches!(result.require_feasible(), Err(PlannerError::Exhausted)));
    }

    #[test]
    fn test_keeps_strictly_best_value() {
        let values = [5.0, 8.0, 8.0, 2.0];
        let mut calls = 0;
        let mut oracle = |_route: &Route, _points: &[Point]| {
            let v = values.get(calls).copied();
            calls += 1;
            match v {
                Some(value_earned) => Verdict::Feasible { value_earned, remaining_budget: value_earned },
                None => Verdict::Rejected,
            }
        };

        let points: Vec<Point> = (1..=10)
            .map(|i| Point::new(i, i as f64, 0.0).with_score(i as f64))
            .collect();
        let result = optimize(&points, Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert_eq!(result.best_value, 8.0);
        assert_eq!(result.best_threshold, Some(1.0));
        assert_eq!(result.last_feasible_threshold, Some(3.0));
        assert_eq!(result.targets_visited, 9);
        let improved: Vec<bool> = result.trace.iter().map(|s| s.improved).collect();
        assert_eq!(improved, vec![true, true, false, false, false]);
    }

    #[test]
    fn test_stops_when_budget_spent() {
        let mut calls = 0;
        let mut oracle = |_route: &Route, _points: &[Point]| {
            calls += 1;
            Verdict::Feasible { value_earned: 1.0, remaining_budget: 0.0 }
        };

        let result = optimize(&scenario_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();
        assert_eq!(calls, 1);
        assert_eq!(result.halt, HaltReason::BudgetSpent);
        assert!(result.is_feasible());
    }

    #[test]
    fn test_iteration_limit() {
        let config = SweepConfig { max_iterations: Some(2), ..SweepConfig::new(0.0, 1.0) };
        let mut oracle = always_feasible;
        let result = ThresholdSearch::new(config)
            .optimize(&scenario_points(), Depot::default(), &mut oracle)
            .unwrap();

        assert_eq!(result.iterations(), 2);
        assert_eq!(result.halt, HaltReason::IterationLimit);
    }

    #[test]
    fn test_empty_points() {
        let mut calls = 0;
        let mut oracle = |route: &Route, points: &[Point]| {
            calls += 1;
            always_feasible(route, points)
        };

        let result = optimize(&[], Depot::default(), 0.0, 1.0, &mut oracle).unwrap();
        assert_eq!(calls, 0);
        assert!(!result.is_feasible());
        assert!(result.route.is_empty());
        assert_eq!(result.total_path_length, 0.0);
        assert_eq!(result.halt, HaltReason::TargetsExhausted);
    }

    #[test]
    fn test_rejects_bad_increment() {
        let mut oracle = always_feasible;
        for increment in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = optimize(&scenario_points(), Depot::default(), 0.0, increment, &mut oracle).unwrap_err();
            assert!(matches!(err, PlannerError::InvalidInput(_)));
        }
        let err = optimize(&scenario_points(), Depot::default(), f64::NAN, 1.0, &mut oracle).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_points_propagate() {
        let points = vec![
            Point::new(1, 1.0, 0.0).with_score(1.0),
            Point::new(1, 2.0, 0.0).with_score(1.0),
        ];
        let mut oracle = always_feasible;
        let err = optimize(&points, Depot::default(), 0.0, 1.0, &mut oracle).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput(_)));
    }

    #[test]
    fn test_end_at_depot_builder() {
        let search = ThresholdSearch::with_builder(NearestNeighbour::ending_at_depot(), SweepConfig::new(0.0, 1.0));
        let mut oracle = always_feasible;
        let result = search.optimize(&scenario_points(), Depot::default(), &mut oracle).unwrap();
        assert_eq!(result.route.ids(), &[3, 2, 1]);
    }

    #[test]
    fn test_nan_budget_stops_sweep() {
        let mut calls = 0;
        let mut oracle = |_route: &Route, _points: &[Point]| {
            calls += 1;
            Verdict::Feasible { value_earned: 1.0, remaining_budget: f64::NAN }
        };

        let points: Vec<Point> = (1..=5)
            .map(|i| Point::new(i, i as f64, 0.0).with_score(i as f64))
            .collect();
        let result = optimize(&points, Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert_eq!(calls, 1);
        assert_eq!(result.halt, HaltReason::BudgetSpent);
        assert!(result.remaining_budget.is_nan());
    }

    #[test]
    fn test_threshold_stalls_at_large_magnitude() {
        // 1e17 + 1.0 rounds back to 1e17
        let points = vec![Point::new(1, 1.0, 0.0).with_score(2e17)];
        let mut oracle = always_feasible;
        let result = optimize(&points, Depot::default(), 1e17, 1.0, &mut oracle).unwrap();

        assert_eq!(result.halt, HaltReason::ThresholdStalled);
        assert_eq!(result.iterations(), 1);
        assert_eq!(result.best_threshold, Some(1e17));
    }

    #[test]
    fn test_oracle_depot_must_match() {
        let mut oracle = TimeBudgetOracle::new(Depot::new(5.0, 5.0), 1.0, 100.0).unwrap();
        let err = optimize(&line_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput(_)));

        let mut oracle = TimeBudgetOracle::new(Depot::new(5.0, 5.0), 1.0, 100.0).unwrap();
        assert!(optimize(&line_points(), Depot::new(5.0, 5.0), 0.0, 1.0, &mut oracle).is_ok());
    }

    fn line_points() -> Vec<Point> {
        (1..=10)
            .map(|i| {
                Point::new(i, i as f64, 0.0)
                    .with_score(i as f64)
                    .with_value(10.0 * i as f64)
                    .with_service_time(1.0)
            })
            .collect()
    }

    #[test]
    fn test_time_budget_sweep() {
        // threshold 5 keeps targets 6..=10: 20 of travel plus 5 of service
        let mut oracle = TimeBudgetOracle::new(Depot::default(), 1.0, 29.0).unwrap();
        let result = optimize(&line_points(), Depot::default(), 5.0, 1.0, &mut oracle).unwrap();

        assert_eq!(result.best_value, 400.0);
        assert_eq!(result.remaining_budget, 4.0);
        assert_eq!(result.route.ids(), &[6, 7, 8, 9, 10]);
        assert_eq!(result.best_threshold, Some(5.0));
        assert_eq!(result.last_feasible_threshold, Some(9.0));
        assert_eq!(result.halt, HaltReason::TargetsExhausted);
        assert!((result.best_route_length - 20.0).abs() < 1e-9);

        let verdict = oracle.evaluate(&result.route, &line_points());
        assert_eq!(verdict, Verdict::Feasible { value_earned: 400.0, remaining_budget: 4.0 });
    }

    #[test]
    fn test_time_budget_sweep_spends_budget() {
        // every target: 20 of travel plus 10 of service
        let mut oracle = TimeBudgetOracle::new(Depot::default(), 1.0, 30.0).unwrap();
        let result = optimize(&line_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert_eq!(result.best_value, 550.0);
        assert_eq!(result.remaining_budget, 0.0);
        assert_eq!(result.halt, HaltReason::BudgetSpent);
        assert_eq!(result.iterations(), 1);
    }

    #[test]
    fn test_time_budget_sweep_rejects_everything() {
        let mut oracle = TimeBudgetOracle::new(Depot::default(), 1.0, 29.0).unwrap();
        let result = optimize(&line_points(), Depot::default(), 0.0, 1.0, &mut oracle).unwrap();

        assert!(!result.is_feasible());
        assert_eq!(result.halt, HaltReason::Rejected);
        assert!((result.total_path_length - 20.0).abs() < 1e-9);
    }
}
