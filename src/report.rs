//! Exporting and summarising sweep results.
//!
//! A result can be written as JSON, its per-iteration trace as CSV, and a
//! plain-text report can be generated for the terminal.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ordered_float::OrderedFloat;

use crate::error::Result;
use crate::point::PointSet;
use crate::sweep::{SearchResult, SweepStep};

/// Write the full result, trace included, as pretty JSON
pub fn export_json<P: AsRef<Path>>(result: &SearchResult, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_json(result, file)
}

pub fn write_json<W: Write>(result: &SearchResult, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, result)?;
    Ok(())
}

/// Write one CSV row per sweep iteration
pub fn export_trace_csv<P: AsRef<Path>>(trace: &[SweepStep], path: P) -> Result<()> {
    let file = File::create(path)?;
    write_trace_csv(trace, file)
}

pub fn write_trace_csv<W: Write>(trace: &[SweepStep], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for step in trace {
        writer.serialize(step)?;
    }

    writer.flush()?;
    Ok(())
}

/// Generate summary report
pub fn generate_report(set: &PointSet, result: &SearchResult) -> String {
    let mut report = String::new();

    report.push_str("========================================\n");
    report.push_str("        Threshold Sweep Report\n");
    report.push_str("========================================\n\n");

    report.push_str(&format!("Point set: {} ({} points)\n", set.name, set.len()));
    report.push_str(&result.to_string());

    if result.is_feasible() {
        let visited_value: f64 = result
            .route
            .ids()
            .iter()
            .filter_map(|id| set.get(*id))
            .map(|p| p.value)
            .sum();
        let total_value: f64 = set.points.iter().map(|p| p.value).sum();
        if total_value > 0.0 {
            report.push_str(&format!(
                "  Share of available value: {:.2}%\n",
                visited_value / total_value * 100.0
            ));
        }
    }

    if result.trace.is_empty() {
        return report;
    }

    report.push('\n');
    report.push_str(&format!(
        "{:<6} {:>12} {:>8} {:>10} {:>14} {:>12}\n",
        "Iter", "Threshold", "Targets", "Feasible", "Value", "Remaining"
    ));
    report.push_str("-".repeat(67).as_str());
    report.push('\n');

    for step in &result.trace {
        let value = step
            .value_earned
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        let remaining = step
            .remaining_budget
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "-".to_string());
        let marker = if step.improved { " *" } else { "" };

        report.push_str(&format!(
            "{:<6} {:>12.4} {:>8} {:>10} {:>14} {:>12}{}\n",
            step.iteration, step.threshold, step.targets, step.feasible, value, remaining, marker
        ));
    }

    report.push_str("-".repeat(67).as_str());
    report.push('\n');

    if let Some(peak) = result
        .trace
        .iter()
        .filter_map(|s| s.value_earned)
        .map(OrderedFloat)
        .max()
    {
        report.push_str(&format!("Peak value over the sweep: {:.2}\n", peak.0));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::Verdict;
    use crate::point::{Depot, Point};
    use crate::route::Route;
    use crate::sweep::optimize;

    fn sample() -> (PointSet, SearchResult) {
        let set = PointSet::new(
            "sample",
            vec![
                Point::new(1, 1.0, 0.0).with_score(0.2).with_value(10.0),
                Point::new(2, 2.0, 0.0).with_score(0.4).with_value(30.0),
            ],
        );
        let mut calls = 0;
        let mut oracle = |route: &Route, _points: &[Point]| {
            calls += 1;
            if calls < 3 {
                Verdict::Feasible { value_earned: 10.0 * route.len() as f64, remaining_budget: 1.0 }
            } else {
                Verdict::Rejected
            }
        };
        let result = optimize(&set.points, Depot::default(), 0.0, 0.25, &mut oracle).unwrap();
        (set, result)
    }

    #[test]
    fn test_trace_csv_has_row_per_step() {
        let (_, result) = sample();
        let mut buf = Vec::new();
        write_trace_csv(&result.trace, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), result.trace.len() + 1);
        assert!(lines[0].starts_with("iteration,threshold,targets"));
    }

    #[test]
    fn test_json_round_trips_route() {
        let (_, result) = sample();
        let mut buf = Vec::new();
        write_json(&result, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["route"], serde_json::json!([1, 2]));
        assert_eq!(value["halt"], "targets_exhausted");
    }

    #[test]
    fn test_infeasible_json_reloads_sentinels() {
        let set = sample().0;
        let mut oracle = |_route: &Route, _points: &[Point]| Verdict::Rejected;
        let result = optimize(&set.points, Depot::default(), 0.0, 0.25, &mut oracle).unwrap();

        let mut buf = Vec::new();
        write_json(&result, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["best_value"], "-inf");
        assert_eq!(value["remaining_budget"], "inf");

        let reloaded: SearchResult = serde_json::from_slice(&buf).unwrap();
        assert!(!reloaded.is_feasible());
        assert_eq!(reloaded.best_value, f64::NEG_INFINITY);
        assert_eq!(reloaded.remaining_budget, f64::INFINITY);
        assert_eq!(reloaded.trace, result.trace);
    }

    #[test]
    fn test_feasible_json_reloads() {
        let (_, result) = sample();
        let mut buf = Vec::new();
        write_json(&result, &mut buf).unwrap();

        let reloaded: SearchResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(reloaded.best_value, 20.0);
        assert_eq!(reloaded.remaining_budget, 1.0);
        assert_eq!(reloaded.route, result.route);
    }

    #[test]
    fn test_report_mentions_best() {
        let (set, result) = sample();
        let report = generate_report(&set, &result);

        assert!(report.contains("sample"));
        assert!(report.contains("Value earned: 20.00"));
        assert!(report.contains("Share of available value: 100.00%"));
    }
}
