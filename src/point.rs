//! Module for loading and representing target points.
//!
//! Point tables are CSV files with one row per target. The column names follow
//! the bank tables the planner was first used on (`x_coordinate`, `y_coordinate`,
//! `money`, `time`), with shorter aliases accepted on input.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A value-bearing target location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Unique identifier, as found in the input table
    pub id: usize,
    /// X coordinate
    #[serde(rename = "x_coordinate", alias = "x")]
    pub x: f64,
    /// Y coordinate
    #[serde(rename = "y_coordinate", alias = "y")]
    pub y: f64,
    /// Score used by the threshold sweep. Unscored points are never eligible.
    #[serde(default)]
    pub score: Option<f64>,
    /// Value collected when the target is visited
    #[serde(rename = "money", alias = "value", default)]
    pub value: f64,
    /// Time spent at the target
    #[serde(rename = "time", alias = "service_time", default)]
    pub service_time: f64,
}

impl Point {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Point { id, x, y, score: None, value: 0.0, service_time: 0.0 }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_service_time(mut self, service_time: f64) -> Self {
        self.service_time = service_time;
        self
    }

    /// Whether this point passes a threshold (score strictly greater).
    #[inline]
    pub fn exceeds(&self, threshold: f64) -> bool {
        matches!(self.score, Some(s) if s > threshold)
    }
}

/// The fixed start and end of every route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub x: f64,
    pub y: f64,
}

impl Depot {
    pub fn new(x: f64, y: f64) -> Self {
        Depot { x, y }
    }
}

impl Default for Depot {
    fn default() -> Self {
        Depot::new(0.0, 0.0)
    }
}

/// A named collection of points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSet {
    /// Name of the set (file stem when loaded from disk)
    pub name: String,
    pub points: Vec<Point>,
}

impl PointSet {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        PointSet { name: name.into(), points }
    }

    /// Load a point table from a CSV file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_reader(name, file)
    }

    /// Parse a point table from any CSV source
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut points = Vec::new();
        for record in rdr.deserialize() {
            let point: Point = record?;
            points.push(point);
        }

        let set = PointSet::new(name, points);
        log::debug!("loaded {} points for '{}'", set.len(), set.name);
        Ok(set)
    }

    /// Write the set as CSV, using the same column names `from_reader` expects
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for point in &self.points {
            wtr.serialize(point)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Generate a reproducible random point set.
    ///
    /// Coordinates are uniform in `[-extent, extent]`, scores uniform in `[0, 1)`.
    /// Values and service times are drawn so that scores are loosely
    /// correlated with value per unit of service time.
    pub fn random(n: usize, seed: u64, extent: f64) -> Self {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let extent = extent.abs().max(f64::EPSILON);

        let points = (1..=n)
            .map(|id| {
                let score: f64 = rng.gen();
                let service_time = rng.gen_range(0.1..0.6);
                let value = (score * 50_000.0 * service_time).round().max(1.0);
                Point {
                    id,
                    x: rng.gen_range(-extent..=extent),
                    y: rng.gen_range(-extent..=extent),
                    score: Some(score),
                    value,
                    service_time,
                }
            })
            .collect();

        PointSet::new(format!("random-{}-{}", n, seed), points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Points whose score is strictly greater than `threshold`
    pub fn eligible(&self, threshold: f64) -> Vec<Point> {
        eligible(&self.points, threshold)
    }

    /// Summary statistics about the set, measured from `depot`
    pub fn statistics(&self, depot: Depot) -> PointSetStatistics {
        let scores: Vec<f64> = self.points.iter().filter_map(|p| p.score).collect();
        let (mean_score, std_score) = match scores.len() {
            0 => (None, None),
            1 => (Some(scores[0]), None),
            _ => (
                Some(statrs::statistics::Statistics::mean(scores.iter())),
                Some(statrs::statistics::Statistics::std_dev(scores.iter())),
            ),
        };

        let min_score = scores.iter().copied().map(OrderedFloat).min().map(|s| s.0);
        let max_score = scores.iter().copied().map(OrderedFloat).max().map(|s| s.0);

        let max_depot_distance = self
            .points
            .iter()
            .map(|p| OrderedFloat(crate::distance::euclidean((p.x, p.y), (depot.x, depot.y))))
            .max()
            .map(|d| d.0)
            .unwrap_or(0.0);

        PointSetStatistics {
            name: self.name.clone(),
            num_points: self.points.len(),
            num_scored: scores.len(),
            min_score,
            max_score,
            mean_score,
            std_score,
            total_value: self.points.iter().map(|p| p.value).sum(),
            total_service_time: self.points.iter().map(|p| p.service_time).sum(),
            max_depot_distance,
        }
    }
}

/// Filter a point slice down to the points whose score is strictly greater than `threshold`
pub fn eligible(points: &[Point], threshold: f64) -> Vec<Point> {
    points.iter().filter(|p| p.exceeds(threshold)).cloned().collect()
}

/// Statistics about a point set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSetStatistics {
    pub name: String,
    pub num_points: usize,
    pub num_scored: usize,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub mean_score: Option<f64>,
    pub std_score: Option<f64>,
    pub total_value: f64,
    pub total_service_time: f64,
    pub max_depot_distance: f64,
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}

impl std::fmt::Display for PointSetStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Point set: {}", self.name)?;
        writeln!(f, "  Points: {} ({} scored)", self.num_points, self.num_scored)?;
        writeln!(
            f,
            "  Score: min {} / max {} / mean {} / std {}",
            fmt_opt(self.min_score),
            fmt_opt(self.max_score),
            fmt_opt(self.mean_score),
            fmt_opt(self.std_score)
        )?;
        writeln!(f, "  Total value: {:.2}", self.total_value)?;
        writeln!(f, "  Total service time: {:.2}", self.total_service_time)?;
        writeln!(f, "  Farthest from depot: {:.2}", self.max_depot_distance)
    }
}
