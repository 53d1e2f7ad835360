//! Visualization utilities for routes.
//!
//! Generates SVG drawings of a route over its point set.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::point::{Depot, PointSet};
use crate::route::Route;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Point radius
    pub node_radius: f64,
    /// Label every point with its id
    pub labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 4.0,
            labels: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bounds(&self, set: &PointSet, depot: Depot) -> (f64, f64, f64, f64) {
        set.points.iter().fold(
            (depot.x, depot.x, depot.y, depot.y),
            |(min_x, max_x, min_y, max_y), p| (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y)),
        )
    }

    /// Generate SVG visualization of a route. Points not on the route are drawn faded.
    pub fn generate_svg(&self, set: &PointSet, depot: Depot, route: &Route, title: &str) -> Result<String> {
        let stops = route.resolve(&set.points)?;
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.bounds(set, depot);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1.0);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1.0);
        let scale = scale_x.min(scale_y);

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .target {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .skipped {{ fill: #bdc3c7; stroke: none; }}
    .depot {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .edge {{ stroke: #34495e; stroke-width: 1.5; fill: none; }}
    .label {{ font-family: Arial; font-size: 9px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
<defs>
<marker id="arrow" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto" markerUnits="strokeWidth">
<path d="M0,0 L0,6 L9,3 z" fill="#34495e"/>
</marker>
</defs>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">{} | {} of {} targets</text>
"##,
            self.margin,
            escape(title),
            route.len(),
            set.len()
        ));

        if !stops.is_empty() {
            let legs = std::iter::once((depot.x, depot.y))
                .chain(stops.iter().map(|p| (p.x, p.y)))
                .chain(std::iter::once((depot.x, depot.y)))
                .collect::<Vec<_>>();

            for pair in legs.windows(2) {
                let (x1, y1) = transform(pair[0].0, pair[0].1);
                let (x2, y2) = transform(pair[1].0, pair[1].1);
                svg.push_str(&format!(
                    r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="edge" marker-end="url(#arrow)"/>
"#,
                    x1, y1, x2, y2
                ));
            }
        }

        for point in &set.points {
            let (x, y) = transform(point.x, point.y);
            let class = if route.position(point.id).is_some() { "target" } else { "skipped" };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, self.node_radius, class
            ));

            if self.labels {
                svg.push_str(&format!(
                    r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                    x,
                    y - self.node_radius - 2.0,
                    point.id
                ));
            }
        }

        let (dx, dy) = transform(depot.x, depot.y);
        svg.push_str(&format!(
            r##"<rect x="{:.2}" y="{:.2}" width="{}" height="{}" class="depot"/>
"##,
            dx - self.node_radius * 1.5,
            dy - self.node_radius * 1.5,
            self.node_radius * 3.0,
            self.node_radius * 3.0
        ));

        svg.push_str("</svg>");

        Ok(svg)
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
