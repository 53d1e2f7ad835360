//! Prize Route Planner - Command Line Interface
//!
//! Builds nearest-neighbour routes over CSV point tables and runs the
//! score-threshold sweep against a time budget.

use clap::{Parser, Subcommand};
use prize_route_planner::heuristics::{CoincidentPolicy, NearestNeighbour, RouteBuilder};
use prize_route_planner::oracle::TimeBudgetOracle;
use prize_route_planner::point::{Depot, PointSet};
use prize_route_planner::report;
use prize_route_planner::sweep::{SweepConfig, ThresholdSearch};
use prize_route_planner::visualization::Visualizer;
use prize_route_planner::Result;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "prize-route-planner")]
#[command(version = "1.0")]
#[command(about = "Nearest-neighbour routing with a score-threshold sweep")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a nearest-neighbour route through every point
    Route {
        /// CSV point table
        #[arg(short, long)]
        points: PathBuf,

        #[command(flatten)]
        depot: DepotArgs,

        #[command(flatten)]
        builder: BuilderArgs,

        /// Write an SVG drawing of the route
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Sweep score thresholds and keep the best route that fits the time budget
    Sweep {
        /// CSV point table
        #[arg(short, long)]
        points: PathBuf,

        #[command(flatten)]
        depot: DepotArgs,

        #[command(flatten)]
        builder: BuilderArgs,

        /// First threshold tried
        #[arg(long, default_value = "0.0")]
        start: f64,

        /// Threshold increment between iterations
        #[arg(long, default_value = "0.01")]
        increment: f64,

        /// Stop after this many iterations
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Travel speed, in distance units per time unit
        #[arg(long, default_value = "30.0")]
        speed: f64,

        /// Time budget
        #[arg(long, default_value = "24.0")]
        budget: f64,

        /// Write the result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the per-iteration trace as CSV
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Write an SVG drawing of the best route
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Print the full report, trace included
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print statistics about a point table
    Analyze {
        /// CSV point table
        #[arg(short, long)]
        points: PathBuf,

        #[command(flatten)]
        depot: DepotArgs,
    },

    /// Write a random point table
    Generate {
        /// Number of points
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Coordinates fall in [-extent, extent]
        #[arg(long, default_value = "100.0")]
        extent: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct DepotArgs {
    /// Depot x coordinate
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    depot_x: f64,

    /// Depot y coordinate
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    depot_y: f64,
}

impl DepotArgs {
    fn depot(&self) -> Depot {
        Depot::new(self.depot_x, self.depot_y)
    }
}

#[derive(clap::Args)]
struct BuilderArgs {
    /// Report the route as finishing at the depot (reversed visiting order)
    #[arg(long)]
    end_at_depot: bool,

    /// Pass over points lying exactly on the current position while others remain
    #[arg(long)]
    skip_coincident: bool,
}

impl BuilderArgs {
    fn builder(&self) -> NearestNeighbour {
        let base = if self.end_at_depot {
            NearestNeighbour::ending_at_depot()
        } else {
            NearestNeighbour::new()
        };
        if self.skip_coincident {
            base.with_coincident(CoincidentPolicy::Skip)
        } else {
            base
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Route { points, depot, builder, svg } => {
            build_route(&points, depot.depot(), builder.builder(), svg.as_deref())
        }

        Commands::Sweep {
            points,
            depot,
            builder,
            start,
            increment,
            max_iterations,
            speed,
            budget,
            output,
            trace,
            svg,
            verbose,
        } => {
            let config = SweepConfig { start_threshold: start, increment, max_iterations };
            let outputs = SweepOutputs { json: output, trace, svg, verbose };
            run_sweep(&points, depot.depot(), builder.builder(), config, speed, budget, outputs)
        }

        Commands::Analyze { points, depot } => analyze_points(&points, depot.depot()),

        Commands::Generate { count, extent, seed, output } => generate_points(count, extent, seed, &output),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load(path: &Path) -> Result<PointSet> {
    println!("Loading points from {:?}...", path);
    let set = PointSet::from_file(path)?;
    println!("Loaded {} points", set.len());
    Ok(set)
}

fn build_route(path: &Path, depot: Depot, builder: NearestNeighbour, svg: Option<&Path>) -> Result<()> {
    let set = load(path)?;

    let start = Instant::now();
    let route = builder.build_route(&set.points, depot)?;
    let elapsed = start.elapsed().as_secs_f64();
    let length = route.length(&set.points, depot)?;

    println!("\n{} route ({} targets)", builder.name(), route.len());
    println!("  Length: {:.2}", length);
    println!("  Time: {:.4}s", elapsed);
    println!("  Route: {}", route);

    if let Some(svg_path) = svg {
        let viz = Visualizer::new();
        let title = format!("{} | length {:.2}", set.name, length);
        let drawing = viz.generate_svg(&set, depot, &route, &title)?;
        viz.save_svg(&drawing, svg_path)?;
        println!("Route drawing saved to {:?}", svg_path);
    }

    Ok(())
}

struct SweepOutputs {
    json: Option<PathBuf>,
    trace: Option<PathBuf>,
    svg: Option<PathBuf>,
    verbose: bool,
}

fn run_sweep(
    path: &Path,
    depot: Depot,
    builder: NearestNeighbour,
    config: SweepConfig,
    speed: f64,
    budget: f64,
    outputs: SweepOutputs,
) -> Result<()> {
    let set = load(path)?;
    let mut oracle = TimeBudgetOracle::new(depot, speed, budget)?;

    println!(
        "Sweeping thresholds from {} in steps of {} (speed {}, budget {})...",
        config.start_threshold, config.increment, speed, budget
    );
    let start = Instant::now();
    let search = ThresholdSearch::with_builder(builder, config);
    let result = search.optimize(&set.points, depot, &mut oracle)?;
    let elapsed = start.elapsed().as_secs_f64();

    if outputs.verbose {
        println!("\n{}", report::generate_report(&set, &result));
    } else {
        println!("\n{}", result);
    }
    println!("Solved in {:.4}s", elapsed);

    if !result.is_feasible() {
        log::warn!("no threshold produced a route within the budget");
    } else {
        println!("Best route: {}", result.route);
    }

    if let Some(json_path) = outputs.json {
        report::export_json(&result, &json_path)?;
        println!("Result saved to {:?}", json_path);
    }

    if let Some(trace_path) = outputs.trace {
        report::export_trace_csv(&result.trace, &trace_path)?;
        println!("Trace saved to {:?}", trace_path);
    }

    if let Some(svg_path) = outputs.svg {
        let viz = Visualizer::new();
        let title = format!("{} | value {:.2}", set.name, result.best_value);
        let drawing = viz.generate_svg(&set, depot, &result.route, &title)?;
        viz.save_svg(&drawing, &svg_path)?;
        println!("Route drawing saved to {:?}", svg_path);
    }

    result.require_feasible()?;
    Ok(())
}

fn analyze_points(path: &Path, depot: Depot) -> Result<()> {
    let set = load(path)?;

    println!("========== Point Set Analysis ==========\n");
    println!("{}", set.statistics(depot));

    let builder = NearestNeighbour::new();
    let start = Instant::now();
    let length = builder.path_length(&set.points, depot)?;

    println!("Quick Route Estimate:");
    println!("  Nearest neighbour through every point: {:.2}", length);
    println!("  Time: {:.4}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn generate_points(count: usize, extent: f64, seed: u64, output: &Path) -> Result<()> {
    let set = PointSet::random(count, seed, extent);
    let file = std::fs::File::create(output)?;
    set.write_csv(file)?;
    println!("Wrote {} points to {:?}", set.len(), output);
    Ok(())
}
