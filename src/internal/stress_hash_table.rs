#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::cast_precision_loss)]

use std::{
    ops::Range,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use clap::{Parser, ValueEnum};
use plotters::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use treetable::HashTable;

// One color per phase, in phase order
const COLORS: [RGBColor; 4] = [
    RGBColor(220, 50, 50),  // Bright red
    RGBColor(50, 90, 220),  // Bright blue
    RGBColor(50, 180, 50),  // Bright green
    RGBColor(180, 50, 180), // Bright magenta
];

/// Loads a table, then times insert, update and delete phases over it in batches.
#[derive(Debug, Parser)]
#[command(name = "stress_hash_table", version, about)]
struct Args {
    /// Number of keys loaded before the timed phases
    #[arg(long, default_value_t = 20_000)]
    size: u64,

    /// Order in which each phase visits its keys
    #[arg(long, value_enum, default_value_t = KeyOrder::Shuffled)]
    order: KeyOrder,

    /// Seed for the shuffled order
    #[arg(long)]
    seed: Option<u64>,

    /// Number of timed batches per phase
    #[arg(long, default_value_t = 10)]
    batches: usize,

    /// Write a chart of the batch timings to this PNG file
    #[arg(long)]
    plot: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KeyOrder {
    /// Keys in increasing order; with integer keys the tree degenerates into a chain
    Ascending,
    /// Keys in random order
    Shuffled,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Load,
    Insert,
    Update,
    Delete,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug)]
struct PhaseReport {
    phase: Phase,
    operations: usize,
    batches: Vec<Duration>,
}

impl PhaseReport {
    fn total(&self) -> Duration {
        self.batches.iter().sum()
    }

    fn log(&self) {
        let total = self.total();
        let per_op = if self.operations == 0 {
            0.0
        } else {
            total.as_secs_f64() * 1_000_000.0 / self.operations as f64
        };
        info!(
            phase = self.phase.name(),
            operations = self.operations,
            total_ms = total.as_secs_f64() * 1000.0,
            per_op_us = per_op,
            "phase finished"
        );
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn ordered_keys(range: Range<u64>, order: KeyOrder, rng: &mut StdRng) -> Vec<u64> {
    let mut keys: Vec<u64> = range.collect();
    if order == KeyOrder::Shuffled {
        keys.shuffle(rng);
    }
    keys
}

// Runs `operation` over `keys`, split into `batches` timed chunks
fn run_batched(
    phase: Phase,
    keys: &[u64],
    batches: usize,
    mut operation: impl FnMut(u64),
) -> PhaseReport {
    let chunk_size = keys.len().div_ceil(batches.max(1)).max(1);
    let batches = keys
        .chunks(chunk_size)
        .map(|chunk| {
            let start = Instant::now();
            for &key in chunk {
                operation(key);
            }
            start.elapsed()
        })
        .collect();

    let report = PhaseReport { phase, operations: keys.len(), batches };
    report.log();
    report
}

fn plot(path: &Path, reports: &[PhaseReport]) -> Result<(), Box<dyn std::error::Error>> {
    let font_family = "sans-serif";
    let line_width = 2;
    let marker_size = 4;

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let batch_count = reports.iter().map(|report| report.batches.len()).max().unwrap_or(0);
    let max_ms = reports
        .iter()
        .flat_map(|report| report.batches.iter())
        .map(|&duration| millis(duration))
        .fold(0.0, f64::max) *
        1.1; // Add 10% margin

    let mut chart = ChartBuilder::on(&root)
        .caption("Tree-backed hash table: time per batch", (font_family, 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..batch_count.max(1), 0.0..max_ms.max(1.0))?;

    chart
        .configure_mesh()
        .x_desc("Batch")
        .y_desc("Duration (ms)")
        .axis_desc_style((font_family, 16))
        .draw()?;

    for (report, color) in reports.iter().zip(COLORS.iter().cycle()) {
        let line_style = ShapeStyle::from(color).stroke_width(line_width);
        let points: Vec<(usize, f64)> =
            report.batches.iter().enumerate().map(|(i, &d)| (i, millis(d))).collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), line_style))?
            .label(report.phase.name())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
        chart.draw_series(
            points.iter().map(|&point| Circle::new(point, marker_size, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stress_hash_table=info,treetable=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut rng =
        args.seed.map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
    info!(size = args.size, order = ?args.order, batches = args.batches, "starting stress test");

    let upper = args.size.saturating_mul(2);
    let initial_keys = ordered_keys(0..args.size, args.order, &mut rng);
    let new_keys = ordered_keys(args.size..upper, args.order, &mut rng);
    let all_keys = ordered_keys(0..upper, args.order, &mut rng);

    let mut table = HashTable::new();
    let mut reports = Vec::with_capacity(4);

    reports.push(run_batched(Phase::Load, &initial_keys, args.batches, |key| {
        table.set(key, format!("value_{key}"));
    }));
    info!(len = table.len(), "initial data loaded");

    reports.push(run_batched(Phase::Insert, &new_keys, args.batches, |key| {
        table.set(key, format!("value_{key}"));
    }));

    reports.push(run_batched(Phase::Update, &all_keys, args.batches, |key| {
        if table.contains(&key) {
            table.set(key, format!("updated_{key}"));
        }
    }));

    reports.push(run_batched(Phase::Delete, &all_keys, args.batches, |key| {
        table.delete(&key);
    }));

    if table.is_empty() {
        info!("all keys deleted");
    } else {
        warn!(len = table.len(), "table not empty after deleting every key");
    }

    let total: Duration = reports.iter().map(PhaseReport::total).sum();
    info!(total_ms = millis(total), "stress test finished");

    if let Some(path) = &args.plot {
        plot(path, &reports)?;
        info!(path = %path.display(), "wrote batch timing chart");
    }

    Ok(())
}
