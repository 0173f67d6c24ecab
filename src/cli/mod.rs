//! Command-line shell
//!
//! Drives the core pipeline (load, detect, evaluate, export) and renders the
//! results in the terminal: cleaned-table preview, anomaly count, confusion
//! matrix, metrics at two decimal places, a two-bin histogram and the export
//! path.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use crate::anomaly::{detect, DEFAULT_CONTAMINATION};
use crate::error::Result;
use crate::evaluation::{evaluate, MetricsBundle};
use crate::export::export_annotated;
use crate::loader;
use crate::report::{anomaly_count, detection_histogram, preview, HistogramBin, ScreenSummary};

// ─── Styling helpers ───────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {} {}", dim(key), val.white());
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn bar(count: usize, max: usize) -> String {
    const WIDTH: usize = 32;
    if max == 0 {
        return String::new();
    }
    let filled = (count * WIDTH + max - 1) / max.max(1);
    "█".repeat(filled.min(WIDTH))
}

// ─── CLI definition ────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "anomalia")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Anomaly screening for financial spreadsheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full screen: load, detect, evaluate, export
    Screen {
        /// Input workbook (.xlsx, first sheet is read)
        data: PathBuf,

        /// Directory the export file is written into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Print the run summary as JSON instead of the report
        #[arg(long)]
        json: bool,
    },

    /// Load a workbook and show the cleaned table without running the models
    Info {
        /// Input workbook (.xlsx, first sheet is read)
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────

pub fn cmd_screen(data: &Path, out_dir: &Path, json: bool) -> Result<()> {
    let cleaned = loader::load(data)?;
    let features = cleaned.width();

    let mut annotated = detect(&cleaned, DEFAULT_CONTAMINATION)?;

    // The export carries the cleaned table plus the flag columns only, so it
    // is written before evaluation appends the heuristic truth column.
    let export_path = export_annotated(&annotated, out_dir)?;

    let metrics = evaluate(&mut annotated)?;
    let histogram = detection_histogram(&annotated)?;
    let anomalies = anomaly_count(&annotated)?;

    if json {
        let summary = ScreenSummary {
            rows: annotated.height(),
            features,
            anomalies,
            metrics,
            histogram: histogram.to_vec(),
            export_path: export_path.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
        return Ok(());
    }

    section("Dados");
    step_ok("workbook loaded");
    kv("rows", &annotated.height().to_string());
    kv("features", &features.to_string());
    println!("{}", preview(&cleaned, 5));

    section("Anomalias");
    println!(
        "  {} {}",
        accent("⚠"),
        format!("{anomalies} anomalous rows detected").white()
    );
    render_histogram(&histogram);

    section("Avaliação");
    render_metrics(&metrics);

    section("Exportação");
    step_ok(&format!("results written to {}", export_path.display()));

    Ok(())
}

pub fn cmd_info(data: &Path) -> Result<()> {
    let cleaned = loader::load(data)?;

    section("Dados");
    kv("rows", &cleaned.height().to_string());
    kv("features", &cleaned.width().to_string());
    println!("{}", preview(&cleaned, 10));

    Ok(())
}

fn render_histogram(bins: &[HistogramBin; 2]) {
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0);
    for b in bins.iter() {
        println!(
            "  {:<9} {} {}",
            dim(b.label),
            accent(&bar(b.count, max)),
            b.count
        );
    }
}

fn render_metrics(m: &MetricsBundle) {
    let [[tn, fp], [fn_, tp]] = m.confusion.rows();
    kv("accuracy", &format!("{:.2}", m.accuracy));
    kv("precision", &format!("{:.2}", m.precision));
    kv("recall", &format!("{:.2}", m.recall));
    println!("  {}", dim("confusion matrix [[TN, FP], [FN, TP]]"));
    println!("  {:>8} {:>6}", tn, fp);
    println!("  {:>8} {:>6}", fn_, tp);
}
