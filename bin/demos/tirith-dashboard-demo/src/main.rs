// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use clap::Parser;
use std::path::PathBuf;
use tirith::catalog::DEFAULT_CATALOG_YAML;
use tirith::session::{DEFAULT_COMPANION_CALLS_PATH, DEFAULT_MAP_PATH};
use tirith::{
    build_dashboard, DashboardConfig, DashboardReport, DashboardSelections, DashboardSession,
    DatasetCatalog, Panel, PanelContent,
};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(
    name = "tirith-dashboard-demo",
    about = "Builds CRM dashboards from CSV exports and prints every panel"
)]
struct Cli {
    /// CSV exports to ingest; dataset kinds are inferred from file names.
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Print chart panels as full JSON specs instead of one-line descriptions.
    #[arg(long)]
    json: bool,
    /// Cleaned calls export consumed by the deals correlation tab.
    #[arg(long, default_value = DEFAULT_COMPANION_CALLS_PATH)]
    calls_export: PathBuf,
    /// Pre-rendered map file embedded in the deals geography tab.
    #[arg(long, default_value = DEFAULT_MAP_PATH)]
    map: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter("info")
        .init();
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("Dashboard demo failed: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let catalog = DatasetCatalog::from_yaml_str(DEFAULT_CATALOG_YAML)?;
    let config = DashboardConfig::default();
    let selections = DashboardSelections::default();
    let mut session = DashboardSession::with_paths(cli.calls_export, cli.map);
    for file in &cli.files {
        let kind = session.ingest_csv(file)?;
        info!(file = %file.display(), kind = %kind, "export ingested");
    }
    println!("\n=== Session ===\n{}\n", session.summary());
    for kind in session.kinds() {
        let report = build_dashboard(&session, kind, &selections, &catalog, &config)?;
        print_report(&report, cli.json)?;
    }
    Ok(())
}

fn print_report(report: &DashboardReport, json: bool) -> anyhow::Result<()> {
    println!("=== {} dashboard ===\n{}\n", report.kind, report.summary());
    for panel in &report.panels {
        print_panel(panel, json)?;
    }
    Ok(())
}

fn print_panel(panel: &Panel, json: bool) -> anyhow::Result<()> {
    println!("--- {} ---", panel.title);
    match &panel.content {
        PanelContent::Chart(spec) => {
            if json {
                println!("{}", spec.to_json()?);
            } else {
                println!("{} chart, {} trace(s)", spec.kind, spec.traces.len());
            }
        }
        PanelContent::Summary(rows) => println!("{}", tirith::descriptive::summary_table(rows)),
        PanelContent::Numeric(rows) => {
            for row in rows {
                println!("{row}");
            }
        }
        PanelContent::Funnel(funnel) => println!("{}", funnel.table()),
        PanelContent::CrossTab(matrix) => println!(
            "{} x {}: {} rows, {} columns",
            matrix.row_key,
            matrix.col_key,
            matrix.rows.len(),
            matrix.cols.len()
        ),
        PanelContent::Correlation(result) => println!(
            "{} months, coefficient {}",
            result.len(),
            result
                .coefficient
                .map_or_else(|| "undefined".to_string(), |c| format!("{c:.2}"))
        ),
        PanelContent::Markup(text) => println!("{text}"),
        PanelContent::Notice(text) => println!("note: {text}"),
    }
    println!();
    Ok(())
}
