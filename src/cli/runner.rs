//! Subcommand dispatch: load the input files, run the requested report,
//! render it, and optionally export it.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::cli::{formatters, Cli, Commands};
use crate::engine::{Tolerance, TraceRecorder};
use crate::export;
use crate::ledger::{self, OperationLedger, RowIssue};
use crate::pricing::PriceTable;
use crate::reports;

pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Composition {
            operations,
            prices,
            as_of,
            export: export_path,
            trace,
            epsilon,
        } => {
            let (ledger, price_table) = load_inputs(&operations, &prices, cli.json)?;
            let as_of = match as_of.as_deref() {
                Some(raw) => parse_cli_date(raw)?,
                None => Local::now().date_naive(),
            };
            let tolerance = parse_tolerance(epsilon.as_deref())?;
            let mut recorder = recorder(trace);

            let report = reports::calculate_composition(
                &ledger,
                &price_table,
                as_of,
                tolerance,
                &mut recorder,
            );

            if let Some(path) = export_path {
                export::export_composition(&report, &path)?;
            }
            if cli.json {
                println!("{}", formatters::composition_json(&report, &recorder));
            } else {
                println!("{}", formatters::composition_table(&report));
                formatters::print_diagnostics(&report.diagnostics);
                formatters::print_trace(&recorder);
            }
            Ok(())
        }

        Commands::Evolution {
            operations,
            prices,
            from,
            to,
            export: export_path,
            trace,
            epsilon,
        } => {
            let (ledger, price_table) = load_inputs(&operations, &prices, cli.json)?;
            let start = parse_cli_date(&from)?;
            let end = parse_cli_date(&to)?;
            let tolerance = parse_tolerance(epsilon.as_deref())?;
            let mut recorder = recorder(trace);

            let report = reports::calculate_evolution(
                &ledger,
                &price_table,
                start,
                end,
                tolerance,
                &mut recorder,
            )?;

            if let Some(path) = export_path {
                export::export_evolution(&report, &path)?;
            }
            if cli.json {
                println!("{}", formatters::evolution_json(&report, &recorder));
            } else {
                println!("{}", formatters::evolution_table(&report));
                formatters::print_diagnostics(&report.diagnostics);
                formatters::print_trace(&recorder);
            }
            Ok(())
        }

        Commands::Detail {
            operations,
            prices,
            asset,
            from,
            to,
            export: export_path,
            trace,
            epsilon,
        } => {
            let (ledger, price_table) = load_inputs(&operations, &prices, cli.json)?;
            let start = parse_cli_date(&from)?;
            let end = parse_cli_date(&to)?;
            let tolerance = parse_tolerance(epsilon.as_deref())?;
            let mut recorder = recorder(trace);

            let asset_id = asset.trim().to_uppercase();
            let report = reports::asset_detail(
                &ledger,
                &price_table,
                &asset_id,
                start,
                end,
                tolerance,
                &mut recorder,
            )?;

            if let Some(path) = export_path {
                export::export_detail(&report, &path)?;
            }
            if cli.json {
                println!("{}", formatters::detail_json(&report, &recorder));
            } else {
                println!("{}", formatters::detail_table(&report));
                formatters::print_diagnostics(&report.diagnostics);
                formatters::print_trace(&recorder);
            }
            Ok(())
        }
    }
}

fn load_inputs(
    operations_path: &str,
    prices_path: &str,
    json: bool,
) -> Result<(OperationLedger, PriceTable)> {
    let (operations, op_issues) = ledger::parse_operations_csv(operations_path)
        .with_context(|| format!("cannot read operations from {}", operations_path))?;
    let (price_table, price_issues) = ledger::parse_prices_csv(prices_path)
        .with_context(|| format!("cannot read prices from {}", prices_path))?;

    debug!(
        "loaded {} operations, {} priced assets",
        operations.len(),
        price_table.assets().count()
    );
    report_issues("operations", &op_issues, json);
    report_issues("prices", &price_issues, json);

    Ok((OperationLedger::new(operations), price_table))
}

fn report_issues(source: &str, issues: &[RowIssue], json: bool) {
    if issues.is_empty() {
        return;
    }
    warn!("{}: {} rows skipped", source, issues.len());
    if !json {
        formatters::print_row_issues(source, issues);
    }
}

fn parse_cli_date(raw: &str) -> Result<NaiveDate> {
    ledger::parse_date(raw).with_context(|| format!("invalid date: {}", raw))
}

fn parse_tolerance(raw: Option<&str>) -> Result<Tolerance> {
    match raw {
        Some(value) => value
            .parse()
            .with_context(|| format!("invalid epsilon: {}", value)),
        None => Ok(Tolerance::default()),
    }
}

fn recorder(trace: bool) -> TraceRecorder {
    if trace {
        TraceRecorder::enabled()
    } else {
        TraceRecorder::disabled()
    }
}
