//! Terminal output formatting
//!
//! Keeps presentation apart from calculation: report structs come in,
//! strings come out. Unavailable values render as "N/A" in tables and
//! as nulls in JSON.

use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::engine::TraceRecorder;
use crate::ledger::RowIssue;
use crate::reports::{CompositionReport, DetailReport, Diagnostic, EvolutionReport};
use crate::utils::{format_currency, format_quantity};

fn money(value: Option<Decimal>) -> String {
    value.map(format_currency).unwrap_or_else(|| "N/A".to_string())
}

fn signed_money(value: Decimal) -> colored::ColoredString {
    if value >= Decimal::ZERO {
        format_currency(value).green()
    } else {
        format_currency(value).red()
    }
}

fn signed_money_opt(value: Option<Decimal>) -> String {
    match value {
        Some(v) => signed_money(v).to_string(),
        None => "N/A".to_string(),
    }
}

/// Format the composition report for terminal table output
pub fn composition_table(report: &CompositionReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Composition as of {}\n\n",
        "📊".cyan().bold(),
        report.as_of
    ));

    if report.rows.is_empty() {
        output.push_str("No assets held at this date.\n");
        return output;
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Asset")]
        asset: String,
        #[tabled(rename = "Class")]
        class: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Invested")]
        invested: String,
        #[tabled(rename = "Sales")]
        sales: String,
        #[tabled(rename = "Income")]
        income: String,
        #[tabled(rename = "Gain")]
        gain: String,
    }

    let rows: Vec<Row> = report
        .rows
        .iter()
        .map(|r| Row {
            asset: r.asset.clone(),
            class: r.asset_class.clone().unwrap_or_else(|| "-".to_string()),
            quantity: format_quantity(r.quantity),
            price: money(r.current_price),
            value: money(r.current_value),
            invested: format_currency(r.invested),
            sales: format_currency(r.sales),
            income: format_currency(r.income),
            gain: signed_money_opt(r.total_gain),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(2..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{}", "━".repeat(60).bright_black()));
    output.push_str(&format!("\n{:<16} {}", "Assets:".bold(), report.rows.len()));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Total value:".bold(),
        format_currency(report.total_value)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Total invested:".bold(),
        format_currency(report.total_invested)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Net flows:".bold(),
        signed_money(report.net_flows)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Total gain:".bold(),
        signed_money(report.total_gain)
    ));
    if !report.total_invested.is_zero() {
        let pct = report.total_gain / report.total_invested * Decimal::ONE_HUNDRED;
        let pct_str = if pct >= Decimal::ZERO {
            format!("{:.2}%", pct).green()
        } else {
            format!("{:.2}%", pct).red()
        };
        output.push_str(&format!("\n{:<16} {}", "Return:".bold(), pct_str));
    }
    output.push('\n');

    output
}

/// Format the evolution report for terminal table output
pub fn evolution_table(report: &EvolutionReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Evolution from {} to {}\n\n",
        "📈".cyan().bold(),
        report.start,
        report.end
    ));

    if report.rows.is_empty() {
        output.push_str("No assets were held within this period.\n");
        return output;
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Asset")]
        asset: String,
        #[tabled(rename = "Value at start")]
        value_at_start: String,
        #[tabled(rename = "Value at end")]
        value_at_end: String,
        #[tabled(rename = "Sales")]
        sales: String,
        #[tabled(rename = "Income")]
        income: String,
        #[tabled(rename = "Net change")]
        net_change: String,
    }

    let rows: Vec<Row> = report
        .rows
        .iter()
        .map(|r| Row {
            asset: r.asset.clone(),
            value_at_start: money(r.value_at_start),
            value_at_end: money(r.value_at_end),
            sales: format_currency(r.sales_in_period),
            income: format_currency(r.income_in_period),
            net_change: signed_money_opt(r.net_change),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{}", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Value at start:".bold(),
        format_currency(report.total_value_at_start)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Value at end:".bold(),
        format_currency(report.total_value_at_end)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Sales:".bold(),
        format_currency(report.total_sales)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Income:".bold(),
        format_currency(report.total_income)
    ));
    output.push_str(&format!(
        "\n{:<16} {}\n",
        "Net change:".bold(),
        signed_money(report.total_net_change)
    ));

    output
}

/// Format the per-asset detail report for terminal table output
pub fn detail_table(report: &DetailReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} {} from {} to {}\n\n",
        "🔍".cyan().bold(),
        report.asset.bold(),
        report.start,
        report.end
    ));

    if report.rows.is_empty() {
        output.push_str("No activity for this asset in the period.\n");
        return output;
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Operation")]
        operation: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let rows: Vec<Row> = report
        .rows
        .iter()
        .map(|r| Row {
            date: r.date.to_string(),
            operation: r.label.clone(),
            quantity: r.quantity.map(format_quantity).unwrap_or_else(|| "-".to_string()),
            price: r.price.map(format_currency).unwrap_or_else(|| "-".to_string()),
            amount: money(r.amount),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::rounded());
    table.modify(Columns::new(2..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    output
}

#[derive(Serialize)]
struct JsonEnvelope<T: Serialize> {
    #[serde(flatten)]
    report: T,
    diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<crate::engine::TraceEvent>>,
}

fn to_json<T: Serialize>(report: T, diagnostics: &[Diagnostic], recorder: &TraceRecorder) -> String {
    let envelope = JsonEnvelope {
        report,
        diagnostics: diagnostics.to_vec(),
        trace: recorder
            .is_enabled()
            .then(|| recorder.events().to_vec()),
    };
    serde_json::to_string_pretty(&envelope)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

pub fn composition_json(report: &CompositionReport, recorder: &TraceRecorder) -> String {
    to_json(report, &report.diagnostics, recorder)
}

pub fn evolution_json(report: &EvolutionReport, recorder: &TraceRecorder) -> String {
    to_json(report, &report.diagnostics, recorder)
}

pub fn detail_json(report: &DetailReport, recorder: &TraceRecorder) -> String {
    to_json(report, &report.diagnostics, recorder)
}

/// Print skipped-row details followed by a per-field summary.
pub fn print_row_issues(source: &str, issues: &[RowIssue]) {
    if issues.is_empty() {
        return;
    }
    println!(
        "\n{} {} rows skipped in {}:",
        "⚠".yellow().bold(),
        issues.len(),
        source
    );
    for issue in issues {
        println!(
            "  row {}: {} = {:?} ({})",
            issue.row, issue.field, issue.value, issue.reason
        );
    }
    for (field, count) in RowIssue::summarize(issues) {
        println!("  {} issue(s) in field '{}'", count, field);
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!("{} {}", "⚠".yellow().bold(), diagnostic.message);
    }
}

pub fn print_trace(recorder: &TraceRecorder) {
    if !recorder.is_enabled() {
        return;
    }
    println!("\n{}", "Trace".bold());
    for event in recorder.events() {
        match serde_json::to_string(event) {
            Ok(line) => println!("  {}", line),
            Err(e) => println!("  <unserializable event: {}>", e),
        }
    }
}
