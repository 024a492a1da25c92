use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const OPERATIONS: &str = "\
Fecha,Operación,Tipo de activo,Activo,Nominales,Precio,Valor
2024-01-10,Compra,Bono,AL30,1000,95.50,95500
2024-03-01,Venta,Bono,AL30,1000,100,100000
2024-05-01,Compra,Bono,AL30,500,90,45000
";

const PRICES: &str = "\
Fecha,AL30
2024-01-01,95
2024-05-30,92
";

fn write_inputs(dir: &TempDir) -> (String, String) {
    let ops = dir.path().join("operations.csv");
    let prices = dir.path().join("prices.csv");
    fs::write(&ops, OPERATIONS).expect("failed to write operations fixture");
    fs::write(&prices, PRICES).expect("failed to write prices fixture");
    (
        ops.to_string_lossy().into_owned(),
        prices.to_string_lossy().into_owned(),
    )
}

#[test]
fn composition_no_color_shows_current_cycle_only() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("composition")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--as-of")
        .arg("2024-06-01");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("AL30"))
        .stdout(predicate::str::contains("46,000.00"))
        .stdout(predicate::str::contains("45,000.00"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn composition_json_output_is_parseable() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--json")
        .arg("composition")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--as-of")
        .arg("2024-06-01");

    let output = cmd.assert().success().get_output().stdout.clone();
    let parsed: serde_json::Value =
        serde_json::from_slice(&output).expect("stdout should be valid JSON");
    assert_eq!(parsed["rows"][0]["asset"], "AL30");
    assert_eq!(parsed["rows"][0]["quantity"], "500");
    assert!(parsed.get("trace").is_none());
}

#[test]
fn evolution_reports_period_sales() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("evolution")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--from")
        .arg("2024-01-01")
        .arg("--to")
        .arg("2024-06-01");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("100,000.00"))
        .stdout(predicate::str::contains("50,500.00"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn evolution_rejects_inverted_range() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("evolution")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--from")
        .arg("2024-06-01")
        .arg("--to")
        .arg("2024-01-01");

    cmd.assert().failure();
}

#[test]
fn detail_lists_operations_with_spanish_labels() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("detail")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--asset")
        .arg("al30")
        .arg("--from")
        .arg("2024-01-01")
        .arg("--to")
        .arg("2024-06-01");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Compra"))
        .stdout(predicate::str::contains("Venta"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn export_writes_csv_next_to_terminal_output() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);
    let out = dir.path().join("report.csv");

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("composition")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--as-of")
        .arg("2024-06-01")
        .arg("--export")
        .arg(out.to_string_lossy().as_ref());

    cmd.assert().success();

    let written = fs::read_to_string(&out).expect("export file should exist");
    assert!(written.starts_with("asset,quantity,current_value"));
    assert!(written.contains("AL30"));
}

#[test]
fn trace_flag_prints_reset_events() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (ops, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("composition")
        .arg("--operations")
        .arg(&ops)
        .arg("--prices")
        .arg(&prices)
        .arg("--as-of")
        .arg("2024-06-01")
        .arg("--trace");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reset_detected"))
        .stdout(predicate::str::contains("price_used"));
}

#[test]
fn missing_operations_file_fails_with_context() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let (_, prices) = write_inputs(&dir);

    let mut cmd = Command::new(cargo::cargo_bin!("cartera"));
    cmd.arg("--no-color")
        .arg("composition")
        .arg("--operations")
        .arg(dir.path().join("nope.csv").to_string_lossy().as_ref())
        .arg("--prices")
        .arg(&prices);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nope.csv"));
}
