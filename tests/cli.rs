mod common;

use std::fs;

use assert_cmd::Command;
use cafe_sales_etl::{
    database::{self, DatabaseConfig},
    record::CleanTable,
};
use common::{TestWorkspace, fixture_path};
use predicates::str::contains;

fn cli() -> Command {
    Command::cargo_bin("cafe-sales-etl").expect("binary exists")
}

const CLEAN_ROWS: &[&str] = &[
    "TXN_1,Coffee,2,2.0,4.0,Cash,In-store,2023-09-08",
    "TXN_2,Cake,4,3.0,12.0,Credit Card,Takeaway,2023-05-16",
    "TXN_3,Coffee,1,2.0,2.0,Cash,Takeaway,2023-05-16",
];

#[test]
fn run_loads_and_reports_counts() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", CLEAN_ROWS);
    let db = workspace.database();

    cli()
        .args([
            "run",
            "-i",
            input.to_str().unwrap(),
            "--database",
            db.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Loaded 3 row(s) into 'sales_data'"));

    cli()
        .args(["validate", "--database", db.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Validation passed: 3 row(s)"));
}

#[test]
fn run_fails_validation_for_fixture_with_null_totals() {
    let workspace = TestWorkspace::new();
    let db = workspace.database();
    let fixture = fixture_path("dirty_cafe_sales.csv");

    cli()
        .args([
            "run",
            "-i",
            fixture.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("NULL total_spent"));

    cli()
        .args([
            "run",
            "-i",
            fixture.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
            "--skip-validation",
        ])
        .assert()
        .success()
        .stdout(contains("Loaded 20 row(s)"))
        .stdout(contains("7 dropped"));
}

#[test]
fn run_reads_settings_from_config_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", CLEAN_ROWS);
    let db = workspace.database();
    let config = workspace.write(
        "pipeline.yaml",
        &format!(
            "input: {}\ndatabase:\n  path: {}\ntable: nightly_sales\n",
            input.display(),
            db.display()
        ),
    );

    cli()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .success()
        .stdout(contains("into 'nightly_sales'"));
}

#[test]
fn missing_input_is_reported() {
    let workspace = TestWorkspace::new();
    cli()
        .args([
            "run",
            "-i",
            workspace.path().join("absent.csv").to_str().unwrap(),
            "-d",
            workspace.database().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("input file not found"));
}

#[test]
fn clean_then_load_round_trips_through_json() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", CLEAN_ROWS);
    let cleaned = workspace.path().join("cleaned.json");
    let db = workspace.database();

    cli()
        .args([
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            cleaned.to_str().unwrap(),
        ])
        .assert()
        .success();
    let table: CleanTable =
        serde_json::from_str(&fs::read_to_string(&cleaned).unwrap()).unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows[0].day_of_week, "Friday");

    cli()
        .args([
            "load",
            "-i",
            cleaned.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
            "--mode",
            "append",
        ])
        .assert()
        .success()
        .stdout(contains("Loaded 3 row(s)"));
}

#[test]
fn load_checks_hand_edited_json() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", CLEAN_ROWS);
    let cleaned = workspace.path().join("cleaned.json");
    let db = workspace.database();
    cli()
        .args([
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            cleaned.to_str().unwrap(),
        ])
        .assert()
        .success();
    let table: CleanTable =
        serde_json::from_str(&fs::read_to_string(&cleaned).unwrap()).unwrap();

    let mut missing_quantity = table.clone();
    missing_quantity.rows[1].quantity = None;
    let broken = workspace.write(
        "broken.json",
        &serde_json::to_string(&missing_quantity).unwrap(),
    );
    cli()
        .args(["load", "-i", broken.to_str().unwrap(), "-d", db.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("quantity is null"));

    let mut wrong_weekday = table;
    wrong_weekday.rows[0].day_of_week = "Monday".into();
    let edited = workspace.write(
        "edited.json",
        &serde_json::to_string(&wrong_weekday).unwrap(),
    );
    cli()
        .args(["load", "-i", edited.to_str().unwrap(), "-d", db.to_str().unwrap()])
        .assert()
        .success();
    let conn = database::open(&DatabaseConfig::new(db.clone())).unwrap();
    let weekday: String = conn
        .query_row(
            "SELECT day_of_week FROM sales_data WHERE transaction_id = 'TXN_1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(weekday, "Friday");
}

#[test]
fn load_refuses_empty_table_unless_allowed() {
    let workspace = TestWorkspace::new();
    let empty = workspace.write("empty.json", "{\"rows\": []}");
    let db = workspace.database();

    cli()
        .args([
            "load",
            "-i",
            empty.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("empty"));

    cli()
        .args([
            "load",
            "-i",
            empty.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
            "--allow-empty",
        ])
        .assert()
        .success()
        .stdout(contains("Loaded 0 row(s)"));
}

#[test]
fn clean_csv_output_uses_canonical_header() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", CLEAN_ROWS);
    cli()
        .args(["clean", "-i", input.to_str().unwrap(), "--format", "csv"])
        .assert()
        .success()
        .stdout(contains(
            "transaction_id,transaction_date,item,quantity,total_spent,price_per_unit,location,payment_method,day_of_week",
        ))
        .stdout(contains("TXN_1,2023-09-08 00:00:00,Coffee,2,4.0,2.0,In-store,Cash,Friday"));
}

#[test]
fn extract_previews_raw_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", &["TXN_1,Coffee,UNKNOWN,2.0,,Cash,,2023-09-08"]);
    cli()
        .args(["extract", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Transaction ID"))
        .stdout(contains("UNKNOWN"))
        .stdout(contains("NULL"));
}

#[test]
fn report_writes_csv_per_query() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_export("raw.csv", CLEAN_ROWS);
    let db = workspace.database();
    let sql_dir = workspace.path().join("sql_queries");
    workspace.write(
        "sql_queries/top_items.sql",
        "SELECT item, SUM(total_spent) AS revenue FROM sales_data GROUP BY item ORDER BY revenue DESC",
    );
    let reports = workspace.path().join("reports");

    cli()
        .args([
            "run",
            "-i",
            input.to_str().unwrap(),
            "-d",
            db.to_str().unwrap(),
        ])
        .assert()
        .success();
    cli()
        .args([
            "report",
            "-d",
            db.to_str().unwrap(),
            "--sql-dir",
            sql_dir.to_str().unwrap(),
            "--reports-dir",
            reports.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("top_items.csv"));

    let contents = fs::read_to_string(reports.join("top_items.csv")).unwrap();
    assert_eq!(contents, "item,revenue\nCake,12\nCoffee,6\n");
}

#[test]
fn ping_reports_sqlite_version() {
    let workspace = TestWorkspace::new();
    cli()
        .args(["ping", "-d", workspace.database().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Connected to SQLite 3."));
}
