//! `dentaldash run | validate | monthly`: config-driven conciliation.

use std::path::{Path, PathBuf};

use serde::Serialize;

use dentaldash_conciliation::aggregate::{monthly_sales_totals, monthly_treatment_counts};
use dentaldash_conciliation::config::{ConciliationConfig, PageConfig};
use dentaldash_conciliation::engine::{load_encounters_csv, load_sales_csv, run_page};
use dentaldash_conciliation::filter::RecordFilter;
use dentaldash_conciliation::model::{SalesMonthTotal, TreatmentMonthCount};
use dentaldash_conciliation::{ConciliationError, ConciliationInput};

use crate::exit_codes::{EXIT_CONCILIATION_INVALID_CONFIG, EXIT_CONCILIATION_RUNTIME};
use crate::CliError;

fn runtime_err(msg: impl Into<String>) -> CliError {
    CliError::new(EXIT_CONCILIATION_RUNTIME, msg)
}

fn engine_err(err: ConciliationError) -> CliError {
    match err {
        ConciliationError::ConfigParse(_) | ConciliationError::ConfigValidation(_) => {
            CliError::new(EXIT_CONCILIATION_INVALID_CONFIG, err.to_string())
        }
        ConciliationError::MissingColumn { .. } => runtime_err(err.to_string())
            .with_hint("map the header under [encounters.columns] or [sales.columns]"),
        _ => runtime_err(err.to_string()),
    }
}

fn load_config(config_path: &Path) -> Result<ConciliationConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| runtime_err(format!("cannot read config: {e}")))?;
    ConciliationConfig::from_toml(&config_str).map_err(engine_err)
}

/// Read both CSV sources, resolving paths relative to the config's directory.
fn load_input(config_path: &Path, config: &ConciliationConfig) -> Result<ConciliationInput, CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let today = chrono::Local::now().date_naive();

    let read = |file: &str| -> Result<String, CliError> {
        let path = base_dir.join(file);
        std::fs::read_to_string(&path)
            .map_err(|e| runtime_err(format!("cannot read {}: {e}", path.display())))
    };

    let encounters = load_encounters_csv(&read(&config.encounters.file)?, &config.encounters, today)
        .map_err(engine_err)?;
    let sales = load_sales_csv(&read(&config.sales.file)?, &config.sales, today)
        .map_err(engine_err)?;

    log::debug!(
        "loaded {} encounters from {} and {} sales from {}",
        encounters.len(),
        config.encounters.file,
        sales.len(),
        config.sales.file,
    );

    Ok(ConciliationInput { encounters, sales })
}

fn write_json<T: Serialize>(value: &T, json_output: bool, output_file: Option<&Path>) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| runtime_err(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    page: Option<usize>,
    limit: Option<usize>,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;

    let page = PageConfig {
        number: page.unwrap_or(config.page.number),
        size: limit.unwrap_or(config.page.size),
    };
    if page.number == 0 {
        return Err(CliError::args("--page starts at 1"));
    }
    if page.size == 0 {
        return Err(CliError::args("--limit must be at least 1"));
    }

    let input = load_input(&config_path, &config)?;
    let response = run_page(&config, input, page).map_err(engine_err)?;

    write_json(&response, json_output, output_file.as_deref())?;

    // Human summary to stderr
    let s = &response.stats;
    eprintln!(
        "{} ({}): {} records, {} perfect, {} likely, {} attention-only, {} sale-only, {:.1}% conciliated",
        config.name,
        config.procedure_code,
        s.total_records,
        s.perfect_matches,
        s.likely_matches,
        s.attention_only,
        s.sale_only,
        s.conciliation_rate,
    );
    let p = &response.pagination;
    eprintln!(
        "page {}/{} ({} shown){}",
        p.current_page,
        p.total_pages,
        response.records.len(),
        if p.has_more { ", more available" } else { "" },
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    eprintln!(
        "valid: '{}' for procedure {} (encounters: {}, sales: {})",
        config.name, config.procedure_code, config.encounters.file, config.sales.file,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// monthly
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MonthlyReport {
    treatments: Vec<TreatmentMonthCount>,
    sales: Vec<SalesMonthTotal>,
}

/// Monthly chart data. Uses the config's date filter but every procedure code.
pub fn cmd_monthly(config_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let input = load_input(&config_path, &config)?;

    let filter = RecordFilter::new(None, &config.filter).map_err(engine_err)?;
    let encounters = filter.encounters(input.encounters);
    let sales = filter.sales(input.sales);

    let report = MonthlyReport {
        treatments: monthly_treatment_counts(&encounters),
        sales: monthly_sales_totals(&sales),
    };

    if json_output {
        return write_json(&report, true, None);
    }

    println!("{:<8}  {:<10}  {:>8}  {:>14}", "month", "code", "count", "sales");
    for row in merge_rows(&report) {
        println!(
            "{:<8}  {:<10}  {:>8}  {:>14}",
            row.year_month,
            row.code,
            row.count,
            format_cents(row.total_cents),
        );
    }

    Ok(())
}

struct MonthlyRow<'a> {
    year_month: &'a str,
    code: &'a str,
    count: usize,
    total_cents: i64,
}

/// Join counts and totals on (month, code) for the text table.
fn merge_rows(report: &MonthlyReport) -> Vec<MonthlyRow<'_>> {
    use std::collections::BTreeMap;

    let mut rows: BTreeMap<(&str, &str), (usize, i64)> = BTreeMap::new();
    for t in &report.treatments {
        rows.entry((t.year_month.as_str(), t.treatment_code.as_str())).or_default().0 += t.count;
    }
    for s in &report.sales {
        let cell = rows.entry((s.year_month.as_str(), s.treatment_code.as_str())).or_default();
        cell.1 = cell.1.saturating_add(s.total_cents);
    }

    rows.into_iter()
        .map(|((year_month, code), (count, total_cents))| MonthlyRow {
            year_month,
            code,
            count,
            total_cents,
        })
        .collect()
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
