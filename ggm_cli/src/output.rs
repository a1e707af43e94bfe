use std::io::Write;

use anyhow::Result;
use ggm_lib::{BatchEntry, DividendGrowth, DividendStats, Inference, KnownParameter, Valuation};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct ValuationRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Fair Price")]
    #[serde(rename = "Fair Price")]
    fair_price: String,
    #[tabled(rename = "Last Price")]
    #[serde(rename = "Last Price")]
    last_price: String,
    #[tabled(rename = "Upside")]
    #[serde(rename = "Upside")]
    upside: String,
    #[tabled(rename = "Beta")]
    #[serde(rename = "Beta")]
    beta: String,
    #[tabled(rename = "R²")]
    #[serde(rename = "R2")]
    r_squared: String,
    #[tabled(rename = "MSE")]
    #[serde(rename = "MSE")]
    mse: String,
    #[tabled(rename = "Growth")]
    #[serde(rename = "Growth")]
    growth: String,
    #[tabled(rename = "Required Return")]
    #[serde(rename = "Required Return")]
    required_return: String,
    #[tabled(rename = "Status")]
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Tabled, Serialize)]
struct InferenceRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Solved For")]
    #[serde(rename = "Solved For")]
    solved_for: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
    #[tabled(rename = "Known")]
    #[serde(rename = "Known")]
    known: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "D1")]
    #[serde(rename = "D1")]
    expected_dividend: String,
}

#[derive(Tabled, Serialize)]
struct StatsRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Count")]
    #[serde(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean")]
    #[serde(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Median")]
    #[serde(rename = "Median")]
    median: String,
    #[tabled(rename = "Std Dev")]
    #[serde(rename = "Std Dev")]
    std_dev: String,
    #[tabled(rename = "D0")]
    #[serde(rename = "D0")]
    yearly_dividend: String,
    #[tabled(rename = "Prior D0")]
    #[serde(rename = "Prior D0")]
    prior_yearly_dividend: String,
    #[tabled(rename = "Growth")]
    #[serde(rename = "Growth")]
    growth: String,
}

/// JSON shape of one batch entry.
#[derive(Serialize)]
pub struct ValuationReport<'a> {
    pub ticker: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation: Option<&'a Valuation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON shape of `stats`.
#[derive(Serialize)]
pub struct StatsReport<'a> {
    pub ticker: &'a str,
    pub stats: &'a DividendStats,
    pub growth: Option<&'a DividendGrowth>,
}

// -- Row builders --

fn build_valuation_rows(entries: &[BatchEntry]) -> Vec<ValuationRow> {
    entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(v) => {
                let inputs = v.inputs.as_ref();
                let regression = v.regression.as_ref();
                ValuationRow {
                    ticker: entry.ticker.clone(),
                    fair_price: format_money(v.fair_price()),
                    last_price: format_money(inputs.map(|i| i.last_price)),
                    upside: format_percent(v.upside()),
                    beta: format_ratio(regression.map(|r| r.beta)),
                    r_squared: format_ratio(regression.map(|r| r.r_squared)),
                    mse: format_small(regression.map(|r| r.mean_squared_error)),
                    growth: format_percent(inputs.map(|i| i.growth)),
                    required_return: format_percent(inputs.map(|i| i.required_return)),
                    status: if v.estimate.is_absent() {
                        "no dividends".to_string()
                    } else {
                        "ok".to_string()
                    },
                }
            }
            Err(e) => ValuationRow {
                ticker: entry.ticker.clone(),
                fair_price: "-".to_string(),
                last_price: "-".to_string(),
                upside: "-".to_string(),
                beta: "-".to_string(),
                r_squared: "-".to_string(),
                mse: "-".to_string(),
                growth: "-".to_string(),
                required_return: "-".to_string(),
                status: e.to_string(),
            },
        })
        .collect()
}

fn build_inference_rows(inferences: &[Inference]) -> Vec<InferenceRow> {
    inferences
        .iter()
        .map(|inf| {
            let known = match inf.result.known {
                KnownParameter::RequiredReturn(r) => format!("required return {:.2}%", r * 100.0),
                KnownParameter::Growth(g) => format!("growth {:.2}%", g * 100.0),
            };
            InferenceRow {
                ticker: inf.ticker.clone(),
                solved_for: inf.result.parameter.to_string(),
                value: format_percent(Some(inf.result.value)),
                known,
                price: format_money(Some(inf.result.observed_price)),
                expected_dividend: format!("{:.4}", inf.result.expected_dividend),
            }
        })
        .collect()
}

fn build_stats_rows(
    ticker: &str,
    stats: &DividendStats,
    growth: Option<&DividendGrowth>,
) -> Vec<StatsRow> {
    vec![StatsRow {
        ticker: ticker.to_string(),
        count: stats.count,
        mean: format!("{:.4}", stats.mean),
        median: format!("{:.4}", stats.median),
        std_dev: stats
            .std_dev
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string()),
        yearly_dividend: format_money(growth.map(|g| g.yearly_dividend)),
        prior_yearly_dividend: format_money(growth.map(|g| g.prior_yearly_dividend)),
        growth: format_percent(growth.map(|g| g.growth)),
    }]
}

// -- Rendering --

fn render<T: Tabled>(rows: Vec<T>, format: &OutputFormat) -> String {
    let mut table = Table::new(rows);
    if let OutputFormat::Markdown = format {
        table.with(Style::markdown());
    }
    table.to_string()
}

fn write_csv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(&rows, std::io::stdout()),
        OutputFormat::Json => {
            print_json(&rows);
            Ok(())
        }
        OutputFormat::Table | OutputFormat::Markdown => {
            println!("{}", render(rows, format));
            Ok(())
        }
    }
}

pub fn print_valuations(entries: &[BatchEntry], format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        let reports: Vec<ValuationReport> = entries
            .iter()
            .map(|e| ValuationReport {
                ticker: &e.ticker,
                valuation: e.outcome.as_ref().ok(),
                error: e.failure(),
            })
            .collect();
        print_json(&reports);
        return Ok(());
    }
    print_rows(build_valuation_rows(entries), format)
}

pub fn print_inference(inference: &Inference, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        print_json(inference);
        return Ok(());
    }
    print_rows(build_inference_rows(std::slice::from_ref(inference)), format)
}

pub fn print_stats(
    ticker: &str,
    stats: &DividendStats,
    growth: Option<&DividendGrowth>,
    format: &OutputFormat,
) -> Result<()> {
    if let OutputFormat::Json = format {
        print_json(&StatsReport {
            ticker,
            stats,
            growth,
        });
        return Ok(());
    }
    print_rows(build_stats_rows(ticker, stats, growth), format)
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_money(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${:.2}", v),
        None => "-".to_string(),
    }
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "-".to_string(),
    }
}

fn format_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => "-".to_string(),
    }
}

fn format_small(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2e}", v),
        None => "-".to_string(),
    }
}
