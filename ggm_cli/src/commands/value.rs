//! `ggm value`: fair prices for a batch of tickers.
//!
//! The market index and risk-free series are loaded once; tickers are then
//! valued concurrently with the Semaphore + JoinSet + mpsc pattern and
//! reported in the order they were given.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use ggm_lib::pipeline::value_entry;
use ggm_lib::{BatchEntry, DividataSource, GgmError, MarketContext, ValuationConfig, YahooClient};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::output::{print_valuations, OutputFormat};

#[derive(Args)]
pub struct ValueArgs {
    /// Ticker symbols (e.g. KO PEP JNJ)
    #[arg(required = true)]
    pub tickers: Vec<String>,

    /// Valuation date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Expected market return as a fraction, e.g. 0.08 (defaults to the index return over the window)
    #[arg(long)]
    pub market_return: Option<f64>,

    /// Maximum number of tickers fetched at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

pub async fn run(args: &ValueArgs, config: &ValuationConfig, format: &OutputFormat) -> Result<()> {
    let mut config = config.clone();
    if let Some(m) = args.market_return {
        config.market_return = Some(m);
    }
    if let Some(n) = args.concurrency {
        config.concurrency = n;
    }
    config.validate()?;
    let end = super::parse_end_date(args.end_date.as_deref())?;

    let yahoo = Arc::new(YahooClient::new()?.with_risk_free_symbol(&config.risk_free_symbol));
    let dividata = Arc::new(DividataSource::new()?);
    let ctx = Arc::new(MarketContext::load(yahoo.as_ref(), &config, end).await?);

    let total = args.tickers.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}",
    )?);
    pb.set_message("valuing tickers...");

    let semaphore = Arc::new(Semaphore::new(config.concurrency));
    let (tx, mut rx) = mpsc::channel::<(usize, BatchEntry)>(config.concurrency * 2);
    let mut join_set = JoinSet::new();

    for (idx, ticker) in args.tickers.iter().cloned().enumerate() {
        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let ctx = Arc::clone(&ctx);
        let yahoo = Arc::clone(&yahoo);
        let dividata = Arc::clone(&dividata);

        join_set.spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let entry = value_entry(&ctx, yahoo.as_ref(), dividata.as_ref(), &ticker).await;
            let _ = sender.send((idx, entry)).await;
        });
    }
    drop(tx);

    let mut slots: Vec<Option<BatchEntry>> = (0..total).map(|_| None).collect();
    while let Some((idx, entry)) = rx.recv().await {
        pb.set_message(entry.ticker.clone());
        pb.inc(1);
        slots[idx] = Some(entry);
    }
    while let Some(joined) = join_set.join_next().await {
        if let Err(e) = joined {
            eprintln!("Valuation task failed: {}", e);
        }
    }
    pb.finish_and_clear();

    let entries: Vec<BatchEntry> = slots
        .into_iter()
        .zip(&args.tickers)
        .map(|(slot, ticker)| {
            slot.unwrap_or_else(|| BatchEntry {
                ticker: ticker.trim().to_uppercase(),
                outcome: Err(GgmError::Task("valuation did not complete".to_string())),
            })
        })
        .collect();

    let failed = entries.iter().filter(|e| e.failure().is_some()).count();
    if failed > 0 {
        eprintln!("{} of {} tickers could not be valued", failed, total);
    }

    print_valuations(&entries, format)
}
