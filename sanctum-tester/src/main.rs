mod logic;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    GameplayStrategy, ReportFormat, RunRecord, SimulationConfig, resolve_start_date, run_dates,
    run_simulation, summarize, write_report,
};

#[derive(Debug, Parser)]
#[command(name = "sanctum-tester", version = "0.1.0")]
#[command(about = "Deterministic balance sweeps for the Sanctum game engine")]
struct Args {
    /// Runs per strategy; each run starts one calendar day after the last
    #[arg(long, default_value_t = 10)]
    runs: usize,

    /// Calendar days to play per run
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// First start date: today, YYYY-MM-DD or YYYYMMDD
    #[arg(long, default_value = "today")]
    start_date: String,

    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "balanced")]
    strategy: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let format: ReportFormat = args.report.parse()?;

    if format == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let start = resolve_start_date(&args.start_date, Local::now().date_naive())?;
    let strategies = expand_strategies(&args.strategy)?;
    let records = run_all(&args, &strategies, start)?;
    let summaries = summarize(&records);

    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_report(
        output_target.writer(),
        format,
        &records,
        &summaries,
        start_time.elapsed(),
    )?;
    output_target.flush_inner()?;

    if records.iter().any(|r| !r.violations.is_empty()) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🧘 Sanctum Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in arg.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(GameplayStrategy::ALL);
            continue;
        }
        strategies.push(token.parse()?);
    }
    let mut seen = Vec::new();
    strategies.retain(|strategy| {
        if seen.contains(strategy) {
            false
        } else {
            seen.push(*strategy);
            true
        }
    });
    if strategies.is_empty() {
        strategies.push(GameplayStrategy::Balanced);
    }
    Ok(strategies)
}

fn run_all(args: &Args, strategies: &[GameplayStrategy], start: NaiveDate) -> Result<Vec<RunRecord>> {
    let dates = run_dates(start, args.runs);
    let mut records = Vec::with_capacity(strategies.len() * dates.len());
    for &strategy in strategies {
        for &date in &dates {
            let config = SimulationConfig::new(date, strategy).with_days(args.days);
            let record = run_simulation(&config)
                .with_context(|| format!("{strategy} run starting {date}"))?;
            if args.verbose {
                eprintln!(
                    "{} {} from {}: day {} ({})",
                    "▶".cyan(),
                    strategy,
                    date,
                    record.days_played,
                    record.ending.as_deref().unwrap_or("survived")
                );
            }
            records.push(record);
        }
    }
    Ok(records)
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
