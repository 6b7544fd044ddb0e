//! EtfScope CLI — analyze, batch, screen and synthetic-data commands.
//!
//! Commands:
//! - `analyze` — full signal, score and explanation for one price history
//! - `batch` — analyze an ETF pool in parallel and rank the results
//! - `screen` — filter a universe by scale, fee and liquidity
//! - `strategies` — print the scoring weight profiles
//! - `synthetic` — write a seeded synthetic price history CSV

mod logging;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use etfscope_core::scoring::ScoringStrategy;
use etfscope_core::screener::{screen, FeeSchedule, ScreenCriteria, ScreenResult};
use etfscope_core::AnalysisConfig;
use etfscope_runner::loader::write_history;
use etfscope_runner::{
    load_candidates_csv, load_history_csv, synthetic_history, write_csv, write_json,
    BatchDocument, BatchOutcome, BatchRunner, EtfInput, EtfReport, HistoryStore, PoolConfig,
};

#[derive(Parser)]
#[command(
    name = "etfscope",
    about = "EtfScope — ETF technical signals and multi-factor scoring"
)]
struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one ETF from a price history CSV.
    Analyze {
        /// Price history CSV (date,open,high,low,close,volume[,amount]).
        #[arg(long)]
        history: PathBuf,

        /// ETF code. Defaults to the history file name.
        #[arg(long)]
        code: Option<String>,

        /// Display name. Defaults to the code.
        #[arg(long)]
        name: Option<String>,

        /// Premium (+) or discount (-) to NAV, percent.
        #[arg(long, allow_hyphen_values = true)]
        premium: Option<f64>,

        /// Annual total fee, percent. Defaults to the built-in fee schedule.
        #[arg(long)]
        fee_rate: Option<f64>,

        /// Fund scale in 100 million units.
        #[arg(long)]
        scale: Option<f64>,

        /// Mean daily turnover in 100 million units.
        #[arg(long)]
        avg_amount: Option<f64>,

        /// Scoring strategy: conservative, balanced, aggressive.
        #[arg(long, default_value = "balanced")]
        strategy: ScoringStrategy,

        /// Analysis config TOML. Omitted fields use defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Analyze an ETF pool and rank the results.
    Batch {
        /// Pool config TOML.
        #[arg(long)]
        pool: PathBuf,

        /// Pool to analyze. Defaults to the file's default_pool.
        #[arg(long, conflicts_with = "all_pools")]
        pool_name: Option<String>,

        /// Analyze every ETF listed in any pool.
        #[arg(long, default_value_t = false)]
        all_pools: bool,

        /// Override the pool file's scoring strategy.
        #[arg(long)]
        strategy: Option<ScoringStrategy>,

        /// Write the ranked results as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write a flat CSV summary.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Analyze one ETF at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Screen a universe of ETFs by scale, fee and liquidity.
    Screen {
        /// Candidates CSV (code,name,scale[,avg_amount][,exchange]).
        #[arg(long)]
        candidates: PathBuf,

        /// Minimum fund scale in 100 million units.
        #[arg(long, default_value_t = 5.0)]
        min_scale: f64,

        /// Maximum annual total fee, percent.
        #[arg(long, default_value_t = 0.60)]
        max_fee: f64,

        /// Number of results to keep.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Exclude names containing this keyword (repeatable). Replaces the
        /// default money-market and bond keywords.
        #[arg(long)]
        exclude: Vec<String>,

        /// Keep every ETF even when several track the same index.
        #[arg(long, default_value_t = false)]
        no_dedup: bool,

        /// Print results as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the scoring strategies and their weights.
    Strategies,
    /// Write a deterministic synthetic price history CSV.
    Synthetic {
        /// Symbol; also seeds the random walk.
        #[arg(long)]
        symbol: String,

        /// Number of trading sessions.
        #[arg(long, default_value_t = 250)]
        days: usize,

        /// First session (YYYY-MM-DD).
        #[arg(long, default_value = "2024-01-02")]
        start: String,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    match cli.command {
        Commands::Analyze {
            history,
            code,
            name,
            premium,
            fee_rate,
            scale,
            avg_amount,
            strategy,
            config,
            json,
        } => {
            let code = match code {
                Some(c) => c,
                None => history
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .context("cannot derive a code from the history path; pass --code")?,
            };
            let bars = load_history_csv(&history)
                .with_context(|| format!("failed to load {}", history.display()))?;
            let mut input = EtfInput::new(code.clone(), name.unwrap_or(code), bars);
            input.premium_rate = premium;
            input.fee_rate = fee_rate;
            input.scale = scale;
            input.avg_amount = avg_amount;
            run_analyze(input, strategy, config.as_deref(), json)
        }
        Commands::Batch {
            pool,
            pool_name,
            all_pools,
            strategy,
            output,
            csv,
            sequential,
        } => run_batch(
            &pool,
            pool_name.as_deref(),
            all_pools,
            strategy,
            output.as_deref(),
            csv.as_deref(),
            sequential,
        ),
        Commands::Screen {
            candidates,
            min_scale,
            max_fee,
            top,
            exclude,
            no_dedup,
            json,
        } => {
            let mut criteria = ScreenCriteria {
                top_n: top,
                min_scale,
                max_fee_rate: max_fee,
                dedup_by_index: !no_dedup,
                ..ScreenCriteria::default()
            };
            if !exclude.is_empty() {
                criteria.exclude_keywords = exclude;
            }
            run_screen(&candidates, &criteria, json)
        }
        Commands::Strategies => {
            print_strategies();
            Ok(())
        }
        Commands::Synthetic {
            symbol,
            days,
            start,
            output,
        } => run_synthetic(&symbol, days, &start, &output),
    }
}

fn load_analysis_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    AnalysisConfig::from_toml(&content)
        .with_context(|| format!("invalid analysis config {}", path.display()))
}

fn run_analyze(
    input: EtfInput,
    strategy: ScoringStrategy,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_analysis_config(config_path)?;
    let runner = BatchRunner::new(config, strategy)?;
    let report = runner.analyze_etf(&input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, strategy);
    }
    Ok(())
}

fn run_batch(
    pool_path: &Path,
    pool_name: Option<&str>,
    all_pools: bool,
    strategy: Option<ScoringStrategy>,
    output: Option<&Path>,
    csv: Option<&Path>,
    sequential: bool,
) -> Result<()> {
    let pool = PoolConfig::from_file(pool_path)
        .with_context(|| format!("failed to load pool {}", pool_path.display()))?;

    let mut runner = BatchRunner::from_pool(&pool)?.with_parallelism(!sequential);
    if let Some(strategy) = strategy {
        runner = runner.with_strategy(strategy);
    }

    let entries = if all_pools {
        pool.all_entries()
    } else {
        pool.entries(pool_name)?
    };
    if entries.is_empty() {
        bail!("no ETFs to analyze in {}", pool_path.display());
    }

    let store = HistoryStore::new(Duration::from_secs(300));
    let outcome = runner.run_entries(&entries, &store);
    print_batch(&outcome, runner.strategy());

    if output.is_some() || csv.is_some() {
        let doc = BatchDocument::new(runner.strategy(), outcome);
        if let Some(path) = output {
            write_json(&doc, path)?;
            println!("Results written to: {}", path.display());
        }
        if let Some(path) = csv {
            write_csv(&doc.reports, path)?;
            println!("Summary written to: {}", path.display());
        }
    }
    Ok(())
}

fn run_screen(candidates_path: &Path, criteria: &ScreenCriteria, json: bool) -> Result<()> {
    let candidates = load_candidates_csv(candidates_path)
        .with_context(|| format!("failed to load {}", candidates_path.display()))?;
    let results = screen(&candidates, criteria, &FeeSchedule::standard())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_screen(&results, candidates.len());
    }
    Ok(())
}

fn run_synthetic(symbol: &str, days: usize, start: &str, output: &Path) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("invalid --start date '{start}'"))?;
    let bars = synthetic_history(symbol, start, days);
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_history(file, &bars)?;

    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => println!(
            "Wrote {} synthetic bars for {symbol} ({} to {}) to {}",
            bars.len(),
            first.date,
            last.date,
            output.display()
        ),
        _ => println!("Wrote an empty history to {}", output.display()),
    }
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.3}")).unwrap_or_else(|| "-".into())
}

fn print_report(r: &EtfReport, strategy: ScoringStrategy) {
    let s = &r.signal;
    let p = &r.performance;
    let b = &r.recommendation.breakdown;

    println!();
    println!("=== {} {} ===", r.code, r.name);
    println!("Period:        {} to {} ({} bars)", r.start_date, r.end_date, r.bar_count);
    println!("Last close:    {:.3}", r.last_close);
    println!();
    println!("Signal:        {} ({})", s.category.code(), s.category);
    println!("Confidence:    {:.0}%", s.confidence);
    println!("Score:         {:+.3}", s.score);
    println!("Risk:          {}", s.risk_level.as_str());
    println!(
        "Entry/Target/Stop: {} / {} / {}",
        fmt_opt(s.entry_price),
        fmt_opt(s.price_target),
        fmt_opt(s.stop_loss)
    );
    if let Some(sr) = &r.support_resistance {
        println!("Support/Resistance: {:.3} / {:.3}", sr.support, sr.resistance);
    }
    println!();
    println!("{:<12} {:<10} {:>9}", "Indicator", "Vote", "Strength");
    println!("{}", "-".repeat(33));
    for (kind, sub) in &s.sub_signals {
        println!(
            "{:<12} {:<10} {:>9.2}",
            format!("{kind:?}"),
            format!("{:?}", sub.signal),
            sub.strength
        );
    }
    println!();
    for reason in &s.reasons {
        println!("  - {reason}");
    }

    println!();
    println!("--- Performance ---");
    println!("Total return:      {:>8.2}%", p.total_return);
    println!("Annual return:     {:>8.2}%", p.annualized_return);
    println!("Annual volatility: {:>8.2}%", p.annualized_volatility);
    println!("Max drawdown:      {:>8.2}%", p.max_drawdown);
    println!("Sharpe ratio:      {:>8.2}", p.sharpe_ratio);

    println!();
    println!("--- Score ({strategy}) ---");
    println!("Total:      {:>6.1}", b.total_score);
    println!("Return:     {:>6.1}", b.return_score);
    println!("Risk:       {:>6.1}", b.risk_score);
    println!("Liquidity:  {:>6.1}", b.liquidity_score);
    println!("Fee:        {:>6.1}  ({:.2}%)", b.fee_score, r.fee_rate);
    println!("Technical:  {:>6.1}", b.technical_score);
    println!("Composite:  {:>6.1}", r.composite_score);

    let rec = &r.recommendation;
    println!();
    println!("Confidence: {} ({})", rec.confidence, rec.confidence_note);
    for reason in &rec.reasons {
        println!("  + {reason}");
    }
    for warning in &rec.warnings {
        println!("  ! {warning}");
    }
    for line in &rec.comparisons {
        println!("  = {line}");
    }
    println!();
}

fn print_batch(outcome: &BatchOutcome, strategy: ScoringStrategy) {
    println!();
    println!(
        "=== Batch ({strategy}): {} analyzed, {} failed ===",
        outcome.reports.len(),
        outcome.failures.len()
    );
    println!(
        "{:>4} {:<8} {:<20} {:<12} {:>5} {:>7} {:>9} {:>8} {:>7}",
        "#", "Code", "Name", "Signal", "Conf", "Total", "Composite", "Return", "Sharpe"
    );
    println!("{}", "-".repeat(88));
    for (i, r) in outcome.reports.iter().enumerate() {
        println!(
            "{:>4} {:<8} {:<20} {:<12} {:>4.0}% {:>7.1} {:>9.1} {:>7.2}% {:>7.2}",
            i + 1,
            r.code,
            truncate(&r.name, 20),
            r.signal.category.code(),
            r.signal.confidence,
            r.total_score(),
            r.composite_score,
            r.performance.annualized_return,
            r.performance.sharpe_ratio
        );
    }

    let buys: Vec<&str> = outcome
        .reports
        .iter()
        .filter(|r| r.signal.category.is_buy())
        .map(|r| r.code.as_str())
        .collect();
    if !buys.is_empty() {
        println!();
        println!("Buy signals: {}", buys.join(", "));
    }

    if !outcome.failures.is_empty() {
        println!();
        println!("Failures:");
        for f in &outcome.failures {
            println!("  {}: {}", f.code, f.error);
        }
    }
    println!();
}

fn print_screen(results: &[ScreenResult], universe: usize) {
    println!();
    println!("=== Screen: {} of {} candidates ===", results.len(), universe);
    println!(
        "{:>4} {:<8} {:<20} {:>9} {:>8} {:>6} {:>9}  {}",
        "#", "Code", "Name", "Scale", "Turnover", "Fee", "Liquidity", "Index"
    );
    println!("{}", "-".repeat(90));
    for (i, r) in results.iter().enumerate() {
        println!(
            "{:>4} {:<8} {:<20} {:>9.1} {:>8} {:>5.2}% {:>9.1}  {}",
            i + 1,
            r.code,
            truncate(&r.name, 20),
            r.scale,
            r.avg_amount.map(|a| format!("{a:.2}")).unwrap_or_else(|| "-".into()),
            r.fee_rate,
            r.liquidity_score,
            r.index_family
        );
    }
    println!();
}

fn print_strategies() {
    println!();
    println!(
        "{:<14} {:>7} {:>6} {:>10} {:>5} {:>10}",
        "Strategy", "Return", "Risk", "Liquidity", "Fee", "Technical"
    );
    println!("{}", "-".repeat(57));
    for strategy in ScoringStrategy::ALL {
        let w = strategy.weights();
        println!(
            "{:<14} {:>6.0}% {:>5.0}% {:>9.0}% {:>4.0}% {:>9.0}%",
            strategy.as_str(),
            w.return_weight * 100.0,
            w.risk * 100.0,
            w.liquidity * 100.0,
            w.fee * 100.0,
            w.technical * 100.0
        );
    }
    println!();
    for strategy in ScoringStrategy::ALL {
        println!("{:<14} {}", strategy.as_str(), strategy.description());
    }
    println!();
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars - 1).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_batch_flags() {
        let cli = Cli::try_parse_from([
            "etfscope", "batch", "--pool", "pool.toml", "--pool-name", "tech", "--strategy",
            "Aggressive", "--csv", "out.csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Batch {
                pool_name,
                strategy,
                csv,
                all_pools,
                ..
            } => {
                assert_eq!(pool_name.as_deref(), Some("tech"));
                assert_eq!(strategy, Some(ScoringStrategy::Aggressive));
                assert_eq!(csv, Some(PathBuf::from("out.csv")));
                assert!(!all_pools);
            }
            _ => panic!("expected batch"),
        }
    }

    #[test]
    fn pool_name_conflicts_with_all_pools() {
        let parsed = Cli::try_parse_from([
            "etfscope", "batch", "--pool", "p.toml", "--pool-name", "a", "--all-pools",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let parsed = Cli::try_parse_from([
            "etfscope", "analyze", "--history", "h.csv", "--strategy", "yolo",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn negative_premium_parses() {
        let cli = Cli::try_parse_from([
            "etfscope", "analyze", "--history", "510300.csv", "--premium", "-0.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { premium, .. } => assert_eq!(premium, Some(-0.5)),
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("CSI 300 ETF", 20), "CSI 300 ETF");
        assert_eq!(truncate("沪深300交易型开放式指数证券投资基金", 6), "沪深300~");
    }
}
