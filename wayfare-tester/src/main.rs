mod logic;
mod scenario;
mod util;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use crate::logic::reports::{
    generate_console_report, generate_csv_report, generate_json_report, generate_markdown_report,
};
use crate::logic::{
    BalanceAggregate, BalanceRecord, GameTester, LogicTester, ScenarioResult, SeedInfo,
    aggregate_balance, resolve_seed_inputs, run_balance_analysis, validate_balance_targets,
};
use crate::scenario::{get_scenario, list_scenarios};
use crate::util::split_csv;

#[derive(Parser, Debug)]
#[command(
    name = "wayfare-tester",
    version,
    about = "Automated QA harness for the Wayfare ride game"
)]
struct Args {
    /// Comma-separated scenario keys, or "all"
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List the available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Comma-separated seeds: decimal, 0x-prefixed hex, or "sweep"
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Simulation iterations per scenario per seed
    #[arg(long, default_value_t = 10)]
    iterations: u32,

    /// Run the balance sweep (at least 100 sessions per grid cell)
    #[arg(long)]
    balance: bool,

    /// Report format
    #[arg(long, default_value = "console", value_parser = ["console", "json", "markdown", "csv"])]
    report: String,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Narrate simulation steps and per-seed progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let mut output = OutputTarget::new(args.output.as_deref())?;
    if maybe_list_scenarios(&args, &mut output)? {
        output.flush_inner()?;
        return Ok(());
    }

    if args.report == "console" || args.output.is_some() {
        announce_banner(&args);
    }

    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let tester = GameTester::new(args.verbose);

    let results = run_logic_scenarios(&args, &tester, &seeds);
    let (records, aggregates) = gather_balance(&args, &tester, &seeds)?;
    if !aggregates.is_empty() {
        validate_balance_targets(&aggregates, &records)?;
    }

    write_reports(&args, &mut output, &results, &records, &aggregates, start.elapsed())?;
    output.flush_inner()?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner(args: &Args) {
    println!("{}", "🚕 Wayfare Automated Tester".cyan().bold());
    println!("{}", "=".repeat(40));
    println!(
        "Scenarios: {} | Seeds: {} | Iterations: {}",
        args.scenarios, args.seeds, args.iterations
    );
}

/// Print the scenario catalog when `--list-scenarios` was given. Returns
/// whether the run should stop there.
fn maybe_list_scenarios<W: Write>(args: &Args, out: &mut W) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:<22} {description}")?;
    }
    writeln!(out, "  {:<22} Every scenario above", "all")?;
    Ok(true)
}

fn expand_scenarios(spec: &str) -> Vec<String> {
    let tokens = split_csv(spec);
    if tokens.iter().any(|t| t == "all") {
        return list_scenarios()
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect();
    }
    tokens
}

fn run_logic_scenarios(args: &Args, tester: &GameTester, seeds: &[SeedInfo]) -> Vec<ScenarioResult> {
    let logic_tester = LogicTester::new(tester.clone());
    let mut results = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        match get_scenario(&name) {
            Some(scenario) => {
                results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
            }
            None => eprintln!("{} {name}", "⚠️  Unknown scenario:".yellow()),
        }
    }
    results
}

fn compute_balance_iterations(args: &Args) -> u32 {
    if !args.balance {
        return args.iterations;
    }
    let iterations = args.iterations.max(100);
    if iterations > args.iterations {
        println!("🔁 Balance run: raising iterations to {iterations} sessions per cell");
    }
    iterations
}

/// The sweep runs when asked for explicitly or when the report cannot be
/// produced without it.
fn gather_balance(
    args: &Args,
    tester: &GameTester,
    seeds: &[SeedInfo],
) -> Result<(Vec<BalanceRecord>, Vec<BalanceAggregate>)> {
    let wants_balance = args.balance || args.report == "csv";
    if !wants_balance {
        return Ok((Vec::new(), Vec::new()));
    }
    let records = run_balance_analysis(tester, seeds, compute_balance_iterations(args))?;
    log::debug!("collected {} balance records", records.len());
    let aggregates = aggregate_balance(&records);
    Ok((records, aggregates))
}

fn write_reports<W: Write>(
    args: &Args,
    out: &mut W,
    results: &[ScenarioResult],
    records: &[BalanceRecord],
    aggregates: &[BalanceAggregate],
    total: Duration,
) -> Result<()> {
    match args.report.as_str() {
        "json" => generate_json_report(out, results),
        "markdown" => generate_markdown_report(out, results, aggregates),
        "csv" => generate_csv_report(out, records),
        _ => generate_console_report(out, results, aggregates, total),
    }
}

/// Report sink: stdout by default, a file behind `--output`.
enum OutputTarget {
    Stdout(BufWriter<io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<&Path>) -> Result<Self> {
        Ok(match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating report file {}", path.display()))?;
                Self::File(BufWriter::new(file))
            }
            None => Self::Stdout(BufWriter::new(io::stdout())),
        })
    }

    fn flush_inner(&mut self) -> Result<()> {
        match self {
            Self::Stdout(w) => w.flush()?,
            Self::File(w) => w.flush()?,
        }
        Ok(())
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(w) => w.write(buf),
            Self::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{GameplayStrategy, RulesPreset, SimulationPlan};
    use clap::CommandFactory;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            balance: false,
            report: "console".to_string(),
            output: None,
            verbose: false,
        }
    }

    fn sample_results() -> Vec<ScenarioResult> {
        let scenario = get_scenario("smoke").unwrap();
        let tester = LogicTester::new(GameTester::new(false));
        tester.run_scenario(&scenario, &[SeedInfo::from_numeric(1)], 1)
    }

    fn sample_sweep() -> (Vec<BalanceRecord>, Vec<BalanceAggregate>) {
        let tester = GameTester::new(false);
        let plan = SimulationPlan::new(RulesPreset::Standard, GameplayStrategy::Decisive);
        let summary = tester.run_plan(&plan, 3);
        let records = vec![BalanceRecord {
            scenario_name: "Standard - Decisive".to_string(),
            preset: RulesPreset::Standard,
            strategy: GameplayStrategy::Decisive,
            seed_value: 3,
            metrics: summary.metrics,
        }];
        let aggregates = aggregate_balance(&records);
        (records, aggregates)
    }

    #[test]
    fn cli_definition_is_coherent() {
        Args::command().debug_assert();
    }

    #[test]
    fn balance_iterations_have_a_floor() {
        let mut args = base_args();
        args.balance = true;
        args.iterations = 5;
        assert_eq!(compute_balance_iterations(&args), 100);
        args.iterations = 250;
        assert_eq!(compute_balance_iterations(&args), 250);
        args.balance = false;
        assert_eq!(compute_balance_iterations(&args), 250);
    }

    #[test]
    fn expand_scenarios_keeps_order_and_honours_all() {
        assert_eq!(expand_scenarios("smoke,blitz"), vec!["smoke", "blitz"]);
        let all = expand_scenarios("all");
        assert_eq!(all.len(), list_scenarios().len());
        assert!(all.iter().any(|k| k == "smoke"));
        assert!(all.iter().any(|k| k == "timer-expiry"));
        assert_eq!(expand_scenarios("smoke,all"), all);
    }

    #[test]
    fn unknown_scenarios_yield_no_results() {
        let mut args = base_args();
        args.scenarios = "definitely-not-real".to_string();
        let tester = GameTester::new(false);
        let results = run_logic_scenarios(&args, &tester, &[SeedInfo::from_numeric(1)]);
        assert!(results.is_empty());
    }

    #[test]
    fn gather_balance_is_lazy_without_flags() {
        let args = base_args();
        let tester = GameTester::new(false);
        let (records, aggregates) =
            gather_balance(&args, &tester, &[SeedInfo::from_numeric(1)]).unwrap();
        assert!(records.is_empty());
        assert!(aggregates.is_empty());
    }

    #[test]
    fn csv_report_forces_the_sweep() {
        let mut args = base_args();
        args.report = "csv".to_string();
        let tester = GameTester::new(false);
        let (records, aggregates) =
            gather_balance(&args, &tester, &[SeedInfo::from_numeric(2)]).unwrap();
        assert!(!records.is_empty());
        assert!(!aggregates.is_empty());
        validate_balance_targets(&aggregates, &records).unwrap();
    }

    #[test]
    fn write_reports_produces_every_format() {
        let results = sample_results();
        let (records, aggregates) = sample_sweep();
        let mut args = base_args();

        for (format, needle) in [
            ("console", "Ride Test Results"),
            ("json", "\"scenario_name\""),
            ("markdown", "# Wayfare Logic Test Results"),
            ("csv", "scenario,preset,strategy"),
        ] {
            args.report = format.to_string();
            let mut buffer = Vec::new();
            write_reports(
                &args,
                &mut buffer,
                &results,
                &records,
                &aggregates,
                Duration::from_secs(1),
            )
            .unwrap();
            let text = String::from_utf8(buffer).unwrap();
            assert!(text.contains(needle), "{format} report missing {needle}");
        }
    }

    #[test]
    fn empty_results_serialize_to_an_empty_json_array() {
        let mut args = base_args();
        args.report = "json".to_string();
        let mut buffer = Vec::new();
        write_reports(&args, &mut buffer, &[], &[], &[], Duration::ZERO).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().trim(), "[]");
    }

    #[test]
    fn listing_scenarios_short_circuits() {
        let mut args = base_args();
        let mut buffer = Vec::new();
        assert!(!maybe_list_scenarios(&args, &mut buffer).unwrap());
        assert!(buffer.is_empty());

        args.list_scenarios = true;
        assert!(maybe_list_scenarios(&args, &mut buffer).unwrap());
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Available scenarios:"));
        assert!(text.contains("smoke"));
        assert!(text.contains("difficulty-ladder"));
        assert!(text.contains("all"));
    }

    #[test]
    fn output_target_writes_through_to_files() {
        let path = std::env::temp_dir().join(format!(
            "wayfare-tester-out-{}-{}.txt",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut target = OutputTarget::new(Some(&path)).unwrap();
        writeln!(target, "ride receipt").unwrap();
        target.flush_inner().unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(contents, "ride receipt\n");
    }
}
