mod common;
mod logic;

use anyhow::{Context, Result};
use augdrill_core::{TierMode, TrainingMode};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::{parse_flag, split_csv};
use logic::{
    DrillTester, GameplayStrategy, LogicTester, SeedInfo, StrategyAggregate, StrategyRecord,
    TesterAssets, aggregate_strategies, resolve_seed_inputs, run_strategy_analysis,
    validate_strategy_targets,
};

#[derive(Debug, Parser)]
#[command(name = "augdrill-tester", version = "0.1.0")]
#[command(about = "Automated QA for Augment Drill - sampler checks, reveal rules and simulated playthroughs")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Augment catalog JSON to test against instead of the bundled one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Override the tier mode of every scenario (mixed, silver, gold, prismatic)
    #[arg(long)]
    tier_mode: Option<String>,

    /// Override the training mode of every scenario (augment_2_1, augment_3_2, augment_4_2)
    #[arg(long)]
    training_mode: Option<String>,

    /// Strategies for the accuracy analysis (comma-separated, or `all`)
    #[arg(long)]
    strategies: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let assets = load_assets(&args)?;
    announce_banner(&assets);

    let tier_mode = parse_flag::<TierMode>("tier-mode", args.tier_mode.as_deref())?;
    let training_mode = parse_flag::<TrainingMode>("training-mode", args.training_mode.as_deref())?;
    let strategies = resolve_strategies(args.strategies.as_deref())?;

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let logic_seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    let tester = DrillTester::new(assets, args.verbose);

    let all_results = run_logic_scenarios(
        &args,
        &scenarios,
        &logic_seeds,
        &tester,
        (tier_mode, training_mode),
    );

    let (strategy_records, strategy_aggregates) = gather_strategies(
        &args,
        &tester,
        &strategies,
        &seed_infos,
        (tier_mode, training_mode),
    )?;

    write_reports(
        &args,
        &all_results,
        strategy_records.as_deref(),
        strategy_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = strategy_aggregates.as_ref() {
        validate_strategy_targets(aggregates, strategy_records.as_deref().unwrap_or(&[]))?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn load_assets(args: &Args) -> Result<TesterAssets> {
    match &args.catalog {
        Some(path) => TesterAssets::load_from(path),
        None => TesterAssets::load_default(),
    }
}

fn announce_banner(assets: &TesterAssets) {
    println!("{}", "🎲 Augment Drill Automated Tester".bright_cyan().bold());
    println!("{}", "==================================".cyan());
    println!(
        "Catalog: {} ({} augments)",
        assets.origin,
        assets.catalog.len()
    );
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn resolve_strategies(raw: Option<&str>) -> Result<Vec<GameplayStrategy>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let tokens = split_csv(raw);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let strategy = token
            .parse::<GameplayStrategy>()
            .with_context(|| format!("invalid --strategies entry '{token}'"))?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    logic_seeds: &[u64],
    tester: &DrillTester,
    (tier_mode, training_mode): (Option<TierMode>, Option<TrainingMode>),
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();
    if scenarios.is_empty() {
        return results;
    }

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(tester.clone());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            let scenario = scenario.with_modes(tier_mode, training_mode);
            results.extend(logic_tester.run_scenario(&scenario, logic_seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type StrategyOutput = (Option<Vec<StrategyRecord>>, Option<Vec<StrategyAggregate>>);

fn gather_strategies(
    args: &Args,
    tester: &DrillTester,
    strategies: &[GameplayStrategy],
    seed_infos: &[SeedInfo],
    (tier_mode, training_mode): (Option<TierMode>, Option<TrainingMode>),
) -> Result<StrategyOutput> {
    if strategies.is_empty() {
        return Ok((None, None));
    }

    println!("{}", "🎯 Running Strategy Analysis".bright_magenta().bold());
    println!("{}", "-".repeat(30).magenta());

    let records = run_strategy_analysis(
        tester,
        strategies,
        seed_infos,
        args.iterations,
        tier_mode.unwrap_or_default(),
        training_mode.unwrap_or_default(),
    )?;
    let aggregates = aggregate_strategies(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    strategy_records: Option<&[StrategyRecord]>,
    strategy_aggregates: Option<&[StrategyAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results, strategy_aggregates)?;
        }
        "markdown" => {
            if results.is_empty() && strategy_aggregates.is_none() {
                writeln!(
                    &mut output_target,
                    "# Augment Drill Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(
                    &mut output_target,
                    results,
                    strategy_aggregates,
                )?;
            }
        }
        "csv" => {
            if let Some(records) = strategy_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "No strategy analysis requested (use --strategies).")?;
            }
        }
        _ => {
            if results.is_empty() && strategy_aggregates.is_none() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    strategy_aggregates,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if !matches!(args.report.as_str(), "json" | "csv") {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
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

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::ScenarioResult;
    use augdrill_core::{Score, Tier};
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            catalog: None,
            tier_mode: None,
            training_mode: None,
            strategies: None,
        }
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("augdrill-{}-{name}", std::process::id()))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: Vec::new(),
            average_duration: Duration::ZERO,
            performance_data: Vec::new(),
        }
    }

    fn sample_record() -> StrategyRecord {
        StrategyRecord {
            scenario_name: "Random (mixed, augment_2_1)".to_string(),
            tier_mode: TierMode::Mixed,
            mode: TrainingMode::Augment21,
            strategy: GameplayStrategy::Random,
            seed_label: "1337".to_string(),
            seed_value: 1337,
            score: Score::new(5, 20),
            auto_losses: 3,
            rerolls: 7,
        }
    }

    #[test]
    fn expand_scenarios_handles_all() {
        let scenarios = expand_scenarios("smoke, all");
        assert_eq!(scenarios[0], "smoke");
        assert_eq!(scenarios.len(), list_scenarios().len());
        assert!(scenarios.contains(&"reveal-rules".to_string()));
    }

    #[test]
    fn resolve_strategies_parses_lists() {
        assert!(resolve_strategies(None).unwrap().is_empty());
        assert_eq!(
            resolve_strategies(Some("oracle,random,oracle")).unwrap(),
            vec![GameplayStrategy::Oracle, GameplayStrategy::Random]
        );
        assert_eq!(resolve_strategies(Some("ALL")).unwrap().len(), 4);
        assert!(resolve_strategies(Some("psychic")).is_err());
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_file("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("pool-exhaustion"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_file("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["scenarios"][0]["scenario_name"], "Smoke Test");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_file("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let temp = temp_file("report.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Some(&[sample_record()]), None, Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("scenario,tier_mode,mode,strategy"));
        assert!(content.contains("random"));
    }

    #[test]
    fn write_reports_console_with_strategies() {
        let temp = temp_file("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let aggregates = aggregate_strategies(&[sample_record()]);
        write_reports(
            &args,
            &[sample_result(false)],
            None,
            Some(&aggregates),
            Instant::now(),
        )
        .unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Strategy Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn run_logic_scenarios_applies_overrides_and_skips_unknown() {
        let tester = DrillTester::new(TesterAssets::load_default().unwrap(), false);
        let results = run_logic_scenarios(
            &base_args(),
            &["tier-spread".to_string(), "bogus".to_string()],
            &[5],
            &tester,
            (Some(TierMode::Fixed(Tier::Prismatic)), Some(TrainingMode::Augment32)),
        );
        assert_eq!(results.len(), 1);
        assert!(results[0].passed, "{:?}", results[0].failures);
    }

    #[test]
    fn gather_strategies_skips_without_request() {
        let tester = DrillTester::new(TesterAssets::load_default().unwrap(), false);
        let seeds = vec![SeedInfo::from_numeric(1)];
        let (records, aggregates) =
            gather_strategies(&base_args(), &tester, &[], &seeds, (None, None)).unwrap();
        assert!(records.is_none() && aggregates.is_none());

        let (records, aggregates) = gather_strategies(
            &base_args(),
            &tester,
            &[GameplayStrategy::Oracle],
            &seeds,
            (None, None),
        )
        .unwrap();
        assert_eq!(records.unwrap().len(), 1);
        assert_eq!(aggregates.unwrap()[0].runs, 1);
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
