use anyhow::Result;
use augdrill_core::numbers::{percent, round_tenths};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::analysis::{StrategyAggregate, StrategyRecord};

fn success_rate(results: &[ScenarioResult]) -> (usize, usize, f64) {
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let rate = percent(
        u32::try_from(passed).unwrap_or(u32::MAX),
        u32::try_from(total).unwrap_or(u32::MAX),
    );
    (total, passed, rate)
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: Option<&[StrategyAggregate]>,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let (total_tests, passed_tests, rate) = success_rate(results);
    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", (total_tests - passed_tests).to_string().red())?;
    writeln!(out, "Success rate: {rate:.1}%")?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{status} {} (seed {})",
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.average_duration),
        results.iter().max_by_key(|r| r.average_duration),
    ) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }

    if let Some(aggregates) = aggregates
        && !aggregates.is_empty()
    {
        writeln!(out)?;
        writeln!(out, "{}", "🎯 Strategy Summary".bright_magenta().bold())?;
        writeln!(out, "{}", "===================".magenta())?;
        for agg in aggregates {
            writeln!(
                out,
                "{}: {} runs, accuracy {:.1}% ± {:.1} (min {:.1}, max {:.1}), auto-loss {:.1}%, rerolls/run {:.1}",
                agg.scenario_name.bold(),
                agg.runs,
                agg.mean_accuracy,
                agg.std_accuracy,
                agg.min_accuracy,
                agg.max_accuracy,
                agg.auto_loss_pct,
                agg.mean_rerolls
            )?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    scenarios: &'a [ScenarioResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    strategies: Option<&'a [StrategyAggregate]>,
}

pub fn generate_json_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: Option<&[StrategyAggregate]>,
) -> Result<()> {
    let report = JsonReport {
        scenarios: results,
        strategies: aggregates,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: Option<&[StrategyAggregate]>,
) -> Result<()> {
    writeln!(out, "# Augment Drill Logic Test Results\n")?;

    let (total_tests, passed_tests, rate) = success_rate(results);
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(out, "- **Success rate**: {rate:.1}%\n")?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {status} {} (seed {})\n", result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }

    if let Some(aggregates) = aggregates
        && !aggregates.is_empty()
    {
        writeln!(out, "## Strategies\n")?;
        writeln!(out, "| Strategy | Runs | Accuracy % | Min % | Auto-loss % | Rerolls/run |")?;
        writeln!(out, "|---|---|---|---|---|---|")?;
        for agg in aggregates {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                agg.scenario_name,
                agg.runs,
                round_tenths(agg.mean_accuracy),
                round_tenths(agg.min_accuracy),
                round_tenths(agg.auto_loss_pct),
                round_tenths(agg.mean_rerolls)
            )?;
        }
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[StrategyRecord]) -> Result<()> {
    writeln!(
        out,
        "scenario,tier_mode,mode,strategy,seed,seed_value,correct,total,accuracy_pct,auto_losses,rerolls"
    )?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{:.1},{},{}",
            csv_field(&record.scenario_name),
            record.tier_mode,
            record.mode,
            record.strategy.key(),
            csv_field(&record.seed_label),
            record.seed_value,
            record.score.correct,
            record.score.total,
            record.accuracy_pct(),
            record.auto_losses,
            record.rerolls
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
