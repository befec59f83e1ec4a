use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::logic::balance::{BalanceAggregate, BalanceRecord};
use crate::logic::tester::ScenarioResult;

/// Human-oriented run report with per-scenario detail and, when a sweep
/// ran, the balance summary table.
pub fn generate_console_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[BalanceAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out, "\n{}", "📊 Ride Test Results".cyan().bold())?;
    writeln!(out, "{}", "=".repeat(50))?;

    let passed = results.iter().filter(|r| r.passed).count();
    let iterations: u32 = results.iter().map(|r| r.iterations_run).sum();
    writeln!(
        out,
        "Scenarios: {} | Passed: {} | Failed: {} | Iterations: {}",
        results.len(),
        passed,
        results.len() - passed,
        iterations
    )?;
    writeln!(out)?;

    for result in results {
        let mark = if result.passed {
            "✅".green()
        } else {
            "❌".red()
        };
        writeln!(
            out,
            "{mark} {} ({}/{} clean, avg {:?})",
            result.scenario_name,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration
        )?;
        for failure in result.failures.iter().take(5) {
            writeln!(out, "     {}", failure.red())?;
        }
        if result.failures.len() > 5 {
            writeln!(out, "     ... and {} more", result.failures.len() - 5)?;
        }
    }

    if let Some(fastest) = results.iter().min_by_key(|r| r.average_duration) {
        if let Some(slowest) = results.iter().max_by_key(|r| r.average_duration) {
            writeln!(out)?;
            writeln!(out, "{}", "⏱  Performance".cyan().bold())?;
            writeln!(
                out,
                "Fastest: {} ({:?}) | Slowest: {} ({:?})",
                fastest.scenario_name,
                fastest.average_duration,
                slowest.scenario_name,
                slowest.average_duration
            )?;
        }
    }

    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", "🚕 Balance Summary".cyan().bold())?;
        writeln!(out, "{}", "-".repeat(50))?;
        for aggregate in aggregates {
            writeln!(
                out,
                "{} ({} sessions)",
                aggregate.scenario_name.bold(),
                aggregate.iterations
            )?;
            #[rustfmt::skip]
            writeln!(
                out,
                "  points {:.0} ± {:.0} (range {}..{}) | correct {:.1}% | timeout {:.1}% | perfect {:.1}%",
                aggregate.mean_points,
                aggregate.std_points,
                aggregate.min_points,
                aggregate.max_points,
                aggregate.correct_rate * 100.0,
                aggregate.timeout_rate * 100.0,
                aggregate.perfect_rate * 100.0,
            )?;
            #[rustfmt::skip]
            writeln!(
                out,
                "  per session: {:.1} hints, {:.1} wrong guesses, {:.1} driver turns, {:.0}s on the clock",
                aggregate.mean_hints,
                aggregate.mean_wrong_guesses,
                aggregate.mean_dialogue_turns,
                aggregate.mean_seconds,
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "🏁 Total time: {total_duration:?}")?;
    Ok(())
}

/// Machine-readable dump of the scenario results.
pub fn generate_json_report<W: Write>(out: &mut W, results: &[ScenarioResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json}")?;
    Ok(())
}

/// Markdown summary suitable for pasting into an issue or CI artifact.
pub fn generate_markdown_report<W: Write>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[BalanceAggregate],
) -> Result<()> {
    writeln!(out, "# Wayfare Logic Test Results")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "- Scenarios: {}", results.len())?;
    writeln!(out, "- Passed: {passed}")?;
    writeln!(out, "- Failed: {}", results.len() - passed)?;
    writeln!(out)?;

    writeln!(out, "## Scenarios")?;
    writeln!(out)?;
    writeln!(out, "| Scenario | Status | Clean | Avg (ms) |")?;
    writeln!(out, "|----------|--------|-------|----------|")?;
    for result in results {
        let status = if result.passed { "pass" } else { "FAIL" };
        writeln!(
            out,
            "| {} | {} | {}/{} | {} |",
            result.scenario_name,
            status,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration.as_millis()
        )?;
    }

    let failed: Vec<&ScenarioResult> = results.iter().filter(|r| !r.passed).collect();
    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Failures")?;
        for result in failed {
            writeln!(out)?;
            writeln!(out, "### {}", result.scenario_name)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
        }
    }

    if !aggregates.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Balance")?;
        writeln!(out)?;
        #[rustfmt::skip]
        writeln!(out, "| Scenario | Sessions | Points (mean ± std) | Correct | Timeout | Perfect |")?;
        writeln!(out, "|----------|----------|---------------------|---------|---------|---------|")?;
        for aggregate in aggregates {
            #[rustfmt::skip]
            writeln!(
                out,
                "| {} | {} | {:.0} ± {:.0} | {:.1}% | {:.1}% | {:.1}% |",
                aggregate.scenario_name,
                aggregate.iterations,
                aggregate.mean_points,
                aggregate.std_points,
                aggregate.correct_rate * 100.0,
                aggregate.timeout_rate * 100.0,
                aggregate.perfect_rate * 100.0,
            )?;
        }
    }
    Ok(())
}

/// Flat per-session rows for spreadsheet digestion.
pub fn generate_csv_report<W: Write>(out: &mut W, records: &[BalanceRecord]) -> Result<()> {
    #[rustfmt::skip]
    writeln!(out, "scenario,preset,strategy,seed,points,rounds_correct,timeouts,perfect_rounds,hints,wrong_guesses,dialogue_turns,seconds")?;
    for record in records {
        let m = &record.metrics;
        #[rustfmt::skip]
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            record.scenario_name,
            record.preset,
            record.strategy,
            record.seed_value,
            m.total_points,
            m.rounds_correct,
            m.rounds_timed_out,
            m.perfect_rounds,
            m.hints_used,
            m.wrong_guesses,
            m.dialogue_turns,
            m.seconds_played,
        )?;
    }
    Ok(())
}
