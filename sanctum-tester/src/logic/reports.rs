use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, bail};
use colored::Colorize;
use serde::Serialize;

use super::{RunRecord, StrategySummary};

/// Output report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "markdown" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            other => bail!("Unknown report format: {other}"),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summaries: &'a [StrategySummary],
    runs: &'a [RunRecord],
}

pub fn write_report(
    out: &mut dyn Write,
    format: ReportFormat,
    records: &[RunRecord],
    summaries: &[StrategySummary],
    total_duration: Duration,
) -> Result<()> {
    match format {
        ReportFormat::Console => write_console(out, records, summaries, total_duration),
        ReportFormat::Json => {
            let report = JsonReport {
                summaries,
                runs: records,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
            Ok(())
        }
        ReportFormat::Markdown => write_markdown(out, records, summaries),
        ReportFormat::Csv => write_csv(out, records),
    }
}

fn write_console(
    out: &mut dyn Write,
    records: &[RunRecord],
    summaries: &[StrategySummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;
    writeln!(out, "Total runs: {}", records.len())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for summary in summaries {
        let status = if summary.violations == 0 {
            "✅ CLEAN".green()
        } else {
            "❌ VIOLATIONS".red()
        };
        writeln!(out, "{} {}", status, summary.strategy.bold())?;
        writeln!(out, "   Survived: {}/{}", summary.survived, summary.runs)?;
        writeln!(out, "   Mean days: {:.1}", summary.mean_days)?;
        writeln!(out, "   Mean actions: {:.1}", summary.mean_actions)?;
        for (ending, count) in &summary.endings {
            writeln!(out, "   {ending}: {count}")?;
        }
        writeln!(out)?;
    }

    let failing: Vec<&RunRecord> = records.iter().filter(|r| !r.violations.is_empty()).collect();
    if !failing.is_empty() {
        writeln!(out, "{}", "⚠️  Invariant Violations".bright_yellow().bold())?;
        writeln!(out, "{}", "=======================".yellow())?;
        for record in failing {
            writeln!(out, "{} from {}", record.strategy, record.start)?;
            for violation in &record.violations {
                writeln!(out, "     • {}", violation.red())?;
            }
        }
    }
    Ok(())
}

fn write_markdown(out: &mut dyn Write, records: &[RunRecord], summaries: &[StrategySummary]) -> Result<()> {
    writeln!(out, "# Sanctum Simulation Results\n")?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "| Strategy | Runs | Survived | Mean days | Mean actions | Violations |")?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for s in summaries {
        writeln!(
            out,
            "| {} | {} | {} | {:.1} | {:.1} | {} |",
            s.strategy, s.runs, s.survived, s.mean_days, s.mean_actions, s.violations
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Runs\n")?;
    for record in records {
        let status = if record.violations.is_empty() { "✅" } else { "❌" };
        writeln!(out, "### {status} {} from {}\n", record.strategy, record.start)?;
        writeln!(out, "- **Days**: {}", record.days_played)?;
        writeln!(
            out,
            "- **Ending**: {}",
            record.ending.as_deref().unwrap_or("survived")
        )?;
        writeln!(out, "- **Actions**: {} ({} rejected)", record.actions, record.rejected)?;
        writeln!(out, "- **Digest**: `{}`", record.digest)?;
        for violation in &record.violations {
            writeln!(out, "  - {violation}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_csv(out: &mut dyn Write, records: &[RunRecord]) -> Result<()> {
    writeln!(
        out,
        "strategy,start,days,ending,actions,rejected,draws,companions,concepts_built,violations,digest"
    )?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{}",
            r.strategy,
            r.start,
            r.days_played,
            r.ending.as_deref().unwrap_or(""),
            r.actions,
            r.rejected,
            r.draws,
            r.companions,
            r.concepts_built,
            r.violations.len(),
            r.digest
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::summarize;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn sample(violations: Vec<String>) -> RunRecord {
        RunRecord {
            start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            strategy: String::from("Balanced"),
            days_played: 12,
            ending: Some(String::from("game_over_harmony")),
            actions: 80,
            rejected: 3,
            draws: 400,
            companions: 3,
            concepts_built: 1,
            stats: BTreeMap::new(),
            resources: BTreeMap::new(),
            digest: String::from("abc123"),
            violations,
        }
    }

    fn render(format: ReportFormat, records: &[RunRecord]) -> String {
        let summaries = summarize(records);
        let mut buf = Vec::new();
        write_report(&mut buf, format, records, &summaries, Duration::from_millis(5)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn parses_formats() {
        assert_eq!("csv".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn json_report_has_runs_and_summaries() {
        let text = render(ReportFormat::Json, &[sample(Vec::new())]);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["runs"][0]["days_played"], 12);
        assert_eq!(value["summaries"][0]["strategy"], "Balanced");
    }

    #[test]
    fn csv_report_has_one_row_per_run() {
        let text = render(ReportFormat::Csv, &[sample(Vec::new()), sample(Vec::new())]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Balanced,2026-01-01,12,game_over_harmony,80,3,400,3,1,0,"));
    }

    #[test]
    fn markdown_lists_violations() {
        let text = render(ReportFormat::Markdown, &[sample(vec![String::from("day 3: focus -1")])]);
        assert!(text.starts_with("# Sanctum Simulation Results"));
        assert!(text.contains("### ❌ Balanced from 2026-01-01"));
        assert!(text.contains("  - day 3: focus -1"));
    }

    #[test]
    fn console_report_mentions_violations() {
        let text = render(ReportFormat::Console, &[sample(vec![String::from("day 1: bad")])]);
        assert!(text.contains("Total runs: 1"));
        assert!(text.contains("day 1: bad"));
    }
}
