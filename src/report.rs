//! Terminal rendering of batch outcomes and scan summaries

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::batch::{ItemOutcome, OutcomeDetail};
use crate::classifier::ScanResult;
use crate::error::Result;
use crate::store::ScanSummary;

/// Print outcomes to stdout, colored when it is a terminal
pub fn print_outcomes(outcomes: &[ItemOutcome]) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_outcomes(&mut stdout, outcomes)
}

/// Print a scan summary to stdout
pub fn print_summary(summary: &ScanSummary) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_summary(&mut stdout, summary)
}

/// One tagged line per outcome, then totals
pub fn write_outcomes<W: WriteColor>(out: &mut W, outcomes: &[ItemOutcome]) -> Result<()> {
    for outcome in outcomes {
        let (tag, color) = if outcome.is_success() {
            ("SUCCESS", Color::Green)
        } else {
            ("ERROR", Color::Red)
        };

        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "[{}]", tag)?;
        out.reset()?;
        writeln!(out, " #{} {} - {}", outcome.id, outcome.url, describe(&outcome.detail))?;
    }

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(
        out,
        "{} processed, {} succeeded, {} failed",
        outcomes.len(),
        succeeded,
        outcomes.len() - succeeded
    )?;
    out.reset()?;
    Ok(())
}

/// Aggregate scan counts
pub fn write_summary<W: WriteColor>(out: &mut W, summary: &ScanSummary) -> Result<()> {
    writeln!(out, "Scanned sites:      {}", summary.total_scanned)?;
    match summary.avg_content_quality {
        Some(avg) => writeln!(out, "Avg content quality: {:.1}/10", avg)?,
        None => writeln!(out, "Avg content quality: n/a")?,
    }

    for (label, count) in [
        ("Malicious:", summary.malicious_count),
        ("Adult content:", summary.adult_content_count),
    ] {
        write!(out, "{:<20}", label)?;
        if count > 0 {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        }
        writeln!(out, "{}", count)?;
        out.reset()?;
    }
    Ok(())
}

fn describe(detail: &OutcomeDetail) -> String {
    match detail {
        OutcomeDetail::Status(probe) => match (&probe.error_detail, probe.status_code) {
            (Some(error), 0) => format!("unreachable ({})", error),
            (_, code) => format!("HTTP {}", code),
        },
        OutcomeDetail::Scan(ScanResult::Verdict(verdict)) => {
            let mut text = format!(
                "quality {}/10, safety {}/10",
                verdict.content_quality, verdict.safety_score
            );
            if verdict.is_malicious {
                text.push_str(", MALICIOUS");
            }
            if verdict.is_adult_content {
                text.push_str(", ADULT");
            }
            format!("{}: {}", text, verdict.summary)
        }
        OutcomeDetail::Scan(ScanResult::Unparsed(_)) => {
            "analysis stored unparsed for review".to_string()
        }
        OutcomeDetail::Scan(ScanResult::Failed(failure)) => failure.reason.clone(),
        OutcomeDetail::Failed(reason) => reason.clone(),
    }
}
