//! Command dispatch: every subcommand collects a survey, then renders
//! the relevant slice of it.

mod collect;

use std::io::Write as _;

use crate::cli::{Command, GlobalOpts, OutputFormat, ReportArgs};
use crate::error::CliError;
use crate::report;

use meshly_core::Survey;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let survey = collect::collect(global).await?;

    match cmd {
        Command::Networks => networks(&survey, global),
        Command::Nodes => nodes(&survey, global),
        Command::Clients => clients(&survey, global),
        Command::Summary => summary(&survey, global),
        Command::Report(args) => full_report(&survey, global, &args),
    }
}

// ── Per-command rendering ────────────────────────────────────────────

fn networks(survey: &Survey, global: &GlobalOpts) -> Result<(), CliError> {
    let text = match global.output {
        OutputFormat::Table => report::render_networks(survey),
        OutputFormat::Json => to_json(&survey.networks().collect::<Vec<_>>())?,
        OutputFormat::Plain => survey
            .networks()
            .map(|n| n.name.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    emit(&text, global.quiet)
}

fn nodes(survey: &Survey, global: &GlobalOpts) -> Result<(), CliError> {
    let text = match global.output {
        OutputFormat::Table => report::render_nodes(survey),
        OutputFormat::Json => to_json(&survey.nodes().collect::<Vec<_>>())?,
        OutputFormat::Plain => survey
            .nodes()
            .map(|n| n.key.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    emit(&text, global.quiet)
}

fn clients(survey: &Survey, global: &GlobalOpts) -> Result<(), CliError> {
    let text = match global.output {
        OutputFormat::Table => report::render_clients(survey),
        OutputFormat::Json => to_json(&survey.clients().collect::<Vec<_>>())?,
        OutputFormat::Plain => survey
            .clients()
            .map(|c| c.mac.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    emit(&text, global.quiet)
}

fn summary(survey: &Survey, global: &GlobalOpts) -> Result<(), CliError> {
    let summary = survey.summary();
    let text = match global.output {
        OutputFormat::Json => to_json(&summary)?,
        _ => report::render_summary(&summary),
    };
    emit(&text, global.quiet)
}

fn full_report(survey: &Survey, global: &GlobalOpts, args: &ReportArgs) -> Result<(), CliError> {
    let body = if args.html {
        report::render_html_digest(survey)
    } else {
        format!(
            "{}\n{}\n{}",
            report::render_nodes(survey),
            report::render_clients(survey),
            report::render_summary(&survey.summary()),
        )
    };

    match &args.file {
        Some(path) => {
            std::fs::write(path, &body)?;
            tracing::info!("report written to {}", path.display());
            if args.screen {
                emit(&body, global.quiet)?;
            }
            Ok(())
        }
        None => emit(&body, global.quiet),
    }
}

// ── Output plumbing ──────────────────────────────────────────────────

fn to_json<T: serde::Serialize>(data: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(data).map_err(|e| CliError::Decode {
        message: e.to_string(),
    })
}

fn emit(text: &str, quiet: bool) -> Result<(), CliError> {
    if quiet || text.is_empty() {
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}
