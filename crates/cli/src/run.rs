//! `clientsync run` and `clientsync validate-config`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use clientsync_io::clients::roster_rows;
use clientsync_io::{FileSink, FileSource};
use clientsync_postal::PostalClient;
use clientsync_recon::config::{RosterColumns, RunConfig};
use clientsync_recon::{execute, RunOutcome};

use crate::exit_codes::{EXIT_ERROR, EXIT_REJECTED, EXIT_USAGE};
use crate::{CliError, RunArgs};

/// Read and parse a config file, resolving its relative paths against its directory.
fn load_config(path: &Path) -> Result<RunConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", path.display()))
    })?;
    let mut config = RunConfig::from_toml(&text)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base_dir);
    Ok(config)
}

/// Config file (or defaults), then flag overrides on top.
fn effective_config(args: &RunArgs) -> Result<RunConfig, CliError> {
    let mut config = match args.config {
        Some(ref path) => load_config(path)?,
        None => RunConfig::default(),
    };

    let set = |slot: &mut PathBuf, value: &Option<PathBuf>| {
        if let Some(v) = value {
            *slot = v.clone();
        }
    };
    set(&mut config.input.incoming, &args.incoming);
    set(&mut config.input.roster, &args.roster);
    set(&mut config.output.feed, &args.feed);
    set(&mut config.output.rejected, &args.rejected);

    if args.sheet.is_some() {
        config.input.sheet = args.sheet.clone();
    }
    if args.roster_out.is_some() {
        config.output.roster = args.roster_out.clone();
    }
    if let Some(ref url) = args.lookup_url {
        config.lookup.base_url = url.clone();
    }
    if let Some(secs) = args.timeout {
        config.lookup.timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = effective_config(&args)?;
    let today = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    let directory = PostalClient::new(
        &config.lookup.base_url,
        Duration::from_secs(config.lookup.timeout_secs),
    )
    .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;

    tracing::debug!(
        incoming = %config.input.incoming.display(),
        roster = %config.input.roster.display(),
        lookup = directory.base_url(),
        %today,
        "starting run"
    );

    let source = FileSource::from_config(&config);
    let mut sink = FileSink::from_config(&config);
    let outcome = execute(&source, &directory, &mut sink, today)?;

    if args.json {
        let body = serde_json::json!({
            "summary": &outcome.summary,
            "updates": &outcome.updates,
            "feed": &config.output.feed,
            "rejected": &config.output.rejected,
        });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", render_roster(&outcome, &config.columns.roster));
    }

    if !args.quiet {
        print_summary(&outcome, &config);
    }

    if args.fail_on_rejected && outcome.summary.rejected > 0 {
        return Err(CliError::new(
            EXIT_REJECTED,
            format!("{} record(s) rejected", outcome.summary.rejected),
        )
        .with_hint(format!("see {}", config.output.rejected.display())));
    }

    Ok(())
}

pub fn cmd_validate_config(path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&path)?;
    eprintln!(
        "config ok: {} + {} -> {}, {}",
        config.input.incoming.display(),
        config.input.roster.display(),
        config.output.feed.display(),
        config.output.rejected.display(),
    );
    Ok(())
}

fn print_summary(outcome: &RunOutcome, config: &RunConfig) {
    let s = &outcome.summary;
    eprintln!(
        "{} records: {} valid ({} new, {} existing), {} rejected, {} field updates",
        s.total, s.valid, s.new, s.existing, s.rejected, s.field_updates,
    );
    eprintln!("wrote {}", config.output.feed.display());
    eprintln!("wrote {}", config.output.rejected.display());
    if let Some(ref roster) = config.output.roster {
        eprintln!("wrote {}", roster.display());
    }
}

/// The reconciled roster as a left-aligned text table.
fn render_roster(outcome: &RunOutcome, columns: &RosterColumns) -> String {
    let (headers, rows) = roster_rows(&outcome.roster, columns);
    render_table(&headers, &rows)
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{}{}", cell, " ".repeat(w.saturating_sub(cell.width()))))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}
