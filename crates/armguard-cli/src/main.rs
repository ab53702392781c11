//! CLI entry point for armguard.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup, and exit
//! codes. All business logic lives in the `armguard-app` crate.

use anyhow::Context;
use armguard_app::{
    ExplainOutput, ScanInput, format_explanation, format_not_found, parse_report_json,
    render_markdown, run_explain, run_scan, verdict_exit_code, write_report, write_text,
};
use armguard_settings::Overrides;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "armguard",
    version,
    about = "Offline compliance scanner for Azure Resource Manager templates"
)]
struct Cli {
    /// Path to armguard config TOML (missing file means defaults).
    #[arg(long, default_value = "armguard.toml", global = true)]
    config: Utf8PathBuf,

    /// Override when the scan fails (failed|review).
    #[arg(long, global = true)]
    fail_on: Option<String>,

    /// Override maximum results to emit.
    #[arg(long, global = true)]
    max_results: Option<u32>,

    /// Skip controls whose id matches this glob (repeatable).
    #[arg(long = "exclude-control", global = true)]
    exclude_controls: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan templates and write the report.
    Scan {
        /// Template file, or a directory searched for `*.json` templates.
        #[arg(long)]
        template: Utf8PathBuf,

        /// Parameters file applied to every template.
        #[arg(long)]
        parameters: Option<Utf8PathBuf>,

        /// Control catalog JSON.
        #[arg(long)]
        catalog: Utf8PathBuf,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/armguard/report.json")]
        report_out: Utf8PathBuf,

        /// Also write a Markdown report here.
        #[arg(long)]
        markdown_out: Option<Utf8PathBuf>,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/armguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Explain how a match kind decides its outcome.
    Explain {
        /// Match kind name as written in the catalog (e.g. "StringMultiToken").
        kind: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match &cli.cmd {
        Commands::Scan {
            template,
            parameters,
            catalog,
            report_out,
            markdown_out,
        } => cmd_scan(
            &cli,
            template,
            parameters.as_ref(),
            catalog,
            report_out,
            markdown_out.as_ref(),
        ),
        Commands::Md { report, output } => cmd_md(report, output.as_ref()),
        Commands::Explain { kind } => Ok(cmd_explain(kind)),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("armguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cmd_scan(
    cli: &Cli,
    template: &Utf8PathBuf,
    parameters: Option<&Utf8PathBuf>,
    catalog: &Utf8PathBuf,
    report_out: &Utf8PathBuf,
    markdown_out: Option<&Utf8PathBuf>,
) -> anyhow::Result<i32> {
    let config_text = if cli.config.exists() {
        std::fs::read_to_string(&cli.config)
            .with_context(|| format!("read config: {}", cli.config))?
    } else {
        tracing::debug!(config = %cli.config, "config not found; using defaults");
        String::new()
    };

    let overrides = Overrides {
        fail_on: cli.fail_on.clone(),
        max_results: cli.max_results,
        exclude_controls: cli.exclude_controls.clone(),
    };

    let output = run_scan(ScanInput {
        template,
        parameters: parameters.map(|p| p.as_path()),
        catalog,
        config_text: &config_text,
        overrides,
    })?;

    write_report(report_out, &output.report).context("write report json")?;
    if let Some(md_path) = markdown_out {
        write_text(md_path, &render_markdown(&output.report)).context("write markdown")?;
    }

    Ok(verdict_exit_code(output.report.verdict))
}

fn cmd_md(report_path: &Utf8PathBuf, output: Option<&Utf8PathBuf>) -> anyhow::Result<i32> {
    let report_text = std::fs::read_to_string(report_path)
        .with_context(|| format!("read report: {}", report_path))?;
    let report = parse_report_json(&report_text)?;
    let md = render_markdown(&report);

    if let Some(out_path) = output {
        write_text(out_path, &md).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(0)
}

fn cmd_explain(kind: &str) -> i32 {
    match run_explain(kind) {
        ExplainOutput::Found(exp) => {
            print!("{}", format_explanation(&exp));
            0
        }
        ExplainOutput::NotFound {
            identifier,
            available_kinds,
        } => {
            eprint!("{}", format_not_found(&identifier, available_kinds));
            1
        }
    }
}
