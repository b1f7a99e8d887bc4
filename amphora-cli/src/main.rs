//! Amphora command line.
//!
//! Reads a document or fragment, runs the full transform, and prints the
//! result: repaired HTML, the pass-through input, a fallback redirect, or
//! the validate-mode JSON report.

use std::fs;
use std::io::Read;
use std::process::ExitCode;

use amphora_response::{AssemblySummary, Response, ResponseAssembler, TransformOptions};
use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
#[command(name = "amphora", version, about = "Transform HTML into valid AMP")]
struct Cli {
    /// Input file, or `-` / absent for stdin.
    input: Option<String>,

    /// Treat the input as a body fragment.
    #[arg(long)]
    fragment: bool,

    /// Print the JSON validation report instead of HTML.
    #[arg(long)]
    validate: bool,

    /// Paired-mode fallback URL; blocking errors redirect here.
    #[arg(long, value_name = "URL")]
    paired_url: Option<String>,

    /// Href for the canonical link.
    #[arg(long, value_name = "URL")]
    canonical_url: Option<String>,

    /// Element id exempted from validation (repeatable).
    #[arg(long = "dev-mode-id", value_name = "ID")]
    dev_mode_id: Vec<String>,

    /// Skip the shared stylesheet cache.
    #[arg(long)]
    no_cache: bool,

    /// Print a colored run summary to stderr.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let input = read_input(cli.input.as_deref())?;
    let options = TransformOptions {
        fragment: cli.fragment,
        validate: cli.validate,
        canonical_url: cli.canonical_url.clone(),
        paired_url: cli.paired_url.clone(),
        dev_mode_ids: cli.dev_mode_id.clone(),
        use_cache: !cli.no_cache,
        ..TransformOptions::default()
    };

    let mut assembler = ResponseAssembler::new();
    let response = assembler.process(&input, &options)?;
    if cli.pretty {
        match assembler.summary() {
            Some(summary) => print_summary(summary),
            None => eprintln!("{} input passed through untouched", "note:".cyan().bold()),
        }
    }

    match response {
        Response::Html(html) | Response::PassThrough(html) => println!("{html}"),
        Response::Redirect {
            location,
            blocking_errors,
        } => {
            eprintln!(
                "{} {blocking_errors} blocking error(s), serving the paired fallback",
                "redirect:".yellow().bold()
            );
            println!("{location}");
        }
        Response::Report(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut input = String::new();
            let _ = std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
    }
}

fn print_summary(summary: &AssemblySummary) {
    let errors = if summary.errors > 0 {
        summary.errors.to_string().red().bold().to_string()
    } else {
        summary.errors.to_string().green().to_string()
    };
    eprintln!(
        "{} {errors} error(s) ({} blocking), {} warning(s)",
        "summary:".cyan().bold(),
        summary.blocking,
        summary.warnings.to_string().yellow(),
    );
    eprintln!(
        "         {} bytes of custom CSS, scripts: {}",
        summary.style_bytes,
        if summary.script_handles.is_empty() {
            "none".to_string()
        } else {
            summary.script_handles.join(", ")
        }
    );
}
