//! Lino to Markdown Converter
//!
//! Converts a Links Notation run report written by `sortviz bench --report`
//! to Markdown.
//!
//! Usage:
//!   lino2md input.lino [output.md]
//!
//! If output is not specified, prints to stdout.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;

use sortviz::report::parse_lino_report;

#[derive(Parser, Debug)]
#[command(version, about = "Convert a Links Notation run report to Markdown")]
struct Cli {
    /// Path to the Links Notation report file
    input: PathBuf,
    /// Optional output path (prints to stdout if not specified)
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let content =
        fs::read_to_string(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;

    let Some(report) = parse_lino_report(&content) else {
        bail!("{} holds no run records; is it a sortviz report?", cli.input.display());
    };
    let markdown = report.to_markdown_table();

    match cli.output {
        Some(path) => {
            report.save_markdown(&path)?;
            println!("Markdown report written to: {}", path.display());
        }
        None => print!("{markdown}"),
    }
    Ok(())
}
