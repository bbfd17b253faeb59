use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::error;

use airquality::config::{Config, ReportFormat};
use airquality::report;
use airquality::AirQuality;

#[derive(Parser)]
#[command(name = "airquality")]
#[command(author, version, about = "802.11 air quality analysis from pcap captures")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Maximum number of tracked entities (overrides config)
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Capture files, analysed in order into one report
    #[arg(value_name = "PCAP")]
    pub files: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate default configuration file
    GenConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run_command(cli: Cli) -> Result<()> {
    if let Some(Commands::GenConfig { output }) = cli.command {
        return cmd_gen_config(output);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };
    if let Some(capacity) = cli.capacity {
        config.analyzer.capacity = capacity;
    }
    if let Some(format) = cli.format {
        config.report.format = format;
    }

    cmd_analyze(config, cli.files)
}

fn cmd_analyze(config: Config, files: Vec<PathBuf>) -> Result<()> {
    if files.is_empty() {
        bail!("No capture files given");
    }

    let mut airquality = AirQuality::new(&config);

    for path in &files {
        if let Err(e) = airquality.add_file(path) {
            error!("{:#}", e);
            eprintln!("{} {}", "Skipped:".red().bold(), path.display());
        }
    }

    if airquality.files_read() == 0 {
        bail!("None of the {} capture files could be read", files.len());
    }

    let analysis = airquality.finish();
    print!("{}", report::render(&analysis, &config.report)?);

    Ok(())
}

fn cmd_gen_config(output: Option<PathBuf>) -> Result<()> {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &toml_str)?;
            println!("Configuration written to {}", path.display());
        }
        None => {
            println!("{}", toml_str);
        }
    }

    Ok(())
}
