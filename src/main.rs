//! charter-ner - NER tooling for the HOME charters corpus
//!
//! Usage:
//!   charter-ner to-bio ref.txt hyp.txt      Convert tagged transcriptions to BIO files
//!   charter-ner stats /path/to/corpus       Entity statistics over a PAGE-XML corpus

use anyhow::{bail, Context, Result};
use charter_ner::{
    BioConfigBuilder, BioConverter, DivByZeroStrat, StatsCollector, StatsConfigBuilder,
    StatsReport, UnknownTypePolicy,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

#[derive(Parser)]
#[command(name = "charter-ner", version, about = "Offline NER tools for the HOME charters corpus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert inline-tagged transcription files to token-per-line BIO files
    ToBio {
        /// Input transcription files (one BIO file is written per input)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output path; only valid with a single input. Defaults to the
        /// input path with a `.bio` extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Prepend the line identifier to every output row
        #[arg(long)]
        write_ids: bool,
        /// What to do with markers naming an unknown entity type
        #[arg(long, default_value = "fail", value_parser = parse_policy)]
        unknown_types: UnknownTypePolicy,
    },
    /// Compute entity statistics over a PAGE-XML charters corpus
    Stats {
        /// path/to/data/root/folder (with czech/, german/ and latin/ below)
        root_folder: PathBuf,
        /// Count tags split between 2 lines twice
        #[arg(short = 'c', long)]
        ignore_continue: bool,
        /// Ignore entities within other entities when computing statistics
        #[arg(short = 'n', long)]
        ignore_nested: bool,
        /// What an average over zero occurrences reports (nan or zero)
        #[arg(long, default_value = "nan", value_parser = parse_zero_division)]
        zero_division: DivByZeroStrat,
        /// Print the report as JSON instead of text tables
        #[arg(long)]
        json: bool,
    },
}

fn parse_policy(s: &str) -> Result<UnknownTypePolicy, String> {
    UnknownTypePolicy::from_str(s).map_err(|e| e.to_string())
}

fn parse_zero_division(s: &str) -> Result<DivByZeroStrat, String> {
    DivByZeroStrat::from_str(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ToBio {
            files,
            output,
            write_ids,
            unknown_types,
        } => cmd_to_bio(files, output, write_ids, unknown_types),
        Commands::Stats {
            root_folder,
            ignore_continue,
            ignore_nested,
            zero_division,
            json,
        } => cmd_stats(root_folder, ignore_continue, ignore_nested, zero_division, json),
    }
}

fn cmd_to_bio(
    files: Vec<PathBuf>,
    output: Option<PathBuf>,
    write_ids: bool,
    unknown_types: UnknownTypePolicy,
) -> Result<()> {
    if output.is_some() && files.len() > 1 {
        bail!("--output can only be used with a single input file");
    }
    let config = BioConfigBuilder::new()
        .write_ids(write_ids)
        .unknown_types(unknown_types)
        .build();
    let converter = BioConverter::new(config);
    for file in &files {
        let written = converter
            .convert_to_bio(file, output.as_deref())
            .with_context(|| format!("Failed to convert {}", file.display()))?;
        match written {
            Some(path) => info!(input = %file.display(), output = %path.display(), "wrote BIO file"),
            None => info!(input = %file.display(), "nothing to write"),
        }
    }
    Ok(())
}

fn cmd_stats(
    root_folder: PathBuf,
    ignore_continue: bool,
    ignore_nested: bool,
    zero_division: DivByZeroStrat,
    json: bool,
) -> Result<()> {
    info!("Ignoring `continued` : {}", ignore_continue);
    info!("Ignoring `nested` : {}", ignore_nested);

    let config = StatsConfigBuilder::new()
        .split_lines(ignore_continue)
        .count_nested(!ignore_nested)
        .zero_division(zero_division)
        .build();
    let collector = StatsCollector::new(config);
    let tally = collector
        .collect(&root_folder)
        .with_context(|| format!("Failed to walk {}", root_folder.display()))?;
    let report = StatsReport::from_tally(&tally, zero_division);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
