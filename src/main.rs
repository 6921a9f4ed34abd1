// main.rs

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::{debug, info, LevelFilter};

use bbpe_trainer::tokenizer::{BpeTrainer, MergeStrategy, TieBreak, TrainerConfig};

/// Train a byte-level BPE tokenizer on a UTF-8 text file.
#[derive(Parser)]
#[command(name = "bbpe-train")]
#[command(version)]
struct Args {
    /// Path to the UTF-8 text file to train on
    #[arg(short, long)]
    input: PathBuf,

    /// Total vocab size (256 + merges + special tokens)
    #[arg(short = 'N', long, required_unless_present = "config")]
    vocab_size: Option<usize>,

    /// Special tokens to reserve, e.g. <bos> <eos>
    #[arg(short, long, num_args = 0.., value_name = "TOK")]
    special_tokens: Option<Vec<String>>,

    /// Directory for the saved tokenizer state
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// File name prefix for the saved state (defaults to the input file stem)
    #[arg(short, long)]
    prefix: Option<String>,

    /// Merge engine: baseline or incremental
    #[arg(long)]
    strategy: Option<MergeStrategy>,

    /// Tie-break between equally frequent pairs: smallest or largest
    #[arg(long)]
    tie_break: Option<TieBreak>,

    /// Number of counting workers (defaults to available cores)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Ignore pairs seen fewer times than this
    #[arg(long)]
    min_frequency: Option<u64>,

    /// JSON trainer config; flags given on the command line take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show a progress bar while merging
    #[arg(long)]
    progress: bool,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Once for info, twice for debug (every merge)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

/// Cheap screen of the first few KiB; the full decode happens when the
/// trainer reads the file.
fn check_utf8_prefix(path: &Path) -> Result<()> {
    let mut head = Vec::with_capacity(4096);
    File::open(path)?.take(4096).read_to_end(&mut head)?;
    match std::str::from_utf8(&head) {
        Ok(_) => Ok(()),
        // A multi-byte char cut by the 4 KiB window is fine.
        Err(e) if e.error_len().is_none() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn validate_paths(input: &Path, output_dir: &Path) -> Result<()> {
    if !input.is_file() {
        bail!("input path {} is not a file", input.display());
    }
    check_utf8_prefix(input).with_context(|| format!("failed to read {} as UTF-8", input.display()))?;

    if output_dir.exists() {
        if !output_dir.is_dir() {
            bail!("output path {} exists and is not a directory", output_dir.display());
        }
    } else {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("could not create output directory {}", output_dir.display()))?;
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<TrainerConfig> {
    let mut config = match &args.config {
        Some(path) => TrainerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => TrainerConfig::default(),
    };
    if let Some(vocab_size) = args.vocab_size {
        config.vocab_size = vocab_size;
    }
    if let Some(tokens) = &args.special_tokens {
        config.special_tokens = tokens.clone();
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(tie_break) = args.tie_break {
        config.tie_break = tie_break;
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }
    if let Some(min_frequency) = args.min_frequency {
        config.min_frequency = min_frequency;
    }
    config.show_progress = args.progress;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose);

    let prefix = match &args.prefix {
        Some(prefix) => prefix.clone(),
        None => args
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("train")
            .to_owned(),
    };
    validate_paths(&args.input, &args.output_dir)?;

    let config = build_config(&args)?;
    info!("training tokenizer on {}", args.input.display());
    info!(
        "vocab size: {} (reserving {} special tokens)",
        config.vocab_size,
        config.special_tokens.len()
    );
    if !config.special_tokens.is_empty() {
        info!("special tokens: {:?}", config.special_tokens);
    }
    debug!("saving to {} with prefix {:?}", args.output_dir.display(), prefix);

    let trainer = BpeTrainer::from(config);
    let output = trainer
        .train_from_file(&args.input)
        .with_context(|| format!("training on {} failed", args.input.display()))?;

    let path = output.save(&args.output_dir, &prefix)?;
    info!("saved tokenizer state to {}", path.display());
    println!("{}", path.display());
    Ok(())
}
