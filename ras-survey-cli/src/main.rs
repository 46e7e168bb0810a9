use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::ThreadPoolBuilder;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};

use ras_survey::{rewrite_directory, rewrite_file, MatchPolicy, RewriteConfig, SurveyTable};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HEC-RAS geometry file (.g##), or a directory of them
    #[arg(value_name = "GEOMETRY")]
    input: PathBuf,

    /// Linear referenced survey table (CSV with River, Reach, RiverStation, MEAS, ELEV)
    #[arg(short, long, value_name = "CSV")]
    survey: PathBuf,

    /// Output geometry file, or output directory when GEOMETRY is a directory
    /// (default for a file: GEOMETRY with the output extension)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Extension of the default output file
    #[arg(long, default_value = "g99")]
    extension: String,

    /// Suffix appended to the geometry title
    #[arg(long, default_value = "_WithSurvey")]
    title_suffix: String,

    /// How survey keys are compared with the geometry file
    #[arg(long, value_enum, default_value_t = Matching::Legacy)]
    matching: Matching,

    /// Number of threads for directory input (default: number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Matching {
    /// Fixed-width prefix match on the formatted key
    Legacy,
    /// Trimmed river and reach must equal the key, station compared by value
    Exact,
}

impl From<Matching> for MatchPolicy {
    fn from(matching: Matching) -> Self {
        match matching {
            Matching::Legacy => MatchPolicy::Legacy,
            Matching::Exact => MatchPolicy::Exact,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let start_time = std::time::Instant::now();

    let config = RewriteConfig::new()
        .with_title_suffix(args.title_suffix.clone())
        .with_output_extension(args.extension.clone())
        .with_match_policy(args.matching.into());

    let survey = SurveyTable::from_path(&args.survey)
        .with_context(|| format!("Failed to load survey table {:?}", args.survey))?;

    if args.input.is_file() {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| config.default_output_path(&args.input));
        process_file(&args.input, &survey, &output, &config)?;
    } else if args.input.is_dir() {
        let Some(output_dir) = args.output.as_deref() else {
            anyhow::bail!("--output DIR is required when GEOMETRY is a directory");
        };
        if let Some(threads) = args.threads {
            ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("Failed to build thread pool")?;
        }
        process_directory(&args.input, &survey, output_dir, &config)?;
    } else {
        error!("Invalid input path: {:?}", args.input);
        anyhow::bail!("Input path must be a geometry file or a directory");
    }

    info!("Total processing time: {:?}", start_time.elapsed());

    Ok(())
}

fn process_file(
    input: &Path,
    survey: &SurveyTable,
    output: &Path,
    config: &RewriteConfig,
) -> Result<()> {
    let report = rewrite_file(input, survey, output, config)
        .with_context(|| format!("Failed to rewrite {:?}", input))?;

    info!(
        "Replaced {} cross sections, {} survey cross sections unused",
        report.replaced.len(),
        report.unused.len()
    );
    println!("New geometry file with survey is: {}", output.display());
    Ok(())
}

fn process_directory(
    dir: &Path,
    survey: &SurveyTable,
    output_dir: &Path,
    config: &RewriteConfig,
) -> Result<()> {
    info!("Processing directory: {:?}", dir);
    let outcomes = rewrite_directory(dir, survey, output_dir, config)?;

    let mut errors = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                println!(
                    "{} -> {} ({} cross sections replaced)",
                    outcome.input.display(),
                    outcome.output.display(),
                    report.replaced.len()
                );
            }
            Err(e) => errors.push(format!("{}: {}", outcome.input.display(), e)),
        }
    }

    if !errors.is_empty() {
        error!("Failed to process {} files:", errors.len());
        for err in &errors {
            error!("  {}", err);
        }
        anyhow::bail!("{} files failed to process", errors.len());
    }

    Ok(())
}
