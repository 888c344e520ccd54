use clap::Parser;
use log::{error, info};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tumor_lr::fixtures::SyntheticTumors;
use tumor_lr::pipeline::run_analysis;
use tumor_lr::report::write_report;
use tumor_lr::{AnalysisConfig, Result};

#[derive(Parser, Debug)]
#[command(
    name = "tumor-lr",
    version,
    about = "Ridge, lasso, unpenalized and PCA logistic regression for benign/malignant tumor masses."
)]
struct Args {
    /// CSV file in the diagnostic breast cancer layout (id, diagnosis, 30 features).
    #[arg(value_name = "DATA")]
    data: Option<PathBuf>,

    /// TOML file with run settings; flags given here take precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for the holdout split and the cross-validation folds.
    #[arg(long)]
    seed: Option<u64>,

    /// Run LOOCV folds on all cores.
    #[arg(long)]
    parallel: bool,

    /// Analyse an N-row synthetic dataset instead of reading a file.
    #[arg(long, value_name = "N")]
    synthetic: Option<usize>,

    #[arg(long)]
    skip_loocv: bool,
}

fn resolve_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(data) = &args.data {
        config.data_path = Some(data.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.parallel {
        config.parallel = true;
    }
    if args.skip_loocv {
        config.run_loocv = false;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;
    info!("Configuration: {:?}", config);

    let dataset = args
        .synthetic
        .map(|n| SyntheticTumors::new(n).seed(config.seed).build());
    let outcome = run_analysis(&config, dataset)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_report(&mut out, &outcome)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let start = Instant::now();
    match run(Args::parse()) {
        Ok(()) => {
            info!("Finished in {:.2?}", start.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
